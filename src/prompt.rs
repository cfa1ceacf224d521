use std::io::IsTerminal;
use std::path::PathBuf;

use inquire::{Confirm, Select, Text};

use crate::error::AcaEnvError;

/// Extra choice appended to a history list; picking it asks for a fresh value.
pub const NEW_VALUE: &str = "+ Enter a new value";

const DEFAULT_ENV_FILE: &str = ".env";

/// Asks the user for whatever the flags left out.
#[derive(Debug, Clone, Copy)]
pub struct Prompter {
    interactive: bool,
    assume_yes: bool,
    ignore_history: bool,
}

impl Prompter {
    pub fn new(interactive: bool, assume_yes: bool, ignore_history: bool) -> Self {
        Self {
            interactive,
            assume_yes,
            ignore_history,
        }
    }

    /// Interactive only when stdin is a terminal.
    pub fn detect(assume_yes: bool, ignore_history: bool) -> Self {
        Self::new(std::io::stdin().is_terminal(), assume_yes, ignore_history)
    }

    pub fn file_path(&self, given: Option<PathBuf>) -> Result<PathBuf, AcaEnvError> {
        if let Some(path) = given {
            return Ok(path);
        }
        self.require_interactive("input file", "--file")?;
        let answer = Text::new("Path to the .env file:")
            .with_default(DEFAULT_ENV_FILE)
            .prompt()?;
        Ok(PathBuf::from(answer.trim()))
    }

    pub fn app_name(
        &self,
        given: Option<String>,
        history: &[String],
    ) -> Result<String, AcaEnvError> {
        self.identifier(given, history, "container app name", "--name")
    }

    pub fn resource_group(
        &self,
        given: Option<String>,
        history: &[String],
    ) -> Result<String, AcaEnvError> {
        self.identifier(given, history, "resource group", "--resource-group")
    }

    fn identifier(
        &self,
        given: Option<String>,
        history: &[String],
        what: &'static str,
        flag: &'static str,
    ) -> Result<String, AcaEnvError> {
        if let Some(value) = given {
            return Ok(value);
        }
        self.require_interactive(what, flag)?;

        if self.offers_history(history) {
            let picked = Select::new(&format!("Select the {}:", what), history_choices(history))
                .prompt()?;
            if picked != NEW_VALUE {
                return Ok(picked);
            }
        }

        loop {
            let answer = Text::new(&format!("Enter the {}:", what)).prompt()?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
            println!("The {} must not be empty.", what);
        }
    }

    /// A history list is shown only when there is history and `--new` was not given.
    fn offers_history(&self, history: &[String]) -> bool {
        !self.ignore_history && !history.is_empty()
    }

    /// `true` without asking when `--yes` was given; `false` when nobody can answer.
    pub fn confirm(&self, message: &str) -> Result<bool, AcaEnvError> {
        if self.assume_yes {
            return Ok(true);
        }
        if !self.interactive {
            return Ok(false);
        }
        Ok(Confirm::new(message).with_default(false).prompt()?)
    }

    fn require_interactive(
        &self,
        what: &'static str,
        flag: &'static str,
    ) -> Result<(), AcaEnvError> {
        if self.interactive {
            Ok(())
        } else {
            Err(AcaEnvError::MissingInput { what, flag })
        }
    }
}

pub fn history_choices(history: &[String]) -> Vec<String> {
    let mut choices = history.to_vec();
    choices.push(NEW_VALUE.to_string());
    choices
}
