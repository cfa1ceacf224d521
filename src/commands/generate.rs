use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::warn;

use crate::artifacts::{self, EnvMode, Outputs, Target, ENVVARS_SCRIPT, SECRETS_SCRIPT};
use crate::cli::Cli;
use crate::env_file::{self, FilterOptions, Normalized};
use crate::preferences::{Preferences, PreferencesStore};
use crate::prompt::Prompter;
use crate::runner;

pub fn run(cli: Cli) -> Result<()> {
    let outputs = Outputs::from_flags(cli.secrets_only, cli.env_only);
    let (env_mode, coerced) = artifacts::resolve_env_mode(outputs, cli.env_mode);
    if coerced {
        eprintln!(
            "{} --env-only leaves no secrets to reference; using --env-mode plain.",
            "!".yellow()
        );
    }

    let prompter = Prompter::detect(cli.yes, cli.new);
    let store = match PreferencesStore::open_default() {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("preferences disabled: {}", e);
            None
        }
    };
    let history = store.as_ref().map(PreferencesStore::load).unwrap_or_default();

    let file = prompter.file_path(cli.file)?;
    let opts = FilterOptions {
        include_prefixes: cli.include_prefix,
        exclude_prefixes: cli.exclude_prefix,
        style: cli.secret_name_style,
        secret_prefix: cli.secret_prefix,
    };
    let normalized = env_file::normalize_file(&file, &opts)?;

    if normalized.entries.is_empty() {
        print_skipped(&normalized);
        println!("No variables to process in {}.", file.display());
        return Ok(());
    }

    let target = prompt_target(&prompter, cli.name, cli.resource_group, &history)?;
    print_summary(&normalized);

    if outputs.env_vars() && env_mode == EnvMode::Plain {
        let proceed = prompter.confirm(
            "envvars-command.sh and envvars.json will contain secret values in plain text. Continue?",
        )?;
        if !proceed {
            println!("Cancelled. Pass --yes to confirm non-interactively.");
            return Ok(());
        }
    }

    let cwd = std::env::current_dir().context("Failed to resolve the working directory")?;
    let rendered = artifacts::render(&target, &normalized.entries, outputs, env_mode)?;
    let written = artifacts::write_all(&cwd, &rendered).context("Failed to write output files")?;
    for path in &written {
        println!("{} Wrote {}", "✓".green(), path.display());
    }

    if normalized.has_multiline_values() {
        eprintln!(
            "{} Some values span multiple lines. The .sh scripts may not run correctly; use the JSON files instead.",
            "!".yellow()
        );
    }

    if let Some(store) = &store {
        store.update(&target.app, &target.resource_group);
    }

    if cli.no_exec {
        return Ok(());
    }
    if !prompter.confirm("Run the generated az commands now?")? {
        print_next_steps(outputs);
        return Ok(());
    }
    execute(&cwd, outputs)
}

fn prompt_target(
    prompter: &Prompter,
    name: Option<String>,
    resource_group: Option<String>,
    history: &Preferences,
) -> Result<Target> {
    let app = prompter.app_name(name, &history.last_used_app)?;
    let resource_group =
        prompter.resource_group(resource_group, &history.last_used_resource_group)?;
    Ok(Target {
        app,
        resource_group,
    })
}

fn print_summary(normalized: &Normalized) {
    println!(
        "Processing {} variable(s):",
        normalized.entries.len().to_string().green()
    );
    let width = normalized
        .entries
        .iter()
        .map(|e| e.original_key.len())
        .max()
        .unwrap_or(0);
    for entry in &normalized.entries {
        println!(
            "  {:<width$} -> {}",
            entry.original_key,
            entry.target_name,
            width = width
        );
    }
    print_skipped(normalized);
}

fn print_skipped(normalized: &Normalized) {
    let skipped = &normalized.skipped;
    if skipped.total() == 0 {
        return;
    }
    println!(
        "Skipped {}: {} empty, {} excluded prefix, {} not in include prefixes, {} malformed",
        skipped.total().to_string().yellow(),
        skipped.empty,
        skipped.excluded_prefix,
        skipped.not_included_prefix,
        skipped.malformed
    );
}

fn print_next_steps(outputs: Outputs) {
    println!("\nNext steps:");
    if outputs.secrets() {
        println!("  ./{}", SECRETS_SCRIPT);
    }
    if outputs.env_vars() {
        println!("  ./{}", ENVVARS_SCRIPT);
    }
}

/// Secrets first so the env-var references resolve; each script is attempted regardless.
fn execute(dir: &Path, outputs: Outputs) -> Result<()> {
    let mut scripts = Vec::new();
    if outputs.secrets() {
        scripts.push(SECRETS_SCRIPT);
    }
    if outputs.env_vars() {
        scripts.push(ENVVARS_SCRIPT);
    }

    let mut failed = Vec::new();
    for name in scripts {
        println!("Running {}...", name);
        let run = runner::run_script(&dir.join(name));
        if run.success {
            if !run.error.trim().is_empty() {
                eprintln!("{}", run.error.trim_end());
            }
            println!("{} {} succeeded", "✓".green(), run.script.display());
            continue;
        }

        eprintln!(
            "{} {} failed:\n{}",
            "✗".red(),
            run.script.display(),
            run.error.trim_end()
        );
        if let Some(hint) = run.hint() {
            eprintln!("  hint: {}", hint);
        }
        failed.push(name);
    }

    if !failed.is_empty() {
        bail!(
            "{} failed. The generated files are still in place.",
            failed.join(" and ")
        );
    }
    Ok(())
}
