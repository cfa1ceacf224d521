use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde_json::{Map, Value};

use crate::env_file::NormalizedEntry;
use crate::error::AcaEnvError;

pub const SECRETS_SCRIPT: &str = "secrets-command.sh";
pub const SECRETS_JSON: &str = "secrets.json";
pub const ENVVARS_SCRIPT: &str = "envvars-command.sh";
pub const ENVVARS_JSON: &str = "envvars.json";

const SCRIPT_HEADER: &str = "#!/usr/bin/env bash\nset -euo pipefail\n\n";

/// What env-var values look like in the generated bindings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EnvMode {
    /// `KEY=secretref:<target-name>`, resolved by the platform at deploy time.
    #[default]
    Secretref,
    /// `KEY=<value>`, the secret value in plain text.
    Plain,
}

/// Which artifact groups a run produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outputs {
    Both,
    SecretsOnly,
    EnvOnly,
}

impl Outputs {
    /// The CLI rejects both flags together, so `(true, true)` never reaches here.
    pub fn from_flags(secrets_only: bool, env_only: bool) -> Self {
        match (secrets_only, env_only) {
            (true, _) => Outputs::SecretsOnly,
            (false, true) => Outputs::EnvOnly,
            (false, false) => Outputs::Both,
        }
    }

    pub fn secrets(self) -> bool {
        self != Outputs::EnvOnly
    }

    pub fn env_vars(self) -> bool {
        self != Outputs::SecretsOnly
    }
}

/// Returns the mode actually used and whether it was coerced.
/// Without secrets there is nothing to reference, so `EnvOnly` + `Secretref` becomes `Plain`.
pub fn resolve_env_mode(outputs: Outputs, requested: EnvMode) -> (EnvMode, bool) {
    if outputs == Outputs::EnvOnly && requested == EnvMode::Secretref {
        (EnvMode::Plain, true)
    } else {
        (requested, false)
    }
}

/// The Container App a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub app: String,
    pub resource_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub contents: String,
}

/// Single-quote for POSIX shells; an embedded `'` becomes `'\''`.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn shell_word(s: &str) -> String {
    let safe = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if safe {
        s.to_string()
    } else {
        shell_quote(s)
    }
}

pub fn env_value(entry: &NormalizedEntry, mode: EnvMode) -> String {
    match mode {
        EnvMode::Secretref => format!("secretref:{}", entry.target_name),
        EnvMode::Plain => entry.value.clone(),
    }
}

fn az_command(
    subcommand: &str,
    target: &Target,
    list_flag: &str,
    pairs: &[(String, String)],
) -> String {
    let mut script = String::from(SCRIPT_HEADER);
    script.push_str(&format!("az containerapp {} \\\n", subcommand));
    script.push_str(&format!("  --name {} \\\n", shell_quote(&target.app)));
    script.push_str(&format!(
        "  --resource-group {} \\\n",
        shell_quote(&target.resource_group)
    ));
    script.push_str(&format!("  {}", list_flag));
    for (key, value) in pairs {
        script.push_str(&format!(" \\\n    {}={}", shell_word(key), shell_quote(value)));
    }
    script.push('\n');
    script
}

pub fn secrets_command(target: &Target, entries: &[NormalizedEntry]) -> String {
    let pairs: Vec<_> = entries
        .iter()
        .map(|e| (e.target_name.clone(), e.value.clone()))
        .collect();
    az_command("secret set", target, "--secrets", &pairs)
}

pub fn envvars_command(target: &Target, entries: &[NormalizedEntry], mode: EnvMode) -> String {
    let pairs: Vec<_> = entries
        .iter()
        .map(|e| (e.original_key.clone(), env_value(e, mode)))
        .collect();
    az_command("update", target, "--set-env-vars", &pairs)
}

fn to_json(pairs: impl Iterator<Item = (String, String)>) -> Result<String, AcaEnvError> {
    let map: Map<String, Value> = pairs.map(|(k, v)| (k, Value::String(v))).collect();
    let mut json = serde_json::to_string_pretty(&Value::Object(map))?;
    json.push('\n');
    Ok(json)
}

/// `{ targetName: value }` in input order.
pub fn secrets_json(entries: &[NormalizedEntry]) -> Result<String, AcaEnvError> {
    to_json(
        entries
            .iter()
            .map(|e| (e.target_name.clone(), e.value.clone())),
    )
}

/// `{ originalKey: value-or-reference }` in input order.
pub fn envvars_json(entries: &[NormalizedEntry], mode: EnvMode) -> Result<String, AcaEnvError> {
    to_json(
        entries
            .iter()
            .map(|e| (e.original_key.clone(), env_value(e, mode))),
    )
}

/// Render every requested artifact in memory. Nothing touches disk here.
pub fn render(
    target: &Target,
    entries: &[NormalizedEntry],
    outputs: Outputs,
    mode: EnvMode,
) -> Result<Vec<Artifact>, AcaEnvError> {
    let mut artifacts = Vec::new();
    if outputs.secrets() {
        artifacts.push(Artifact {
            file_name: SECRETS_SCRIPT,
            contents: secrets_command(target, entries),
        });
        artifacts.push(Artifact {
            file_name: SECRETS_JSON,
            contents: secrets_json(entries)?,
        });
    }
    if outputs.env_vars() {
        artifacts.push(Artifact {
            file_name: ENVVARS_SCRIPT,
            contents: envvars_command(target, entries, mode),
        });
        artifacts.push(Artifact {
            file_name: ENVVARS_JSON,
            contents: envvars_json(entries, mode)?,
        });
    }
    Ok(artifacts)
}

/// Write artifacts into `dir`, replacing existing files of the same name.
pub fn write_all(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, AcaEnvError> {
    artifacts
        .iter()
        .map(|artifact| -> Result<PathBuf, AcaEnvError> {
            let path = dir.join(artifact.file_name);
            std::fs::write(&path, &artifact.contents)?;
            Ok(path)
        })
        .collect()
}
