use clap::Parser;
use std::path::PathBuf;

use crate::artifacts::EnvMode;
use crate::env_file::DEFAULT_EXCLUDE_PREFIX;
use crate::naming::NameStyle;

#[derive(Parser, Debug)]
#[command(
    name = "aca-env",
    about = "Turn a .env file into Azure Container Apps secrets and env-var bindings.",
    version
)]
pub struct Cli {
    /// Path to the .env file (prompted for when omitted).
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Container app name.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Resource group of the container app.
    #[arg(short = 'g', long = "resource-group")]
    pub resource_group: Option<String>,

    /// Skip every confirmation (plaintext values, running the scripts).
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Ignore remembered app and resource group names.
    #[arg(long = "new")]
    pub new: bool,

    /// Only keep keys starting with one of these prefixes (repeatable).
    #[arg(long = "include-prefix", value_name = "PREFIX")]
    pub include_prefix: Vec<String>,

    /// Drop keys starting with one of these prefixes (repeatable).
    #[arg(long = "exclude-prefix", value_name = "PREFIX", default_value = DEFAULT_EXCLUDE_PREFIX)]
    pub exclude_prefix: Vec<String>,

    /// How .env keys become secret names.
    #[arg(long = "secret-name-style", value_enum, default_value_t = NameStyle::KebabLower)]
    pub secret_name_style: NameStyle,

    /// Prepended to every secret name.
    #[arg(long = "secret-prefix", value_name = "PREFIX")]
    pub secret_prefix: Option<String>,

    /// Generate only the secrets artifacts.
    #[arg(long = "secrets-only", conflicts_with = "env_only")]
    pub secrets_only: bool,

    /// Generate only the env-var artifacts.
    #[arg(long = "env-only")]
    pub env_only: bool,

    /// Env-var values: references to secrets, or the plain values.
    #[arg(long = "env-mode", value_enum, default_value_t = EnvMode::Secretref)]
    pub env_mode: EnvMode,

    /// Write the files but never offer to run them.
    #[arg(long = "no-exec")]
    pub no_exec: bool,

    /// Print debug diagnostics to stderr.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
