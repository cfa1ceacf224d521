use std::path::PathBuf;

use thiserror::Error;

use crate::naming::Collision;

#[derive(Debug, Error)]
pub enum AcaEnvError {
    #[error("File not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("{} secret name collision(s):\n{}", .0.len(), format_collisions(.0))]
    NameCollision(Vec<Collision>),

    #[error("Missing {what}. Pass {flag} or run in an interactive terminal.")]
    MissingInput {
        what: &'static str,
        flag: &'static str,
    },

    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_collisions(collisions: &[Collision]) -> String {
    collisions
        .iter()
        .map(|c| format!("  {} <- {}", c.target_name, c.keys.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
