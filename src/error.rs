use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Schema(#[from] crate::terraform::SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`terraform state pull` failed in {dir} ({status})", dir = .dir.display())]
    StatePull { dir: PathBuf, status: ExitStatus },

    #[error("render error: {0}")]
    Render(#[from] serde_json::Error),

    #[error("no host matching {0}")]
    HostNotFound(String),
}
