//! State acquisition: locating the state document and reading it to
//! completion, either from a file or from `terraform state pull`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::InventoryError;

/// Resolves the state location when none is given on the command line:
/// `TF_STATE`, then `TI_TFSTATE`, then `./terraform.tfstate` if it exists,
/// then the current directory (handed to `terraform state pull`).
pub fn locate_state() -> PathBuf {
    for var in ["TF_STATE", "TI_TFSTATE"] {
        if let Ok(path) = std::env::var(var) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
    }

    let default = PathBuf::from("terraform.tfstate");
    if default.exists() {
        return default;
    }

    PathBuf::from(".")
}

/// Reads the raw state document: a file's contents, or for a directory the
/// stdout of `terraform state pull` run inside it.
pub fn read_state(path: &Path) -> Result<Vec<u8>, InventoryError> {
    if std::fs::metadata(path)?.is_dir() {
        let output = Command::new("terraform")
            .args(["state", "pull"])
            .current_dir(path)
            .output()?;
        if !output.status.success() {
            return Err(InventoryError::StatePull {
                dir: path.to_path_buf(),
                status: output.status,
            });
        }
        Ok(output.stdout)
    } else {
        Ok(std::fs::read(path)?)
    }
}
