// Hand files and folders to the OS default application (Explorer, the
// user's text editor for TOML, ...). The launcher never parses the
// per-game TOML itself.

use crate::error::{ManagerError, Result};
use std::fs;
use std::path::Path;

/// What `open_folder` did before opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Existed,
    Created,
}

/// Make sure `dir` exists, creating it when `create` is set.
pub fn ensure_folder(dir: &Path, create: bool) -> Result<FolderState> {
    if dir.is_dir() {
        return Ok(FolderState::Existed);
    }
    if !create {
        return Err(ManagerError::missing(dir, "The folder does not exist"));
    }
    fs::create_dir_all(dir)?;
    log::info!("Created folder {}", dir.display());
    Ok(FolderState::Created)
}

pub fn open_folder(dir: &Path, create: bool) -> Result<FolderState> {
    let state = ensure_folder(dir, create)?;
    open::that(dir)?;
    Ok(state)
}

/// Open a file, or fail with `missing_message` if it is not there.
pub fn open_file(file: &Path, missing_message: &str) -> Result<()> {
    if !file.is_file() {
        return Err(ManagerError::missing(file, missing_message));
    }
    log::info!("Opening file: {}", file.display());
    open::that(file)?;
    Ok(())
}
