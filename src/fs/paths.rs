//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        tracing::info!("Created directory: {}", path.display());
    }
    Ok(())
}

/// Create the output directory if needed and make it the working directory,
/// so relative output paths land inside it. Returns the absolute path.
pub fn enter_output_directory(path: &Path) -> Result<PathBuf> {
    ensure_dir(path)?;
    std::env::set_current_dir(path)?;
    Ok(std::env::current_dir()?)
}

/// Get the output path for an episode file.
pub fn get_output_path(output_dir: &Path, filename: &str) -> PathBuf {
    output_dir.join(filename)
}
