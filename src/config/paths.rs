//! Canonical paths for stashvoice.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! | Location | Purpose |
//! |----------|---------|
//! | `~/.stashvoice/` | Default home |
//! | `<home>/review.txt` | Scratch document handed to the editor |
//! | `<home>/review.txt.lock` | Lock held while a review is open |
//! | `.stashvoice/config.yaml` | Optional project config, found by walking up from cwd |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory holding the config file
pub const CONFIG_DIR: &str = ".stashvoice";

/// Config file name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.yaml";

/// Scratch document name inside the home directory
pub const SCRATCH_FILE: &str = "review.txt";

/// Get the default home directory (~/.stashvoice)
pub fn default_home() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR))
}

/// Get the scratch file path for a home directory
pub fn scratch_file(home: &Path) -> PathBuf {
    home.join(SCRATCH_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_file_lives_in_home() {
        assert_eq!(
            scratch_file(Path::new("/h/.stashvoice")),
            PathBuf::from("/h/.stashvoice/review.txt")
        );
    }

    #[test]
    fn test_default_home_ends_with_config_dir() {
        if let Ok(home) = default_home() {
            assert!(home.ends_with(CONFIG_DIR));
        }
    }
}
