//! Platform-specific directory management
//!
//! Provides the system-wide and per-user configuration directories that hold
//! the two lower configuration layers and their scaffolding templates.
//! Follows XDG Base Directory Specification on Linux and standard locations on macOS.
//!
//! Environment variables can override default directories:
//! - `FLEETKIT_SYSTEM_DIR` - Override system configuration directory
//! - `FLEETKIT_CONFIG_DIR` - Override user configuration directory

use std::env;
use std::path::PathBuf;

use crate::config::defaults::{CONFIG_FILE_NAME, SYSTEM_CONFIG_DIR, TEMPLATES_SUBDIR};

/// Environment variable names for directory overrides
pub const ENV_SYSTEM_DIR: &str = "FLEETKIT_SYSTEM_DIR";
pub const ENV_CONFIG_DIR: &str = "FLEETKIT_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "fleetkit";

/// Platform-specific directory provider for fleetkit
#[derive(Debug, Clone)]
pub struct FleetkitDirs {
    system_dir: PathBuf,
    config_dir: PathBuf,
}

impl FleetkitDirs {
    /// Create a new `FleetkitDirs` instance
    ///
    /// Checks environment variables first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system_dir: Self::resolve_system_dir(),
            config_dir: Self::resolve_config_dir(),
        }
    }

    /// Build from explicit directories
    #[must_use]
    pub fn with_dirs(system_dir: PathBuf, config_dir: PathBuf) -> Self {
        Self {
            system_dir,
            config_dir,
        }
    }

    /// Get the system configuration directory (`/etc/fleetkit`)
    #[must_use]
    pub fn system_dir(&self) -> PathBuf {
        self.system_dir.clone()
    }

    /// Get the user configuration directory
    ///
    /// - Linux: `$XDG_CONFIG_HOME/fleetkit` or `~/.config/fleetkit`
    /// - macOS: `~/Library/Application Support/fleetkit`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Path of the system layer file
    #[must_use]
    pub fn system_config_path(&self) -> PathBuf {
        self.system_dir.join(CONFIG_FILE_NAME)
    }

    /// Path of the user layer file
    #[must_use]
    pub fn user_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Template search directories, lowest precedence first
    #[must_use]
    pub fn template_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.system_dir.join(TEMPLATES_SUBDIR),
            self.config_dir.join(TEMPLATES_SUBDIR),
        ]
    }

    fn resolve_system_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_SYSTEM_DIR) {
            return PathBuf::from(path);
        }

        PathBuf::from(SYSTEM_CONFIG_DIR)
    }

    fn resolve_config_dir() -> PathBuf {
        if let Ok(path) = env::var(ENV_CONFIG_DIR) {
            return PathBuf::from(path);
        }

        Self::platform_config_dir()
    }

    /// Get platform-specific config directory
    fn platform_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".config").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".config").join(APP_NAME))
            })
    }
}

impl Default for FleetkitDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_new_creates_instance() {
        let dirs = FleetkitDirs::new();
        assert!(!dirs.system_dir().as_os_str().is_empty());
        assert!(!dirs.config_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_layer_files_are_inside_their_dirs() {
        let dirs = FleetkitDirs::with_dirs(PathBuf::from("/sys-layer"), PathBuf::from("/usr-layer"));
        assert_eq!(
            dirs.system_config_path(),
            PathBuf::from("/sys-layer/fleetkit.yaml")
        );
        assert!(dirs.user_config_path().starts_with(dirs.config_dir()));
    }

    #[test]
    fn test_user_templates_come_last() {
        let dirs = FleetkitDirs::with_dirs(PathBuf::from("/a"), PathBuf::from("/b"));
        let template_dirs = dirs.template_dirs();
        assert_eq!(template_dirs.len(), 2);
        assert!(template_dirs[1].starts_with("/b"));
    }
}
