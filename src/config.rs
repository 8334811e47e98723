//! Configuration from .env and environment variables.
//!
//! `main` loads a `.env` file from the working directory (if present) via
//! dotenvy before this runs, so the environment is the single source read
//! here and real environment variables win over `.env` entries.

use std::env;
use std::path::PathBuf;

/// fsbuild configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default filesystem type for image builds (FSBUILD_FSTYPE).
    pub default_fstype: Option<String>,
    /// Default strictness: stop at the first failing line (FSBUILD_STRICT).
    pub strict: bool,
    /// Accept the historical 5-field slink form (FSBUILD_LEGACY_SLINK).
    pub legacy_slink_mode: bool,
    /// Base directory for temporary mountpoints (FSBUILD_MOUNT_DIR).
    pub mount_dir: PathBuf,
}

impl Config {
    /// Load configuration from the environment, with defaults.
    pub fn load() -> Self {
        let default_fstype = env::var("FSBUILD_FSTYPE").ok().filter(|s| !s.is_empty());
        let strict = env_flag("FSBUILD_STRICT");
        let legacy_slink_mode = env_flag("FSBUILD_LEGACY_SLINK");

        let mount_dir = env::var("FSBUILD_MOUNT_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::runtime_dir)
            .unwrap_or_else(env::temp_dir);

        Self {
            default_fstype,
            strict,
            legacy_slink_mode,
            mount_dir,
        }
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!(
            "  FSBUILD_FSTYPE: {}",
            self.default_fstype.as_deref().unwrap_or("(unset)")
        );
        println!("  FSBUILD_STRICT: {}", self.strict);
        println!("  FSBUILD_LEGACY_SLINK: {}", self.legacy_slink_mode);
        println!("  FSBUILD_MOUNT_DIR: {}", self.mount_dir.display());
    }
}

/// Read a boolean flag from the environment ("1", "true", "yes").
fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_without_environment() {
        env::remove_var("FSBUILD_FSTYPE");
        env::remove_var("FSBUILD_STRICT");
        env::remove_var("FSBUILD_LEGACY_SLINK");
        env::remove_var("FSBUILD_MOUNT_DIR");

        let config = Config::load();
        assert_eq!(config.default_fstype, None);
        assert!(!config.strict);
        assert!(!config.legacy_slink_mode);
        // Falls back to the runtime dir or the system temp dir; either way
        // it must not be empty.
        assert!(!config.mount_dir.as_os_str().is_empty());
    }

    #[test]
    #[serial]
    fn environment_overrides() {
        env::set_var("FSBUILD_FSTYPE", "ext4");
        env::set_var("FSBUILD_STRICT", "1");
        env::set_var("FSBUILD_MOUNT_DIR", "/run/fsbuild");

        let config = Config::load();
        assert_eq!(config.default_fstype.as_deref(), Some("ext4"));
        assert!(config.strict);
        assert_eq!(config.mount_dir, PathBuf::from("/run/fsbuild"));

        env::remove_var("FSBUILD_FSTYPE");
        env::remove_var("FSBUILD_STRICT");
        env::remove_var("FSBUILD_MOUNT_DIR");
    }

    #[test]
    #[serial]
    fn flag_accepts_true_spellings() {
        for value in ["1", "true", "yes", "TRUE"] {
            env::set_var("FSBUILD_STRICT", value);
            assert!(Config::load().strict, "'{}' should enable strict", value);
        }
        for value in ["0", "false", "no", ""] {
            env::set_var("FSBUILD_STRICT", value);
            assert!(!Config::load().strict, "'{}' should not enable strict", value);
        }
        env::remove_var("FSBUILD_STRICT");
    }
}
