//! Program Manager configuration
//!
//! Replaces the registry values the shell would consult: the user and
//! common Programs folders (`CSIDL_PROGRAMS`, `CSIDL_COMMON_PROGRAMS`),
//! the cabinet state full-path-title flag, and the executable search
//! path used to resolve bare program names.
//!
//! ```toml
//! programs_dir = "/home/user/.local/share/Microsoft/Windows/Start Menu/Programs"
//! full_path_title = false
//! search_path = ["/opt/windows/system32"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extensions tried, in order, for a program name without one
pub const DEFAULT_EXECUTABLE_EXTENSIONS: &[&str] = &[".exe", ".com", ".bat", ".cmd"];

/// Programs folder below the per-user application data directory
const PROGRAMS_SUBDIR: &[&str] = &["Microsoft", "Windows", "Start Menu", "Programs"];

/// Configuration load failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Program Manager settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgmanConfig {
    /// Per-user Programs folder (CSIDL_PROGRAMS)
    pub programs_dir: PathBuf,
    /// All-users Programs folder (CSIDL_COMMON_PROGRAMS)
    pub common_programs_dir: Option<PathBuf>,
    /// Create groups in the common folder instead of the user folder
    pub use_common: bool,
    /// Explorer shows the full folder path in window titles
    pub full_path_title: bool,
    /// Directories searched for bare program names
    pub search_path: Vec<PathBuf>,
    /// Extensions appended to program names without one
    pub executable_extensions: Vec<String>,
}

impl Default for ProgmanConfig {
    fn default() -> Self {
        Self {
            programs_dir: default_programs_dir(),
            common_programs_dir: None,
            use_common: false,
            full_path_title: false,
            search_path: default_search_path(),
            executable_extensions: DEFAULT_EXECUTABLE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl ProgmanConfig {
    /// Default configuration rooted at `programs_dir`
    pub fn with_programs_dir(programs_dir: impl Into<PathBuf>) -> Self {
        Self {
            programs_dir: programs_dir.into(),
            ..Self::default()
        }
    }

    /// Replace the executable search path
    pub fn search_path(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_path = dirs.into_iter().collect();
        self
    }

    /// Set the full-path-title flag
    pub fn full_path_title(mut self, enabled: bool) -> Self {
        self.full_path_title = enabled;
        self
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&text)?;
        log::debug!("[PROGMAN] configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Folder group directories are created in
    pub fn programs_root(&self) -> &Path {
        match (&self.common_programs_dir, self.use_common) {
            (Some(common), true) => common,
            _ => &self.programs_dir,
        }
    }
}

/// `<data dir>/Microsoft/Windows/Start Menu/Programs`
fn default_programs_dir() -> PathBuf {
    let mut dir = dirs::data_dir().unwrap_or_default();
    for part in PROGRAMS_SUBDIR {
        dir.push(part);
    }
    dir
}

/// Directories listed in `PATH`
fn default_search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProgmanConfig::default();
        assert!(config.programs_dir.ends_with("Start Menu/Programs"));
        assert!(!config.use_common);
        assert!(!config.full_path_title);
        assert_eq!(config.executable_extensions[0], ".exe");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProgmanConfig::from_toml_str(
            r#"
            programs_dir = "/srv/programs"
            full_path_title = true
            search_path = ["/srv/bin"]
            "#,
        )
        .unwrap();

        assert_eq!(config.programs_dir, PathBuf::from("/srv/programs"));
        assert!(config.full_path_title);
        assert_eq!(config.search_path, vec![PathBuf::from("/srv/bin")]);
        assert_eq!(config.executable_extensions.len(), DEFAULT_EXECUTABLE_EXTENSIONS.len());
    }

    #[test]
    fn test_invalid_toml() {
        let err = ProgmanConfig::from_toml_str("use_common = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_programs_root_selects_common_folder() {
        let mut config = ProgmanConfig::with_programs_dir("/user/programs");
        assert_eq!(config.programs_root(), Path::new("/user/programs"));

        config.use_common = true;
        assert_eq!(config.programs_root(), Path::new("/user/programs"));

        config.common_programs_dir = Some(PathBuf::from("/common/programs"));
        assert_eq!(config.programs_root(), Path::new("/common/programs"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProgmanConfig::load(Path::new("/nonexistent/progman.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progman.toml");
        fs::write(&path, "use_common = true\ncommon_programs_dir = \"/all/programs\"\n").unwrap();

        let config = ProgmanConfig::load(&path).unwrap();
        assert_eq!(config.programs_root(), Path::new("/all/programs"));
    }
}
