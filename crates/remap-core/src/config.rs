//! Remapper configuration

use crate::error::RemapError;
use crate::missing::MissingPolicy;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Remapper configuration
///
/// Loadable from TOML; every key is optional:
///
/// ```toml
/// maps = "rules.yaml"
/// input = "app"
/// output = "app-remapped"
/// cores = 4
/// missing = "fail"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    /// Rule file
    pub maps: Option<PathBuf>,
    /// Input archive
    pub input: Option<PathBuf>,
    /// Output archive, defaults to the input
    pub output: Option<PathBuf>,
    /// Where to preserve an untouched copy of the input
    pub original: Option<PathBuf>,
    /// Parallelism, including the orchestrating thread
    pub cores: usize,
    /// Reaction to unresolved rule targets
    #[serde(deserialize_with = "lenient_policy")]
    pub missing: MissingPolicy,
    /// Report ancestors that declare a renamed method
    pub find_parents: bool,
    /// Keep enum constant name literals in sync with renamed fields
    pub correct_enums: bool,
}

fn lenient_policy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MissingPolicy, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(MissingPolicy::parse_lenient(&name))
}

impl RemapConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With rule file
    #[must_use]
    pub fn with_maps(mut self, maps: impl Into<PathBuf>) -> Self {
        self.maps = Some(maps.into());
        self
    }

    /// With input archive
    #[must_use]
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// With output archive
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// With preserved copy of the input
    #[must_use]
    pub fn with_original(mut self, original: impl Into<PathBuf>) -> Self {
        self.original = Some(original.into());
        self
    }

    /// With parallelism
    #[inline]
    #[must_use]
    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    /// With missing-symbol policy
    #[inline]
    #[must_use]
    pub fn with_missing(mut self, missing: MissingPolicy) -> Self {
        self.missing = missing;
        self
    }

    /// With parent checks
    #[inline]
    #[must_use]
    pub fn with_find_parents(mut self, enabled: bool) -> Self {
        self.find_parents = enabled;
        self
    }

    /// With enum name correction
    #[inline]
    #[must_use]
    pub fn with_correct_enums(mut self, enabled: bool) -> Self {
        self.correct_enums = enabled;
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// [`RemapError::Config`] for invalid TOML or unknown value types.
    pub fn from_toml_str(text: &str) -> Result<Self, RemapError> {
        toml::from_str(text).map_err(|e| RemapError::Config(e.to_string()))
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// [`RemapError::Io`] if unreadable, otherwise as [`RemapConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, RemapError> {
        let text = std::fs::read_to_string(path).map_err(|e| RemapError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Output archive, falling back to the input
    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref().or(self.input.as_deref())
    }

    /// Check that a run can start
    ///
    /// # Errors
    /// [`RemapError::Config`] naming the first problem found.
    pub fn validate(&self) -> Result<(), RemapError> {
        if self.cores == 0 {
            return Err(RemapError::Config("cores must be at least 1".into()));
        }

        let maps = self
            .maps
            .as_deref()
            .ok_or_else(|| RemapError::Config("no rule file given".into()))?;
        if !maps.is_file() {
            return Err(RemapError::Config(format!(
                "rule file {} does not exist",
                maps.display()
            )));
        }

        let input = self
            .input
            .as_deref()
            .ok_or_else(|| RemapError::Config("no input given".into()))?;
        if !input.is_dir() {
            return Err(RemapError::Config(format!(
                "input {} is not an archive directory",
                input.display()
            )));
        }

        if let Some(original) = &self.original {
            if original == input {
                return Err(RemapError::Config(
                    "original copy cannot overwrite the input".into(),
                ));
            }
            if self.output_path() == Some(original.as_path()) {
                return Err(RemapError::Config(
                    "original copy and output are the same path".into(),
                ));
            }
        }

        for path in [self.output_path(), self.original.as_deref()].into_iter().flatten() {
            if path.is_file() {
                return Err(RemapError::Config(format!(
                    "{} exists and is not a directory",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            maps: None,
            input: None,
            output: None,
            original: None,
            cores: 2,
            missing: MissingPolicy::Warn,
            find_parents: false,
            correct_enums: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = RemapConfig::default();
        assert_eq!(config.cores, 2);
        assert_eq!(config.missing, MissingPolicy::Warn);
        assert!(!config.find_parents);
        assert!(config.correct_enums);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = RemapConfig::from_toml_str(
            "maps = \"rules.yaml\"\ninput = \"in\"\ncores = 4\nmissing = \"FAIL\"\ncorrect_enums = false\n",
        )
        .unwrap();
        assert_eq!(config.maps.as_deref(), Some(Path::new("rules.yaml")));
        assert_eq!(config.cores, 4);
        assert_eq!(config.missing, MissingPolicy::Fail);
        assert!(!config.correct_enums);
        assert_eq!(config.output_path(), Some(Path::new("in")));
    }

    #[test]
    fn unknown_policy_falls_back_to_warn() {
        let config = RemapConfig::from_toml_str("missing = \"shout\"\n").unwrap();
        assert_eq!(config.missing, MissingPolicy::Warn);
    }

    #[test]
    fn bad_types_are_config_errors() {
        assert!(matches!(
            RemapConfig::from_toml_str("cores = \"many\""),
            Err(RemapError::Config(_))
        ));
    }

    #[test]
    fn validation() {
        let dir = TempDir::new().unwrap();
        let maps = dir.path().join("rules.yaml");
        std::fs::write(&maps, "[]").unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();

        let config = RemapConfig::new().with_maps(&maps).with_input(&input);
        assert!(config.validate().is_ok());
        assert!(config.clone().with_cores(0).validate().is_err());
        assert!(config.clone().with_original(&input).validate().is_err());
        assert!(RemapConfig::new().with_input(&input).validate().is_err());
        assert!(config
            .clone()
            .with_maps(dir.path().join("absent.yaml"))
            .validate()
            .is_err());
        assert!(config.with_output(&maps).validate().is_err());
    }
}
