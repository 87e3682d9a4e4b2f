//! Subcommand implementations

pub mod check;
pub mod convert;
pub mod info;
pub mod inspect;

use anyhow::Context;
use orange_engine::{Blueprint, Runtime, RuntimeOptions};
use std::path::{Path, PathBuf};

/// Runtime options together with the file they came from
pub struct LoadedConfig {
    pub options: RuntimeOptions,
    pub source: Option<PathBuf>,
}

/// Load options from `path`, or from `./orange.toml` when it exists
pub fn load_options(path: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    let candidate = match path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from("orange.toml");
            default.exists().then_some(default)
        }
    };

    match candidate {
        Some(source) => {
            let options = RuntimeOptions::from_file(&source)
                .with_context(|| format!("Failed to load {}", source.display()))?;
            log::debug!("loaded runtime options from {}", source.display());
            Ok(LoadedConfig {
                options,
                source: Some(source),
            })
        }
        None => Ok(LoadedConfig {
            options: RuntimeOptions::default(),
            source: None,
        }),
    }
}

/// Read a specification file and build it into a blueprint named after
/// the file stem
pub fn load_blueprint(rt: &Runtime, file: &Path) -> anyhow::Result<Blueprint> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", file.display()))?;
    let spec = convert::spec_from_json(&json)?;
    let name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(rt.class(&name, &spec)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_config_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runtime]\nlock_write_once = false").unwrap();

        let config = load_options(Some(file.path())).unwrap();
        assert!(!config.options.lock_write_once);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_options(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_load_blueprint_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Point.json");
        std::fs::write(&path, r#"{"public x": 0, "public y": 0}"#).unwrap();

        let rt = Runtime::new();
        let class = load_blueprint(&rt, &path).unwrap();
        assert_eq!(class.name(), "Point");
        assert_eq!(class.definitions().len(), 2);
    }

    #[test]
    fn test_load_blueprint_reports_definition_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bad.json");
        std::fs::write(&path, r#"{"a b c d": 0}"#).unwrap();

        let rt = Runtime::new();
        let err = load_blueprint(&rt, &path).unwrap_err();
        assert!(err.to_string().contains("a b c d"));
    }
}
