use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sigtrace::SignatureConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("No base directory given. Pass --base-dir or set the DIR environment variable")]
    MissingBaseDir,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Load a configuration from TOML
pub fn config_from_toml(content: &str) -> Result<SignatureConfig, CliError> {
    Ok(toml::from_str(content)?)
}

/// Load a configuration from JSON
pub fn config_from_json(content: &str) -> Result<SignatureConfig, CliError> {
    Ok(serde_json::from_str(content)?)
}

/// Auto-detect file format and load configuration
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SignatureConfig, CliError> {
    let path_ref = path.as_ref();
    match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => config_from_toml(&fs::read_to_string(path_ref)?),
        Some("json") => config_from_json(&fs::read_to_string(path_ref)?),
        _ => Err(CliError::UnsupportedFileFormat),
    }
}

/// Save configuration, picking TOML or JSON from the extension
pub fn save_config<P: AsRef<Path>>(config: &SignatureConfig, path: P) -> Result<(), CliError> {
    let path_ref = path.as_ref();
    let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::to_string_pretty(config)?,
        Some("json") => serde_json::to_string_pretty(config)?,
        _ => return Err(CliError::UnsupportedFileFormat),
    };
    fs::write(path_ref, content)?;
    Ok(())
}

/// JSON schema of the configuration file
pub fn config_schema_json() -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&SignatureConfig::schema())?)
}

/// Where the sample run reads its scan and writes its artifacts
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SampleLayout {
    pub input: PathBuf,
    pub mask_output: PathBuf,
    pub vector_output: PathBuf,
}

impl SampleLayout {
    pub fn from_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        let images = base_dir.as_ref().join("testing_images");
        Self {
            input: images.join("unclean_sample.jpg"),
            mask_output: images.join("clean_sample.png"),
            vector_output: images.join("clean_sample.svg"),
        }
    }

    pub fn resolve(base_dir: Option<&Path>) -> Result<Self, CliError> {
        base_dir.map(Self::from_base_dir).ok_or(CliError::MissingBaseDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigtrace::algorithms::ResizePolicy;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = config_from_toml(
            r#"
            [normalize]
            policy = "always_fit"

            [components]
            max_bridge_distance = 12.5
            "#,
        )
        .expect("Should parse toml");

        assert_eq!(config.normalize.policy, ResizePolicy::AlwaysFit);
        assert_eq!(config.normalize.max_dimension, 800);
        assert_eq!(config.components.max_bridge_distance, 12.5);
        assert_eq!(config.components.min_area, 20);
        assert_eq!(config.threshold, SignatureConfig::default().threshold);
    }

    #[test]
    fn test_json_config() {
        let config = config_from_json(r#"{ "threshold": { "median_denoise": true, "window": 15 } }"#)
            .expect("Should parse json");
        assert!(config.threshold.median_denoise);
        assert_eq!(config.threshold.window, 15);
        assert_eq!(config.threshold.offset, 2.0);
    }

    #[test]
    fn test_config_files_by_extension() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let config = SignatureConfig::extended();

        for name in ["config.toml", "config.json"] {
            let path = dir.path().join(name);
            save_config(&config, &path).expect("Should save config");
            assert_eq!(load_config(&path).expect("Should load config"), config);
        }

        let yaml = dir.path().join("config.yaml");
        assert!(matches!(save_config(&config, &yaml), Err(CliError::UnsupportedFileFormat)));
        assert!(matches!(load_config(&yaml), Err(CliError::UnsupportedFileFormat)));
    }

    #[test]
    fn test_schema_lists_stage_sections() {
        let schema = config_schema_json().expect("Should render schema");
        assert!(schema.contains("\"normalize\""));
        assert!(schema.contains("\"contours\""));
    }

    #[test]
    fn test_sample_layout() {
        let layout = SampleLayout::from_base_dir("/data/sigs");
        assert_eq!(layout.input, PathBuf::from("/data/sigs/testing_images/unclean_sample.jpg"));
        assert_eq!(layout.mask_output, PathBuf::from("/data/sigs/testing_images/clean_sample.png"));
        assert_eq!(layout.vector_output, PathBuf::from("/data/sigs/testing_images/clean_sample.svg"));

        assert!(matches!(SampleLayout::resolve(None), Err(CliError::MissingBaseDir)));
        assert_eq!(
            SampleLayout::resolve(Some(Path::new("/data/sigs"))).expect("Should resolve"),
            layout
        );
    }
}
