//! Configuration file formats

use crate::{Config, ConfigError, ConfigResult};
use config::FileFormat;
use std::path::Path;

/// A format configuration files can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml`, `.yml`, and anything unrecognized
    Yaml,
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    pub(crate) fn file_format(self) -> FileFormat {
        match self {
            Self::Yaml => FileFormat::Yaml,
            Self::Toml => FileFormat::Toml,
            Self::Json => FileFormat::Json,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// Serialize a configuration in this format
    pub fn render(self, config: &Config) -> ConfigResult<String> {
        let rendered = match self {
            Self::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
            Self::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        };
        rendered.map_err(|message| ConfigError::Render {
            format: self.name(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mtpcopy.yaml", ConfigFormat::Yaml)]
    #[case("mtpcopy.yml", ConfigFormat::Yaml)]
    #[case("mtpcopy.TOML", ConfigFormat::Toml)]
    #[case("mtpcopy.json", ConfigFormat::Json)]
    #[case("mtpcopy", ConfigFormat::Yaml)]
    fn test_from_path(#[case] path: &str, #[case] expected: ConfigFormat) {
        assert_eq!(ConfigFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn test_toml_render_has_sections() {
        let toml = ConfigFormat::Toml.render(&Config::default()).unwrap();
        assert!(toml.contains("[transfer]"));
        assert!(toml.contains("[logging]"));
    }
}
