//! Configuration file discovery, loading and saving

use crate::builder::ConfigBuilder;
use crate::format::ConfigFormat;
use crate::{Config, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MTPCOPY";

/// File names probed in each search directory, in order
const FILE_NAMES: [&str; 3] = ["mtpcopy.yaml", "mtpcopy.yml", "mtpcopy.toml"];

/// Loads and saves configuration files
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the first configuration file found in the search path plus
    /// environment overrides, or the defaults when there is none
    pub fn load_default() -> ConfigResult<Config> {
        let builder = match Self::config_exists() {
            Some(path) => ConfigBuilder::new().add_source_file(path),
            None => ConfigBuilder::new(),
        };
        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Load a specific file plus environment overrides
    ///
    /// Unlike [`Self::load_default`], a missing file is an error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        if let Err(source) = std::fs::metadata(path) {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        ConfigBuilder::new()
            .add_required_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Save a configuration, choosing the format from the file extension
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = ConfigFormat::from_path(path).render(config)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the default configuration to `path`
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// The default configuration as YAML
    pub fn default_config_yaml() -> ConfigResult<String> {
        ConfigFormat::Yaml.render(&Config::default())
    }

    /// Candidate configuration files, most specific first
    ///
    /// The working directory is searched for `mtpcopy.*` and `.mtpcopy.*`,
    /// then the user configuration directory for `mtpcopy/config.*`, then
    /// `/etc/mtpcopy/config.*` on Unix.
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = FILE_NAMES.iter().map(PathBuf::from).collect();
        paths.extend(FILE_NAMES.iter().map(|name| PathBuf::from(format!(".{}", name))));

        let config_names = FILE_NAMES.map(|name| name.replacen("mtpcopy", "config", 1));
        let mut app_dirs: Vec<PathBuf> = user_config_dir()
            .map(|dir| dir.join("mtpcopy"))
            .into_iter()
            .collect();
        if cfg!(unix) {
            app_dirs.push(PathBuf::from("/etc/mtpcopy"));
        }
        for dir in app_dirs {
            paths.extend(config_names.iter().map(|name| dir.join(name)));
        }

        paths
    }

    /// The first existing file in [`Self::default_config_paths`]
    pub fn config_exists() -> Option<PathBuf> {
        Self::default_config_paths()
            .into_iter()
            .find(|path| path.is_file())
    }
}

/// Per-user configuration directory of the platform
fn user_config_dir() -> Option<PathBuf> {
    let home = || std::env::var_os("HOME").map(PathBuf::from);
    if cfg!(windows) {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home().map(|home| home.join("Library").join("Application Support"))
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|home| home.join(".config")))
    }
}
