use anyhow::{Context, Result};
use home::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Where the config file comes from and whether it has to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub required: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BrrEnv {
    root: Option<PathBuf>,
    config_override: Option<PathBuf>,
}

impl BrrEnv {
    pub fn new() -> Self {
        let root = env::var_os("BRR_ROOT")
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|home| home.join(".brr")));
        let config_override = env::var_os("BRR_CONFIG").map(PathBuf::from);

        Self {
            root,
            config_override,
        }
    }

    /// Resolve the config file: an explicit path first, then `$BRR_CONFIG`,
    /// then `config.toml` under the brr root.
    ///
    /// Only the root default may be missing.
    pub fn config_location(&self, explicit: Option<&Path>) -> Option<ConfigLocation> {
        if let Some(path) = explicit.or(self.config_override.as_deref()) {
            return Some(ConfigLocation {
                path: path.to_path_buf(),
                required: true,
            });
        }

        self.root.as_ref().map(|root| ConfigLocation {
            path: root.join("config.toml"),
            required: false,
        })
    }
}

impl ConfigLocation {
    /// Read the file, `None` when an optional file does not exist.
    pub fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read config file {}", self.path.display())),
        }
    }
}
