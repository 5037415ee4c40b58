use crate::error::ClientError;
use config::{Config as Cfg, Environment, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve the `config` directory of a crate, whether the process runs from
/// the workspace root or from inside the crate itself.
pub fn configuration_directory(crate_dir: &str) -> Result<PathBuf, ClientError> {
    let base_path = std::env::current_dir()?;

    let directory = if base_path.ends_with(crate_dir) {
        base_path.join("config")
    } else {
        base_path.join(crate_dir).join("config")
    };

    Ok(directory)
}

/// Load settings from `<dir>/base.yaml` (optional) overlaid with environment
/// variables such as `APP__API__URL`.
pub fn load<T: DeserializeOwned>(config_dir: &Path, env_prefix: &str) -> Result<T, ClientError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::from(config_dir.join("base.yaml")).required(false))
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}
