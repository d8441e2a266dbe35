use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("failed to render configuration: {0}")]
    ConfigRender(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
