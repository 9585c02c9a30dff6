// strider_sim/src/error.rs

use std::path::PathBuf;

use strider_core::error::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("no scenario found at {0:?}")]
    ScenarioNotFound(PathBuf),

    #[error("failed to load scenario: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("invalid engine config: {0}")]
    Engine(#[from] ConfigError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] toml::ser::Error),
}

impl From<figment::Error> for SimError {
    fn from(err: figment::Error) -> Self {
        SimError::Load(Box::new(err))
    }
}
