//! Error types
//!
//! Nothing in here is fatal during steady-state play. Input and asset
//! failures degrade to neutral values; only surface creation and settings
//! loading hand errors back to the caller.

use thiserror::Error;

/// Tilt sensor failures (both are treated as a neutral reading)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("tilt sensor is not available on this device")]
    Unavailable,
    #[error("no tilt sample has arrived yet")]
    StaleSample,
}

/// Image decoding failures reported by the host's asset loader
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to decode {key}: {reason}")]
    Decode { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render context has not been initialised for this surface")]
    ContextNotReady,
    #[error("failed to create shader program: {0}")]
    ProgramCreation(String),
    #[error("failed to upload texture: {0}")]
    TextureUpload(String),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
