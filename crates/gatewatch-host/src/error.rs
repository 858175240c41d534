//! Error types for the Gatewatch host surface.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Unknown preference key: {0}")]
    UnknownPreference(String),

    #[error("Preloader not found: {0}")]
    PreloaderNotFound(Uuid),

    #[error("Setting panel not found: {0}")]
    PanelNotFound(Uuid),

    #[error("Unknown widget: {0}")]
    UnknownWidget(String),

    #[error("Plugin already installed: {0}")]
    PluginAlreadyInstalled(String),

    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    #[error("Unsupported plugin registry version: {0}")]
    UnsupportedRegistryVersion(u32),

    #[error("Invalid URL pattern: {0}")]
    InvalidUrlPattern(#[from] regex::Error),

    #[error("Page is gone")]
    PageGone,

    #[error("Invalid priority: {0}")]
    InvalidPriority(#[from] gatewatch_types::InvalidPriority),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
