//! Plugin lifecycle contract.

use crate::{Host, Result};

/// Registry ABI version this host implements.
pub const SUPPORTED_REGISTRY_VERSION: u32 = 1;

/// Install-time plugin properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginProps {
    /// Registry ABI version the plugin targets.
    pub registry_version: u32,
    /// Enable immediately after install.
    pub enabled: bool,
}

impl Default for PluginProps {
    fn default() -> Self {
        Self {
            registry_version: SUPPORTED_REGISTRY_VERSION,
            enabled: true,
        }
    }
}

/// A plugin the host can install.
///
/// The host guarantees the lifecycle ordering: `init` once at install,
/// then alternating `enable`/`disable`. Repeated enables and disables are
/// absorbed by the host and never reach the plugin.
pub trait Plugin: Send {
    /// Stable plugin name, unique per host.
    fn name(&self) -> &str;

    /// Install-time properties.
    fn props(&self) -> PluginProps {
        PluginProps::default()
    }

    /// One-time setup at install, e.g. registering preferences.
    fn init(&mut self, host: &Host) -> Result<()>;

    /// Activate: register preloaders, panels, and listeners.
    fn enable(&mut self, host: &Host) -> Result<()>;

    /// Deactivate: remove everything `enable` registered.
    fn disable(&mut self, host: &Host) -> Result<()>;
}
