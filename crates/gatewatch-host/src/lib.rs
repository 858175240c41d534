//! Host-side surface for Gatewatch plugins.
//!
//! This library provides the registries, buses, and page plumbing a Jancy-style
//! embedding host exposes to plugins: preference storage with change
//! broadcasting, preloader and setting-panel registries, the action dispatch
//! bus, and a renderer-facing IPC bus. It's separated from any particular
//! embedder to enable integration testing.

mod actions;
mod error;
mod host;
mod ipc;
pub mod logging;
mod page;
mod panel;
mod plugin;
mod prefs;
mod prefs_watcher;
mod preloader;

pub use actions::ActionBus;
pub use error::HostError;
pub use host::{Host, HostConfig, PageSession};
pub use ipc::IpcBus;
pub use page::{InMemoryPage, Page, PageAttachment, PageContext};
pub use panel::{PanelContext, PanelHandle, SettingPanel, SettingPanelRegistry};
pub use plugin::{Plugin, PluginProps, SUPPORTED_REGISTRY_VERSION};
pub use prefs::{default_store_path, PreferenceRegistry};
pub use prefs_watcher::{PrefsWatcher, PrefsWatcherHandle};
pub use preloader::{Preloader, PreloaderRegistry, PreloaderSpec};

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, HostError>;
