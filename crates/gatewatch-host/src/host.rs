//! The embedded host runtime: registries, buses, and plugin lifecycle.

use crate::{
    ActionBus, HostError, IpcBus, Page, PageAttachment, PageContext, Plugin, PreferenceRegistry,
    PrefsWatcher, PrefsWatcherHandle, PreloaderRegistry, Result, SettingPanelRegistry,
    SUPPORTED_REGISTRY_VERSION,
};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Host construction options.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Preference store file; `None` keeps preferences in memory.
    pub prefs_path: Option<PathBuf>,
    /// Reload the store when the file changes on disk.
    pub watch_prefs: bool,
}

impl HostConfig {
    /// Persistence under the platform data dir, with the store watched.
    pub fn persistent() -> Self {
        Self {
            prefs_path: Some(crate::default_store_path()),
            watch_prefs: true,
        }
    }
}

struct PluginSlot {
    plugin: Box<dyn Plugin>,
    enabled: bool,
}

/// The host runtime plugins are installed into.
pub struct Host {
    pub preferences: Arc<PreferenceRegistry>,
    pub preloaders: Arc<PreloaderRegistry>,
    pub panels: Arc<SettingPanelRegistry>,
    pub actions: ActionBus,
    pub ipc: Arc<IpcBus>,
    plugins: DashMap<String, PluginSlot>,
    _prefs_watcher: Option<PrefsWatcherHandle>,
}

impl Host {
    /// An in-memory host with no persistence.
    pub fn new() -> Self {
        let preferences = Arc::new(PreferenceRegistry::new());
        let panels = Arc::new(SettingPanelRegistry::new());
        let actions = ActionBus::new(preferences.clone(), panels.clone());
        Self {
            preferences,
            preloaders: Arc::new(PreloaderRegistry::new()),
            panels,
            actions,
            ipc: Arc::new(IpcBus::new()),
            plugins: DashMap::new(),
            _prefs_watcher: None,
        }
    }

    /// A host with preference persistence per `config`.
    ///
    /// Must be called inside a tokio runtime when `watch_prefs` is set.
    pub fn with_config(config: HostConfig) -> anyhow::Result<Self> {
        let mut host = Self::new();
        if let Some(path) = config.prefs_path {
            if path.exists() {
                let changes = host.preferences.load_from(&path)?;
                info!(
                    target: "gatewatch::host",
                    "Loaded preference store from {} ({} value(s))",
                    path.display(),
                    changes.len()
                );
            } else {
                host.preferences.save_to(&path)?;
            }
            host.actions.set_store_path(path.clone());

            if config.watch_prefs {
                let watcher =
                    PrefsWatcher::new(path, host.preferences.clone(), host.panels.clone());
                host._prefs_watcher = Some(watcher.start()?);
            }
        }
        Ok(host)
    }

    /// Installs a plugin and runs its `init`. Plugins whose props carry
    /// `enabled` are enabled right away.
    pub fn install(&self, plugin: Box<dyn Plugin>) -> Result<()> {
        let props = plugin.props();
        if props.registry_version != SUPPORTED_REGISTRY_VERSION {
            return Err(HostError::UnsupportedRegistryVersion(props.registry_version));
        }

        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) {
            return Err(HostError::PluginAlreadyInstalled(name));
        }

        let mut plugin = plugin;
        plugin.init(self)?;
        info!(target: "gatewatch::host", "Installed plugin '{}'", name);
        self.plugins.insert(
            name.clone(),
            PluginSlot {
                plugin,
                enabled: false,
            },
        );

        if props.enabled {
            self.enable_plugin(&name)?;
        }
        Ok(())
    }

    /// Enables an installed plugin. No-op if already enabled.
    pub fn enable_plugin(&self, name: &str) -> Result<()> {
        // The slot leaves the map while the callback runs; plugin code must
        // not observe the host holding its own locks.
        let (key, mut slot) = self
            .plugins
            .remove(name)
            .ok_or_else(|| HostError::PluginNotFound(name.to_string()))?;
        if slot.enabled {
            self.plugins.insert(key, slot);
            return Ok(());
        }

        let result = slot.plugin.enable(self);
        if result.is_ok() {
            slot.enabled = true;
            info!(target: "gatewatch::host", "Enabled plugin '{}'", key);
        }
        self.plugins.insert(key, slot);
        result
    }

    /// Disables an installed plugin. No-op if not enabled.
    pub fn disable_plugin(&self, name: &str) -> Result<()> {
        let (key, mut slot) = self
            .plugins
            .remove(name)
            .ok_or_else(|| HostError::PluginNotFound(name.to_string()))?;
        if !slot.enabled {
            self.plugins.insert(key, slot);
            return Ok(());
        }

        let result = slot.plugin.disable(self);
        if result.is_ok() {
            slot.enabled = false;
            info!(target: "gatewatch::host", "Disabled plugin '{}'", key);
        }
        self.plugins.insert(key, slot);
        result
    }

    pub fn plugin_enabled(&self, name: &str) -> bool {
        self.plugins.get(name).map(|s| s.enabled).unwrap_or(false)
    }

    /// Runs matching preloaders against a freshly loaded page.
    ///
    /// Call after the page's initial content load. A failed attach is
    /// logged and skipped; one broken preloader never blocks the others.
    /// Drop the returned session on page unload.
    pub fn page_loaded(&self, page: Arc<dyn Page>) -> PageSession {
        let url = page.url();
        let tab_id = page.tab_id();

        let mut attachments = Vec::new();
        for preloader in self.preloaders.matching(&url) {
            let ctx = PageContext {
                page: page.clone(),
                actions: self.actions.clone(),
                preferences: self.preferences.snapshot(),
            };
            match preloader.attach(ctx) {
                Ok(attachment) => attachments.push(attachment),
                Err(e) => {
                    warn!(
                        target: "gatewatch::host",
                        "Preloader attach failed on {}: {}",
                        url,
                        e
                    );
                }
            }
        }

        info!(
            target: "gatewatch::host",
            "Page loaded: {} ({} attachment(s))",
            url,
            attachments.len()
        );
        PageSession {
            tab_id,
            attachments,
        }
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

/// Attachments created for one page load.
///
/// Dropping the session is the page-unload signal: every monitor or task
/// the preloaders started stops with it.
pub struct PageSession {
    tab_id: Uuid,
    attachments: Vec<PageAttachment>,
}

impl PageSession {
    pub fn tab_id(&self) -> Uuid {
        self.tab_id
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }

    /// True when no preloader started any background work.
    pub fn is_idle(&self) -> bool {
        self.attachments.iter().all(|a| a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryPage, Preloader, PreloaderSpec};

    struct TestPlugin {
        props: crate::PluginProps,
        inits: usize,
        enables: usize,
        disables: usize,
    }

    impl TestPlugin {
        fn new(props: crate::PluginProps) -> Self {
            Self {
                props,
                inits: 0,
                enables: 0,
                disables: 0,
            }
        }
    }

    impl Plugin for TestPlugin {
        fn name(&self) -> &str {
            "test-plugin"
        }

        fn props(&self) -> crate::PluginProps {
            self.props
        }

        fn init(&mut self, host: &Host) -> Result<()> {
            self.inits += 1;
            host.preferences.register("test_pref", "0");
            Ok(())
        }

        fn enable(&mut self, _host: &Host) -> Result<()> {
            self.enables += 1;
            Ok(())
        }

        fn disable(&mut self, _host: &Host) -> Result<()> {
            self.disables += 1;
            Ok(())
        }
    }

    #[test]
    fn test_install_runs_init_and_auto_enables() {
        let host = Host::new();
        host.install(Box::new(TestPlugin::new(crate::PluginProps::default())))
            .unwrap();

        assert!(host.plugin_enabled("test-plugin"));
        assert_eq!(host.preferences.get("test_pref").as_deref(), Some("0"));
    }

    #[test]
    fn test_install_respects_disabled_props() {
        let host = Host::new();
        let props = crate::PluginProps {
            enabled: false,
            ..Default::default()
        };
        host.install(Box::new(TestPlugin::new(props))).unwrap();
        assert!(!host.plugin_enabled("test-plugin"));
    }

    #[test]
    fn test_install_rejects_wrong_registry_version() {
        let host = Host::new();
        let props = crate::PluginProps {
            registry_version: 2,
            ..Default::default()
        };
        let err = host.install(Box::new(TestPlugin::new(props))).unwrap_err();
        assert!(matches!(err, HostError::UnsupportedRegistryVersion(2)));
        assert!(!host.plugin_enabled("test-plugin"));
    }

    #[test]
    fn test_install_rejects_duplicates() {
        let host = Host::new();
        host.install(Box::new(TestPlugin::new(Default::default())))
            .unwrap();
        let err = host
            .install(Box::new(TestPlugin::new(Default::default())))
            .unwrap_err();
        assert!(matches!(err, HostError::PluginAlreadyInstalled(_)));
    }

    #[test]
    fn test_enable_disable_are_idempotent() {
        let host = Host::new();
        let props = crate::PluginProps {
            enabled: false,
            ..Default::default()
        };
        host.install(Box::new(TestPlugin::new(props))).unwrap();

        host.enable_plugin("test-plugin").unwrap();
        host.enable_plugin("test-plugin").unwrap();
        assert!(host.plugin_enabled("test-plugin"));

        host.disable_plugin("test-plugin").unwrap();
        host.disable_plugin("test-plugin").unwrap();
        assert!(!host.plugin_enabled("test-plugin"));

        assert!(matches!(
            host.enable_plugin("missing").unwrap_err(),
            HostError::PluginNotFound(_)
        ));
    }

    struct CountingPreloader;

    impl Preloader for CountingPreloader {
        fn attach(&self, ctx: PageContext) -> Result<PageAttachment> {
            assert!(ctx.page.is_main_frame());
            Ok(PageAttachment::from_guard("attached"))
        }
    }

    #[test]
    fn test_page_loaded_attaches_matching_preloaders() {
        let host = Host::new();
        host.preloaders
            .add(PreloaderSpec {
                url_patterns: vec![r"^https://seatgeek\.com".to_string()],
                preloader: Arc::new(CountingPreloader),
            })
            .unwrap();

        let page = Arc::new(InMemoryPage::new("https://seatgeek.com/some-event"));
        let session = host.page_loaded(page);
        assert_eq!(session.attachment_count(), 1);
        assert!(!session.is_idle());

        let other = Arc::new(InMemoryPage::new("https://example.com"));
        let session = host.page_loaded(other);
        assert_eq!(session.attachment_count(), 0);
    }

    #[test]
    fn test_persistent_config_points_at_data_dir() {
        let config = HostConfig::persistent();
        let path = config.prefs_path.unwrap();
        assert!(path.ends_with("gatewatch/preferences.toml"));
        assert!(config.watch_prefs);
    }
}
