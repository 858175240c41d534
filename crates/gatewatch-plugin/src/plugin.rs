//! Plugin registration and lifecycle.

use std::sync::Arc;

use gatewatch_host::{
    Host, PageAttachment, PageContext, Plugin, Preloader, PreloaderSpec, Result,
};
use gatewatch_types::PrefKey;
use tracing::info;
use uuid::Uuid;

use crate::background::{BackgroundHandle, BackgroundListener};
use crate::monitor::{snapshot_from_prefs, MonitorConfig, PageMonitor};
use crate::panel::PrioritySettingsPanel;

/// URL pattern the preloader attaches to.
pub const SEATGEEK_URL_PATTERN: &str = r"^https://seatgeek\.com";

/// Starts a page monitor on every main-frame SeatGeek page.
struct SeatGeekPreloader {
    config: MonitorConfig,
}

impl Preloader for SeatGeekPreloader {
    fn attach(&self, ctx: PageContext) -> Result<PageAttachment> {
        if !ctx.page.is_main_frame() {
            return Ok(PageAttachment::empty());
        }
        let priorities = snapshot_from_prefs(&ctx.preferences);
        let monitor = PageMonitor::new(ctx.page, priorities, ctx.actions, self.config);
        Ok(PageAttachment::from_guard(monitor.start()))
    }
}

/// The SeatGeek priority groups plugin.
///
/// `init` registers the four priority preferences. `enable` adds the page
/// preloader and the settings panel and starts the queue update listener;
/// `disable` removes them again. Monitors already attached to pages keep
/// running until their page session is dropped.
pub struct PriorityGroupsPlugin {
    monitor_config: MonitorConfig,
    preloader_id: Option<Uuid>,
    panel_id: Option<Uuid>,
    listener: Option<BackgroundHandle>,
}

impl PriorityGroupsPlugin {
    pub fn new() -> Self {
        Self::with_monitor_config(MonitorConfig::default())
    }

    /// A plugin whose monitors scan at a custom cadence.
    pub fn with_monitor_config(config: MonitorConfig) -> Self {
        Self {
            monitor_config: config,
            preloader_id: None,
            panel_id: None,
            listener: None,
        }
    }
}

impl Default for PriorityGroupsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PriorityGroupsPlugin {
    fn name(&self) -> &str {
        "seatgeek-preloader"
    }

    fn init(&mut self, host: &Host) -> Result<()> {
        for key in PrefKey::ALL {
            host.preferences.register(key.as_str(), "0");
        }
        Ok(())
    }

    fn enable(&mut self, host: &Host) -> Result<()> {
        let spec = PreloaderSpec {
            url_patterns: vec![SEATGEEK_URL_PATTERN.to_string()],
            preloader: Arc::new(SeatGeekPreloader {
                config: self.monitor_config,
            }),
        };
        self.preloader_id = Some(host.preloaders.add(spec)?);
        self.panel_id = Some(
            host.panels
                .add("SeatGeek", |ctx| Box::new(PrioritySettingsPanel::new(ctx))),
        );
        self.listener = Some(BackgroundListener::start(&host.ipc));
        info!(target: "gatewatch::plugin", "SeatGeek priority groups enabled");
        Ok(())
    }

    fn disable(&mut self, host: &Host) -> Result<()> {
        if let Some(id) = self.preloader_id.take() {
            host.preloaders.remove(id)?;
        }
        if let Some(id) = self.panel_id.take() {
            host.panels.remove(id)?;
        }
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
        info!(target: "gatewatch::plugin", "SeatGeek priority groups disabled");
        Ok(())
    }
}
