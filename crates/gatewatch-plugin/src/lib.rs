//! SeatGeek priority groups plugin for Gatewatch.

mod background;
mod classify;
mod monitor;
mod panel;
mod plugin;

pub use background::{BackgroundHandle, BackgroundListener, QUEUE_UPDATE_CHANNEL};
pub use classify::classify_page;
pub use monitor::{snapshot_from_prefs, MonitorConfig, MonitorHandle, PageMonitor};
pub use panel::PrioritySettingsPanel;
pub use plugin::{PriorityGroupsPlugin, SEATGEEK_URL_PATTERN};
