//! Periodic page scanning and priority dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use gatewatch_host::{ActionBus, Page};
use gatewatch_types::{Action, PrefKey, Priority, PrioritySnapshot};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Monitor tuning.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Time between page scans.
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// Builds a priority snapshot from stored preference strings.
///
/// Missing keys keep the default of 0. Values that don't parse as a
/// priority also fall back to 0; the registry is shared with other plugins
/// and the panel can't prevent a bad write from elsewhere.
pub fn snapshot_from_prefs(prefs: &BTreeMap<String, String>) -> PrioritySnapshot {
    let mut snapshot = PrioritySnapshot::default();
    for key in PrefKey::ALL {
        if let Some(raw) = prefs.get(key.as_str()) {
            match Priority::parse(raw) {
                Ok(priority) => snapshot.set(key, priority),
                Err(e) => {
                    debug!(target: "gatewatch::monitor", "Ignoring stored {}: {}", key, e);
                }
            }
        }
    }
    snapshot
}

/// Scans a page's visible text on a timer and dispatches the tab's current
/// priority group after every scan, changed or not.
pub struct PageMonitor {
    page: Arc<dyn Page>,
    priorities: PrioritySnapshot,
    actions: ActionBus,
    config: MonitorConfig,
}

impl PageMonitor {
    pub fn new(
        page: Arc<dyn Page>,
        priorities: PrioritySnapshot,
        actions: ActionBus,
        config: MonitorConfig,
    ) -> Self {
        Self {
            page,
            priorities,
            actions,
            config,
        }
    }

    /// Starts the scan loop.
    ///
    /// The first scan runs one full interval after start. The loop ends when
    /// the handle is stopped or dropped, or when the page can no longer be
    /// read.
    pub fn start(self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<()>();
        let tab_id = self.page.tab_id();

        tokio::spawn(async move {
            let first = Instant::now() + self.config.interval;
            let mut ticker = time::interval_at(first, self.config.interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let text = match self.page.visible_text() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(
                                    target: "gatewatch::monitor",
                                    "Stopping monitor for tab {}: {}",
                                    tab_id, e
                                );
                                break;
                            }
                        };
                        let state = crate::classify_page(&text);
                        let priority_group = self.priorities.priority_for(state);
                        trace!(
                            target: "gatewatch::monitor::tick",
                            "Tab {} state {:?} priority {}",
                            tab_id, state, priority_group
                        );
                        self.actions.dispatch(Action::TabUpdate { tab_id, priority_group });
                    }
                    _ = stop_rx.recv() => break,
                }
            }
            debug!(target: "gatewatch::monitor", "Monitor for tab {} ended", tab_id);
        });

        MonitorHandle { stop_tx }
    }
}

/// Handle to a running page monitor. Dropping it stops the loop.
pub struct MonitorHandle {
    stop_tx: mpsc::UnboundedSender<()>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_host::{InMemoryPage, PreferenceRegistry, SettingPanelRegistry};
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::timeout;

    fn test_bus() -> ActionBus {
        let prefs = Arc::new(PreferenceRegistry::new());
        let panels = Arc::new(SettingPanelRegistry::new());
        ActionBus::new(prefs, panels)
    }

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_snapshot_reads_known_keys() {
        let mut prefs = BTreeMap::new();
        prefs.insert("queue_priority".to_string(), "7".to_string());
        prefs.insert("checkout_priority".to_string(), "2".to_string());

        let snap = snapshot_from_prefs(&prefs);
        assert_eq!(snap.queue.value(), 7);
        assert_eq!(snap.checkout.value(), 2);
        assert_eq!(snap.waiting_room.value(), 0);
        assert_eq!(snap.event.value(), 0);
    }

    #[test]
    fn test_snapshot_ignores_invalid_and_foreign_values() {
        let mut prefs = BTreeMap::new();
        prefs.insert("queue_priority".to_string(), "elevated".to_string());
        prefs.insert("event_priority".to_string(), "12".to_string());
        prefs.insert("theme".to_string(), "dark".to_string());

        let snap = snapshot_from_prefs(&prefs);
        assert_eq!(snap, PrioritySnapshot::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dispatches_priority_on_every_tick() {
        let bus = test_bus();
        let mut rx = bus.subscribe();

        let page = InMemoryPage::with_text("https://seatgeek.com/x", "You're in line!");
        let tab_id = page.tab_id();

        let mut snapshot = PrioritySnapshot::default();
        snapshot.set(PrefKey::QueuePriority, Priority::try_from(7).unwrap());

        let monitor = PageMonitor::new(Arc::new(page), snapshot, bus.clone(), fast_config());
        let handle = monitor.start();

        for _ in 0..3 {
            let envelope = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("tick within 2s")
                .unwrap();
            assert_eq!(envelope.topic, format!("tab:{tab_id}:update"));
            assert_eq!(
                envelope.action.payload().to_string(),
                r#"{"priorityGroup":7}"#
            );
        }

        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unclassified_pages_report_zero() {
        let bus = test_bus();
        let mut rx = bus.subscribe();

        let page = InMemoryPage::with_text("https://seatgeek.com/x", "Welcome to SeatGeek");
        let mut snapshot = PrioritySnapshot::default();
        snapshot.set(PrefKey::QueuePriority, Priority::MAX);

        let handle =
            PageMonitor::new(Arc::new(page), snapshot, bus.clone(), fast_config()).start();

        let envelope = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within 2s")
            .unwrap();
        assert_eq!(
            envelope.action.payload().to_string(),
            r#"{"priorityGroup":0}"#
        );

        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_tracks_text_changes_between_ticks() {
        let bus = test_bus();
        let mut rx = bus.subscribe();

        let page = InMemoryPage::with_text("https://seatgeek.com/x", "1,204 listings");
        let mut snapshot = PrioritySnapshot::default();
        snapshot.set(PrefKey::EventPriority, Priority::try_from(3).unwrap());
        snapshot.set(PrefKey::CheckoutPriority, Priority::try_from(8).unwrap());

        let handle = PageMonitor::new(
            Arc::new(page.clone()),
            snapshot,
            bus.clone(),
            fast_config(),
        )
        .start();

        let envelope = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within 2s")
            .unwrap();
        assert_eq!(
            envelope.action.payload().to_string(),
            r#"{"priorityGroup":3}"#
        );

        page.set_text("SeatGeek checkout is always secure and encrypted.");

        // Drain until the new classification shows up.
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            assert!(Instant::now() < deadline, "checkout priority never reported");
            let envelope = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("tick within 2s")
                .unwrap();
            if envelope.action.payload().to_string() == r#"{"priorityGroup":8}"# {
                break;
            }
        }

        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stops_when_the_page_goes_away() {
        let bus = test_bus();
        let mut rx = bus.subscribe();

        let page = InMemoryPage::with_text("https://seatgeek.com/x", "You're in line!");
        let handle = PageMonitor::new(
            Arc::new(page.clone()),
            PrioritySnapshot::default(),
            bus.clone(),
            fast_config(),
        )
        .start();

        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within 2s")
            .unwrap();

        page.close();
        time::sleep(Duration::from_millis(100)).await;
        while rx.try_recv().is_ok() {}
        time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(rx.try_recv().unwrap_err(), TryRecvError::Empty));

        drop(handle);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dropping_the_handle_stops_the_loop() {
        let bus = test_bus();
        let mut rx = bus.subscribe();

        let page = InMemoryPage::with_text("https://seatgeek.com/x", "You're in line!");
        let handle = PageMonitor::new(
            Arc::new(page),
            PrioritySnapshot::default(),
            bus.clone(),
            fast_config(),
        )
        .start();

        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("tick within 2s")
            .unwrap();

        drop(handle);
        time::sleep(Duration::from_millis(100)).await;
        while rx.try_recv().is_ok() {}
        time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(rx.try_recv().unwrap_err(), TryRecvError::Empty));
    }
}
