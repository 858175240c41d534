//! Pages and the preloader attachment surface.

use crate::{ActionBus, HostError, Result};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// A browser page the host can hand to preloaders.
pub trait Page: Send + Sync {
    /// Full page URL.
    fn url(&self) -> String;
    /// The tab hosting this page.
    fn tab_id(&self) -> Uuid;
    /// True only for the top-level frame.
    fn is_main_frame(&self) -> bool;
    /// The page's currently visible text.
    fn visible_text(&self) -> Result<String>;
}

/// What a preloader receives when the host attaches it to a page.
#[derive(Clone)]
pub struct PageContext {
    /// The page being attached.
    pub page: Arc<dyn Page>,
    /// Dispatch surface into the host.
    pub actions: ActionBus,
    /// Preference values captured at page load.
    pub preferences: BTreeMap<String, String>,
}

/// Background work a preloader left running on a page.
///
/// The host keeps attachments with the page session; dropping them (page
/// unload, tab close) stops whatever they own.
pub struct PageAttachment {
    guards: Vec<Box<dyn Any + Send>>,
}

impl PageAttachment {
    /// An attachment with nothing running.
    pub fn empty() -> Self {
        Self { guards: Vec::new() }
    }

    /// An attachment owning a single guard.
    pub fn from_guard(guard: impl Any + Send) -> Self {
        Self {
            guards: vec![Box::new(guard)],
        }
    }

    pub fn push(&mut self, guard: impl Any + Send) {
        self.guards.push(Box::new(guard));
    }

    /// True when no background work was started.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Scriptable page for tests and embedding without a real browser.
#[derive(Clone)]
pub struct InMemoryPage {
    url: String,
    tab_id: Uuid,
    main_frame: bool,
    text: Arc<RwLock<Option<String>>>,
}

impl InMemoryPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tab_id: Uuid::new_v4(),
            main_frame: true,
            text: Arc::new(RwLock::new(Some(String::new()))),
        }
    }

    pub fn with_text(url: impl Into<String>, text: impl Into<String>) -> Self {
        let page = Self::new(url);
        page.set_text(text);
        page
    }

    /// Marks this page as a subframe.
    pub fn subframe(mut self) -> Self {
        self.main_frame = false;
        self
    }

    /// Replaces the visible text (the page re-rendered).
    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.write().unwrap() = Some(text.into());
    }

    /// Simulates the page going away; reads fail afterwards.
    pub fn close(&self) {
        *self.text.write().unwrap() = None;
    }
}

impl Page for InMemoryPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn tab_id(&self) -> Uuid {
        self.tab_id
    }

    fn is_main_frame(&self) -> bool {
        self.main_frame
    }

    fn visible_text(&self) -> Result<String> {
        self.text.read().unwrap().clone().ok_or(HostError::PageGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_page_text_updates() {
        let page = InMemoryPage::with_text("https://seatgeek.com/x", "You're in line!");
        assert_eq!(page.visible_text().unwrap(), "You're in line!");

        page.set_text("Checkout");
        assert_eq!(page.visible_text().unwrap(), "Checkout");
    }

    #[test]
    fn test_closed_page_reads_fail() {
        let page = InMemoryPage::new("https://seatgeek.com/x");
        page.close();
        assert!(matches!(
            page.visible_text().unwrap_err(),
            HostError::PageGone
        ));
    }

    #[test]
    fn test_subframe_flag() {
        let page = InMemoryPage::new("https://seatgeek.com/x").subframe();
        assert!(!page.is_main_frame());
        assert!(InMemoryPage::new("https://seatgeek.com/x").is_main_frame());
    }
}
