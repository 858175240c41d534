//! Order-flow states recognized on ticket-shop pages.

use serde::{Deserialize, Serialize};

use crate::PrefKey;

/// The state a page's visible text classifies into.
///
/// Classification yields `Option<PageState>`; `None` means no known
/// phrase was found and the tab reports priority group 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// An active queue (virtual line) page.
    Queue,
    /// An event page showing ticket listings.
    EventListing,
    /// The checkout flow.
    Checkout,
    /// A pre-sale waiting room.
    WaitingRoom,
}

impl PageState {
    /// The preference holding this state's priority group.
    pub fn pref_key(self) -> PrefKey {
        match self {
            PageState::Queue => PrefKey::QueuePriority,
            PageState::EventListing => PrefKey::EventPriority,
            PageState::Checkout => PrefKey::CheckoutPriority,
            PageState::WaitingRoom => PrefKey::WaitingRoomPriority,
        }
    }
}
