//! Page state classification from visible page text.
//!
//! This is the single source of truth for the phrases that identify each
//! stage of the SeatGeek order flow. Matching is a case-sensitive substring
//! search over whatever text the page currently shows.

use gatewatch_types::PageState;
use tracing::trace;

/// Phrases shown while a queue is active.
const QUEUE_PHRASES: &[&str] = &[
    "This page is popular right now so a queue has formed",
    "You're in line!",
];

/// Phrases shown on an event listing page.
const EVENT_PHRASES: &[&str] = &["listings", "Box office & resale"];

/// Phrases shown during checkout.
const CHECKOUT_PHRASES: &[&str] = &[
    "Tickets will be delivered to the email address provided below.",
    "SeatGeek checkout is always secure and encrypted.",
    "We sell resale tickets. Resale tickets may be above or below face value.",
];

/// Phrases shown in a pre-sale waiting room.
const WAITING_ROOM_PHRASES: &[&str] = &["You're in the waiting room!"];

/// Classifies visible page text into a page state.
///
/// Earlier groups win when a page shows phrases from more than one group.
/// Queue pages keep the underlying event text visible, so the queue check
/// runs first. Returns `None` when no phrase matches.
pub fn classify_page(text: &str) -> Option<PageState> {
    let groups = [
        (PageState::Queue, QUEUE_PHRASES),
        (PageState::EventListing, EVENT_PHRASES),
        (PageState::Checkout, CHECKOUT_PHRASES),
        (PageState::WaitingRoom, WAITING_ROOM_PHRASES),
    ];

    for (state, phrases) in groups {
        if let Some(phrase) = phrases.iter().find(|p| text.contains(**p)) {
            trace!(target: "gatewatch::classify", "Matched {:?} on {:?}", state, phrase);
            return Some(state);
        }
    }
    None
}
