//! Shared types for the Gatewatch plugin and its host surface.

mod action;
mod page;
mod prefs;
mod priority;
mod widget;

pub use action::*;
pub use page::*;
pub use prefs::*;
pub use priority::*;
pub use widget::*;
