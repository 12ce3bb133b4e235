//! Monotonically sequenced run events.

mod bus;

pub use bus::{Event, EventBus};
