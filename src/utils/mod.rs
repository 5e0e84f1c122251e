//! Utility Module
//!
//! - [`time`]: clock abstraction and the restartable [`Timer`] used by the
//!   reconciler's scan throttle.

pub mod time;

pub use time::{Clock, ManualClock, SystemClock, Timer};
