//! Core types: school events, event times, day keys, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{School, SchoolEvent};
pub use time::{DAY_KEY_FORMAT, DayKey, EventTime, IntoDay};
pub use tracing::{LogFormat, TracingError, init_tracing};
