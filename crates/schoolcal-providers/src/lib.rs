//! CalendarProvider trait and the school feed provider.
//!
//! This crate is the fetch side of the calendar cache:
//!
//! - [`CalendarProvider`] - The trait the cache fetches through
//! - [`RawEvent`] - Feed entries before normalization
//! - [`normalize_event`] - Converts raw entries into [`SchoolEvent`](schoolcal_core::SchoolEvent)
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Architecture
//!
//! ```text
//!    school .ics feed
//!          │
//!          ▼
//!   ┌──────────────┐
//!   │ FeedProvider │  CalendarProvider
//!   └──────┬───────┘
//!          ▼
//!   ┌──────────────┐
//!   │   RawEvent   │
//!   └──────┬───────┘
//!          ▼ normalize_event()
//!   ┌──────────────┐
//!   │ SchoolEvent  │
//!   └──────────────┘
//! ```

pub mod error;
#[cfg(feature = "feed")]
pub mod feed;
pub mod normalize;
pub mod provider;
pub mod raw_event;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{normalize_event, normalize_events};
pub use provider::{BoxFuture, CalendarProvider, ErrorProvider, FetchResult};
pub use raw_event::{RawEvent, RawEventTime};
