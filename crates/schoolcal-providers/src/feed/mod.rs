//! HTTP `.ics` feed provider.
//!
//! Each school publishes its calendar as a plain iCalendar file. The
//! [`FeedProvider`] downloads it with reqwest and parses it with the
//! `icalendar` crate.
//!
//! # Example
//!
//! ```ignore
//! use schoolcal_providers::feed::{FeedConfig, FeedProvider};
//!
//! let provider = FeedProvider::new(FeedConfig::default())?;
//! let result = provider.fetch_events(&school).await?;
//! ```

mod client;
mod config;
mod ics;
mod provider;

pub use config::FeedConfig;
pub use ics::parse_ics_content;
pub use provider::FeedProvider;
