//! Data models for the portfolio stream.
//!
//! ## Submodules
//!
//! - [`update`]: Decoding and validation of server messages ([`PortfolioUpdate`])
//! - [`series`]: The bounded chart series ([`BoundedSeries`], [`SeriesPoint`])
//! - [`summary`]: Summary card values and their formatting ([`SummarySnapshot`])
//! - [`recency`]: "Just now" / "N minutes ago" labels
//!
//! ## Data Flow
//!
//! ```text
//! event data (raw JSON)
//!        │
//!        ▼
//! ServerMessage::parse()
//!        │
//!        ├──▶ PortfolioUpdate ──▶ BoundedSeries::push() (chart)
//!        │                  └──▶ SummarySnapshot::from_update() (cards)
//!        │
//!        └──▶ ServerMessage::Error (status bar)
//! ```

pub mod recency;
pub mod series;
pub mod summary;
pub mod update;

pub use series::{BoundedSeries, SeriesPoint, SERIES_CAPACITY};
pub use summary::{SummarySnapshot, Tone};
pub use update::{PortfolioUpdate, ServerMessage, UpdateError};
