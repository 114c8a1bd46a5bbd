//! Position feed - latest GPS fix shared with the sampling loop.
//!
//! A background [`PositionFeedReader`] drains a streaming [`PositionSource`]
//! (normally gpsd) and keeps the most recent complete [`PositionFix`] in a
//! [`SharedPosition`] slot. The sampling loop reads it through
//! [`PositionProvider::snapshot`], which never blocks on the receiver.
//!
//! # Consistency
//!
//! A fix is replaced as a whole value under a lock. Readers can never pair a
//! latitude from one update with a longitude from another.
//!
//! # Usage
//!
//! ```ignore
//! use crowdbike::position::{
//!     GpsdConfig, GpsdSource, PositionFeedReader, PositionFeedReaderConfig, SharedPosition,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! let shared = SharedPosition::new();
//! let cancellation = CancellationToken::new();
//! let reader = PositionFeedReader::new(
//!     GpsdSource::new(GpsdConfig::default()),
//!     shared.clone(),
//!     PositionFeedReaderConfig::default(),
//! );
//! let handle = reader.spawn(cancellation.clone());
//!
//! let fix = shared.snapshot();
//! ```

mod error;
pub mod gpsd;
mod provider;
mod reader;
mod source;
mod state;

pub use error::PositionError;
pub use gpsd::{GpsdConfig, GpsdSource};
pub use provider::{PositionProvider, SharedPosition};
pub use reader::{PositionFeedReader, PositionFeedReaderConfig, ReaderStats};
pub use source::PositionSource;
pub use state::{FixMode, PositionFix};
