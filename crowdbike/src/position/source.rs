//! Streaming position source abstraction.

use std::future::Future;

use super::error::PositionError;
use super::state::PositionFix;

/// A stream of position updates.
///
/// Implementations block (asynchronously) until the next complete update is
/// available. A report without a usable solution is returned as
/// [`PositionFix::no_fix`], not as an error; errors are reserved for stream
/// failures such as a lost connection.
pub trait PositionSource: Send {
    /// Wait for the next update from the receiver.
    fn next_update(&mut self) -> impl Future<Output = Result<PositionFix, PositionError>> + Send;
}
