pub mod capacity;
pub mod committer;
pub mod engine;
pub mod matcher;
pub mod overlap;

pub use crate::domain::model::{Booking, BookingEnquiry, ProposedBooking, Table, TimeWindow};
pub use crate::domain::ports::{BookingStore, Clock, TableDirectory};
pub use crate::utils::error::{BookingError, Result};

use std::future::Future;
use std::time::Duration;

pub(crate) const TABLE_DIRECTORY: &str = "table directory";
pub(crate) const BOOKING_STORE: &str = "booking store";

/// Per-call settings supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Upper bound on each collaborator call made while serving the request.
    pub timeout: Duration,
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Runs a collaborator call under the caller's timeout. Elapsed calls become
/// `Unavailable`; nothing is retried here.
pub(crate) async fn within<F: Future>(
    collaborator: &'static str,
    options: &CallOptions,
    call: F,
) -> Result<F::Output> {
    tokio::time::timeout(options.timeout, call).await.map_err(|_| {
        tracing::warn!(collaborator, timeout = ?options.timeout, "collaborator call timed out");
        BookingError::unavailable(collaborator, format!("timed out after {:?}", options.timeout))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_passes_output_through() {
        let options = CallOptions::with_timeout(Duration::MAX);
        let out = within(BOOKING_STORE, &options, async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_within_times_out() {
        let options = CallOptions::with_timeout(Duration::from_millis(20));
        let err = within(TABLE_DIRECTORY, &options, std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Unavailable { collaborator: TABLE_DIRECTORY, .. }
        ));
    }
}
