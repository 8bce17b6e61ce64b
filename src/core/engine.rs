use crate::config::EngineConfig;
use crate::core::capacity::CapacityFilter;
use crate::core::committer::BookingCommitter;
use crate::core::matcher::SlotMatcher;
use crate::core::overlap::OverlapIndex;
use crate::core::CallOptions;
use crate::domain::model::{Booking, BookingEnquiry, BookingId, ProposedBooking, VenueId};
use crate::domain::ports::{BookingStore, Clock, SystemClock, TableDirectory};
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;

/// Entry point for callers: slot matching, commits, cancellations and listings.
pub struct BookingEngine {
    matcher: SlotMatcher,
    committer: BookingCommitter,
    overlap: OverlapIndex,
    defaults: CallOptions,
}

impl BookingEngine {
    pub fn new(
        directory: Arc<dyn TableDirectory>,
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        defaults: CallOptions,
    ) -> Self {
        let overlap = OverlapIndex::new(store.clone());
        let matcher = SlotMatcher::new(
            CapacityFilter::new(directory.clone()),
            overlap.clone(),
            clock.clone(),
        );
        let committer = BookingCommitter::new(directory, store, clock);

        Self {
            matcher,
            committer,
            overlap,
            defaults,
        }
    }

    /// Engine on the system clock with the configured call timeout.
    pub fn from_config(
        config: &EngineConfig,
        directory: Arc<dyn TableDirectory>,
        store: Arc<dyn BookingStore>,
    ) -> Self {
        Self::new(
            directory,
            store,
            Arc::new(SystemClock),
            CallOptions::with_timeout(config.call_timeout),
        )
    }

    /// Options used when the caller has no timeout of its own.
    pub fn default_options(&self) -> CallOptions {
        self.defaults
    }

    pub async fn match_slot(
        &self,
        enquiry: &BookingEnquiry,
        options: &CallOptions,
    ) -> Result<ProposedBooking> {
        tracing::info!(
            venue = %enquiry.venue_id,
            date = %enquiry.date,
            window = %enquiry.window,
            party_size = enquiry.party_size,
            "match slot"
        );
        self.matcher.match_slot(enquiry, options).await
    }

    pub async fn commit_booking(
        &self,
        proposal: ProposedBooking,
        options: &CallOptions,
    ) -> Result<Booking> {
        tracing::info!(
            venue = %proposal.venue_id,
            table = %proposal.table_id,
            window = %proposal.window,
            party_size = proposal.party_size,
            "commit booking"
        );
        self.committer.commit(proposal, options).await
    }

    /// Commits a proposal supplied as JSON, e.g. one printed by an earlier match.
    pub async fn commit_booking_json(&self, raw: &str, options: &CallOptions) -> Result<Booking> {
        let proposal = ProposedBooking::from_json(raw).inspect_err(|rule| {
            tracing::info!(%rule, "proposal rejected before commit");
        })?;
        self.commit_booking(proposal, options).await
    }

    pub async fn cancel_booking(&self, booking_id: BookingId, options: &CallOptions) -> Result<()> {
        tracing::info!(booking = %booking_id, "cancel booking");
        self.committer.cancel(booking_id, options).await
    }

    /// Every booking at the venue on `date`, ordered by start time then table.
    pub async fn bookings_on_date(
        &self,
        venue_id: &VenueId,
        date: NaiveDate,
        options: &CallOptions,
    ) -> Result<Vec<Booking>> {
        self.overlap.bookings_on_date(venue_id, date, options).await
    }
}
