use crate::core::capacity::CapacityFilter;
use crate::core::overlap::{overlapping, OverlapIndex};
use crate::core::CallOptions;
use crate::domain::model::{Booking, BookingEnquiry, ProposedBooking, Table, TableId, TimeWindow};
use crate::domain::ports::Clock;
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::validate_enquiry;
use std::sync::Arc;

/// First table, in the given order, with no booking overlapping `window`.
///
/// `tables` must already be in candidate order; the capacity filter sorts by id.
pub fn first_free_table<'a>(
    tables: &'a [Table],
    bookings: &[Booking],
    window: &TimeWindow,
) -> Option<&'a Table> {
    tables
        .iter()
        .find(|table| overlapping(bookings, table.id, window).next().is_none())
}

/// Proposes at most one (table, window) pairing for an enquiry.
#[derive(Clone)]
pub struct SlotMatcher {
    capacity: CapacityFilter,
    overlap: OverlapIndex,
    clock: Arc<dyn Clock>,
}

impl SlotMatcher {
    pub fn new(capacity: CapacityFilter, overlap: OverlapIndex, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity,
            overlap,
            clock,
        }
    }

    pub async fn match_slot(
        &self,
        enquiry: &BookingEnquiry,
        options: &CallOptions,
    ) -> Result<ProposedBooking> {
        validate_enquiry(enquiry, self.clock.today()).inspect_err(|rule| {
            tracing::info!(venue = %enquiry.venue_id, %rule, "invalid enquiry");
        })?;

        let no_slots = || BookingError::NoAvailableSlots {
            venue_id: enquiry.venue_id.clone(),
            party_size: enquiry.party_size,
        };

        let tables = self
            .capacity
            .find_tables_with_capacity(&enquiry.venue_id, enquiry.party_size, options)
            .await?;
        if tables.is_empty() {
            tracing::info!(venue = %enquiry.venue_id, party_size = enquiry.party_size, "no tables with capacity");
            return Err(no_slots());
        }

        let table_ids: Vec<TableId> = tables.iter().map(|t| t.id).collect();
        let bookings = self
            .overlap
            .bookings_for_tables_on_date(&enquiry.venue_id, &table_ids, enquiry.date, options)
            .await?;

        match first_free_table(&tables, &bookings, &enquiry.window) {
            Some(table) => {
                tracing::info!(
                    venue = %enquiry.venue_id,
                    table = %table.id,
                    window = %enquiry.window,
                    "slot proposed"
                );
                Ok(ProposedBooking::for_table(enquiry, table.id))
            }
            None => {
                tracing::info!(
                    venue = %enquiry.venue_id,
                    candidates = tables.len(),
                    window = %enquiry.window,
                    "no available slots"
                );
                Err(no_slots())
            }
        }
    }
}
