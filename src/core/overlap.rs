use crate::core::{within, CallOptions, BOOKING_STORE};
use crate::domain::model::{Booking, BookingFilter, TableId, TimeWindow, VenueId};
use crate::domain::ports::BookingStore;
use crate::utils::error::{BookingError, Result, ValidationRule};
use chrono::NaiveDate;
use std::sync::Arc;

/// Bookings on `table_id` whose window overlaps `window`.
pub fn overlapping<'a>(
    bookings: &'a [Booking],
    table_id: TableId,
    window: &'a TimeWindow,
) -> impl Iterator<Item = &'a Booking> + 'a {
    bookings
        .iter()
        .filter(move |b| b.table_id == table_id && b.window.overlaps(window))
}

/// Read-side view over the booking store, scoped to candidate tables and a date.
#[derive(Clone)]
pub struct OverlapIndex {
    store: Arc<dyn BookingStore>,
}

impl OverlapIndex {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn bookings_for_tables_on_date(
        &self,
        venue_id: &VenueId,
        table_ids: &[TableId],
        date: NaiveDate,
        options: &CallOptions,
    ) -> Result<Vec<Booking>> {
        if table_ids.is_empty() {
            return Err(ValidationRule::NoCandidateTables.into());
        }

        let filter = BookingFilter::new(venue_id.clone(), table_ids.to_vec(), date);
        let mut bookings = within(BOOKING_STORE, options, self.store.query_bookings(&filter))
            .await?
            .map_err(|e| {
                tracing::error!(venue = %venue_id, %date, error = %e, "could not get bookings");
                BookingError::unavailable(BOOKING_STORE, e.to_string())
            })?;

        bookings.retain(|b| filter.matches(b));
        Ok(bookings)
    }

    pub async fn bookings_on_date(
        &self,
        venue_id: &VenueId,
        date: NaiveDate,
        options: &CallOptions,
    ) -> Result<Vec<Booking>> {
        let mut bookings = within(BOOKING_STORE, options, self.store.bookings_on_date(venue_id, date))
            .await?
            .map_err(|e| {
                tracing::error!(venue = %venue_id, %date, error = %e, "could not list bookings");
                BookingError::unavailable(BOOKING_STORE, e.to_string())
            })?;

        bookings.sort_by_key(|b| (b.window.starts_at(), b.table_id, b.id));
        Ok(bookings)
    }
}
