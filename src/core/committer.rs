use crate::core::overlap::{overlapping, OverlapIndex};
use crate::core::{within, CallOptions, BOOKING_STORE, TABLE_DIRECTORY};
use crate::domain::model::{Booking, BookingId, ProposedBooking};
use crate::domain::ports::{BookingStore, Clock, TableDirectory};
use crate::utils::error::{BookingError, Result, StoreError, ValidationRule};
use crate::utils::validation::validate_proposal;
use std::sync::Arc;

/// Turns a proposed slot into a persisted booking, or reports why it cannot.
///
/// The overlap re-check here gives callers a fast, specific `Conflict`. The
/// guarantee itself comes from [`BookingStore::insert_booking`], which checks
/// and writes as one step, so two committers that both pass the re-check
/// still cannot double-book a table.
#[derive(Clone)]
pub struct BookingCommitter {
    directory: Arc<dyn TableDirectory>,
    store: Arc<dyn BookingStore>,
    overlap: OverlapIndex,
    clock: Arc<dyn Clock>,
}

impl BookingCommitter {
    pub fn new(
        directory: Arc<dyn TableDirectory>,
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            overlap: OverlapIndex::new(store.clone()),
            store,
            clock,
        }
    }

    pub async fn commit(&self, proposal: ProposedBooking, options: &CallOptions) -> Result<Booking> {
        validate_proposal(&proposal, self.clock.today()).inspect_err(|rule| {
            tracing::info!(venue = %proposal.venue_id, table = %proposal.table_id, %rule, "slot is not valid");
        })?;

        self.check_table(&proposal, options).await?;

        let conflict = || BookingError::Conflict {
            table_id: proposal.table_id,
            date: proposal.date,
        };

        let existing = self
            .overlap
            .bookings_for_tables_on_date(&proposal.venue_id, &[proposal.table_id], proposal.date, options)
            .await?;
        if let Some(clash) = overlapping(&existing, proposal.table_id, &proposal.window).next() {
            tracing::info!(
                venue = %proposal.venue_id,
                table = %proposal.table_id,
                existing = %clash.id,
                "requested booking slot is not free"
            );
            return Err(conflict());
        }

        let inserted = within(BOOKING_STORE, options, self.store.insert_booking(proposal.clone())).await?;
        match inserted {
            Ok(booking) => {
                tracing::info!(
                    booking = %booking.id,
                    venue = %booking.venue_id,
                    table = %booking.table_id,
                    window = %booking.window,
                    "booking created"
                );
                Ok(booking)
            }
            Err(StoreError::Exclusion { existing }) => {
                tracing::info!(
                    venue = %proposal.venue_id,
                    table = %proposal.table_id,
                    %existing,
                    "lost commit race"
                );
                Err(conflict())
            }
            Err(e) => {
                tracing::error!(venue = %proposal.venue_id, error = %e, "could not create booking");
                Err(BookingError::unavailable(BOOKING_STORE, e.to_string()))
            }
        }
    }

    /// The proposed table must still exist and still seat the party.
    async fn check_table(&self, proposal: &ProposedBooking, options: &CallOptions) -> Result<()> {
        let table = within(
            TABLE_DIRECTORY,
            options,
            self.directory.get_table(&proposal.venue_id, proposal.table_id),
        )
        .await?
        .map_err(|e| {
            tracing::error!(venue = %proposal.venue_id, table = %proposal.table_id, error = %e, "could not find table");
            BookingError::unavailable(TABLE_DIRECTORY, e.to_string())
        })?
        .ok_or(ValidationRule::UnknownTable(proposal.table_id))?;

        if !table.seats(proposal.party_size) {
            return Err(ValidationRule::TableTooSmall {
                table_id: table.id,
                capacity: table.capacity,
                party_size: proposal.party_size,
            }
            .into());
        }
        Ok(())
    }

    pub async fn cancel(&self, booking_id: BookingId, options: &CallOptions) -> Result<()> {
        let removed = within(BOOKING_STORE, options, self.store.delete_bookings(&[booking_id]))
            .await?
            .map_err(|e| {
                tracing::error!(booking = %booking_id, error = %e, "could not delete booking");
                BookingError::unavailable(BOOKING_STORE, e.to_string())
            })?;

        if removed.contains(&booking_id) {
            tracing::info!(booking = %booking_id, "booking cancelled");
            Ok(())
        } else {
            tracing::info!(booking = %booking_id, "cancel of unknown booking");
            Err(BookingError::NotFound { booking_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBookingStore, InMemoryTableDirectory};
    use crate::domain::model::{CustomerId, Table, TableId, TimeWindow, VenueId};
    use crate::domain::ports::FixedClock;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn committer(store: Arc<InMemoryBookingStore>) -> BookingCommitter {
        let directory = InMemoryTableDirectory::new();
        directory.insert_tables(
            VenueId::new("hop-and-vine"),
            vec![Table::new(1, "small table", 2), Table::new(2, "big table", 6)],
        );
        BookingCommitter::new(
            Arc::new(directory),
            store,
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 5, 30).unwrap())),
        )
    }

    fn proposal(table: u32, people: u32) -> ProposedBooking {
        ProposedBooking {
            venue_id: VenueId::new("hop-and-vine"),
            customer_id: CustomerId::new("test@test.test"),
            table_id: TableId(table),
            party_size: people,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            window: TimeWindow::new(
                Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_table_without_capacity_is_invalid() {
        let store = Arc::new(InMemoryBookingStore::new());
        let err = committer(store.clone())
            .commit(proposal(1, 4), &CallOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BookingError::InvalidRequest(ValidationRule::TableTooSmall {
                table_id: TableId(1),
                capacity: 2,
                party_size: 4,
            })
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_table_is_invalid() {
        let store = Arc::new(InMemoryBookingStore::new());
        let err = committer(store)
            .commit(proposal(9, 2), &CallOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::InvalidRequest(ValidationRule::UnknownTable(TableId(9))));
    }

    #[tokio::test]
    async fn test_commit_then_cancel() {
        let store = Arc::new(InMemoryBookingStore::new());
        let committer = committer(store.clone());
        let options = CallOptions::default();

        let booking = committer.commit(proposal(2, 4), &options).await.unwrap();
        assert_eq!(booking.table_id, TableId(2));
        assert_eq!(store.len(), 1);

        committer.cancel(booking.id, &options).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(
            committer.cancel(booking.id, &options).await,
            Err(BookingError::NotFound { booking_id: booking.id })
        );
    }
}
