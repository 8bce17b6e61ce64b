use crate::domain::model::{Booking, BookingFilter, BookingId, ProposedBooking, Table, TableId, VenueId};
use crate::utils::error::{DirectoryError, StoreError};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

/// Source of a venue's tables.
#[async_trait]
pub trait TableDirectory: Send + Sync {
    /// Tables at `venue_id` seating at least `min_capacity`. Order is not relied upon.
    async fn list_tables_with_capacity(
        &self,
        venue_id: &VenueId,
        min_capacity: u32,
    ) -> Result<Vec<Table>, DirectoryError>;

    async fn get_table(
        &self,
        venue_id: &VenueId,
        table_id: TableId,
    ) -> Result<Option<Table>, DirectoryError>;
}

/// Owner of persisted bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn query_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;

    /// Atomically inserts `booking` unless it overlaps an existing booking on the
    /// same venue, table and date, in which case `StoreError::Exclusion` is
    /// returned and nothing is written.
    async fn insert_booking(&self, booking: ProposedBooking) -> Result<Booking, StoreError>;

    /// Removes the given bookings and returns the ids that actually existed.
    async fn delete_bookings(&self, ids: &[BookingId]) -> Result<Vec<BookingId>, StoreError>;

    async fn bookings_on_date(
        &self,
        venue_id: &VenueId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
