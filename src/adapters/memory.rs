use crate::domain::model::{Booking, BookingFilter, BookingId, ProposedBooking, Table, TableId, VenueId};
use crate::domain::ports::{BookingStore, TableDirectory};
use crate::utils::error::{DirectoryError, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

#[derive(Debug, Default)]
pub struct InMemoryTableDirectory {
    venues: RwLock<HashMap<VenueId, Vec<Table>>>,
}

impl InMemoryTableDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_venues(venues: HashMap<VenueId, Vec<Table>>) -> Self {
        Self {
            venues: RwLock::new(venues),
        }
    }

    /// Adds tables to a venue, replacing any with the same id.
    pub fn insert_tables(&self, venue_id: VenueId, tables: Vec<Table>) {
        let mut venues = self.venues.write().unwrap_or_else(|e| e.into_inner());
        let existing = venues.entry(venue_id).or_default();
        for table in tables {
            existing.retain(|t| t.id != table.id);
            existing.push(table);
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<VenueId, Vec<Table>>>, DirectoryError> {
        self.venues.read().map_err(|_| DirectoryError::Backend {
            message: "table directory lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl TableDirectory for InMemoryTableDirectory {
    async fn list_tables_with_capacity(
        &self,
        venue_id: &VenueId,
        min_capacity: u32,
    ) -> Result<Vec<Table>, DirectoryError> {
        let venues = self.read()?;
        Ok(venues
            .get(venue_id)
            .map(|tables| tables.iter().filter(|t| t.seats(min_capacity)).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_table(
        &self,
        venue_id: &VenueId,
        table_id: TableId,
    ) -> Result<Option<Table>, DirectoryError> {
        let venues = self.read()?;
        Ok(venues
            .get(venue_id)
            .and_then(|tables| tables.iter().find(|t| t.id == table_id).cloned()))
    }
}

#[derive(Debug, Default)]
struct Ledger {
    last_id: u64,
    bookings: BTreeMap<BookingId, Booking>,
}

impl Ledger {
    /// Exclusion check and write in one step; callers hold the ledger lock.
    fn insert(&mut self, proposal: ProposedBooking) -> Result<Booking, StoreError> {
        if let Some(clash) = self.bookings.values().find(|b| b.clashes_with(&proposal)) {
            return Err(StoreError::Exclusion { existing: clash.id });
        }

        self.last_id += 1;
        let booking = proposal.into_booking(BookingId(self.last_id));
        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }
}

/// Process-local booking store. The ledger lock is never held across an
/// await, so a dropped caller cannot leave a half-written insert.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    ledger: Mutex<Ledger>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ledger
            .lock()
            .map(|ledger| ledger.bookings.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored booking in id order.
    pub fn all(&self) -> Vec<Booking> {
        self.ledger
            .lock()
            .map(|ledger| ledger.bookings.values().cloned().collect())
            .unwrap_or_default()
    }

    fn ledger(&self) -> Result<std::sync::MutexGuard<'_, Ledger>, StoreError> {
        self.ledger.lock().map_err(|_| StoreError::Backend {
            message: "booking ledger lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn query_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let ledger = self.ledger()?;
        Ok(ledger
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn insert_booking(&self, booking: ProposedBooking) -> Result<Booking, StoreError> {
        self.ledger()?.insert(booking)
    }

    async fn delete_bookings(&self, ids: &[BookingId]) -> Result<Vec<BookingId>, StoreError> {
        let mut ledger = self.ledger()?;
        Ok(ids
            .iter()
            .filter(|id| ledger.bookings.remove(id).is_some())
            .copied()
            .collect())
    }

    async fn bookings_on_date(
        &self,
        venue_id: &VenueId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, StoreError> {
        let ledger = self.ledger()?;
        Ok(ledger
            .bookings
            .values()
            .filter(|b| &b.venue_id == venue_id && b.date == date)
            .cloned()
            .collect())
    }
}
