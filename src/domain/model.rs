use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::error::ValidationRule;

/// Longest window a single booking may occupy.
pub const MAX_BOOKING_HOURS: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(pub String);

impl VenueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Customer identity; the customer's email address upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Table identity, unique within a venue. Ordering is the candidate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub capacity: u32,
}

impl Table {
    pub fn new(id: u32, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: TableId(id),
            name: name.into(),
            capacity,
        }
    }

    pub fn seats(&self, party_size: u32) -> bool {
        self.capacity >= party_size
    }
}

/// Half-open interval `[starts_at, ends_at)`.
///
/// Deserialization goes through [`TimeWindow::new`], so a window read from a
/// client or from disk upholds the same invariants as one built in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct TimeWindow {
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawWindow {
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl TryFrom<RawWindow> for TimeWindow {
    type Error = ValidationRule;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.starts_at, raw.ends_at)
    }
}

impl TimeWindow {
    pub fn new(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<Self, ValidationRule> {
        if starts_at >= ends_at {
            return Err(ValidationRule::WindowNotOrdered);
        }
        if ends_at - starts_at > Duration::hours(MAX_BOOKING_HOURS) {
            return Err(ValidationRule::WindowTooLong);
        }
        Ok(Self { starts_at, ends_at })
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn span(&self) -> Duration {
        self.ends_at - self.starts_at
    }

    /// Two windows overlap iff they share an instant. Touching endpoints do not.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.starts_at < other.ends_at && other.starts_at < self.ends_at
    }

    /// Both endpoints fall on `date` (UTC).
    pub fn lies_within(&self, date: NaiveDate) -> bool {
        self.starts_at.date_naive() == date && self.ends_at.date_naive() == date
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.starts_at.format("%Y-%m-%dT%H:%M"),
            self.ends_at.format("%H:%M")
        )
    }
}

/// A customer's request for a table. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEnquiry {
    pub venue_id: VenueId,
    pub customer_id: CustomerId,
    pub party_size: u32,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

/// A slot: the matcher's unconfirmed (table, window) proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedBooking {
    pub venue_id: VenueId,
    pub customer_id: CustomerId,
    pub table_id: TableId,
    pub party_size: u32,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

impl ProposedBooking {
    pub fn for_table(enquiry: &BookingEnquiry, table_id: TableId) -> Self {
        Self {
            venue_id: enquiry.venue_id.clone(),
            customer_id: enquiry.customer_id.clone(),
            table_id,
            party_size: enquiry.party_size,
            date: enquiry.date,
            window: enquiry.window,
        }
    }

    /// Reads a proposal handed back by a client. A window that breaks a
    /// booking rule is reported as that rule rather than as bad JSON.
    pub fn from_json(raw: &str) -> Result<Self, ValidationRule> {
        let raw: RawProposal = serde_json::from_str(raw)
            .map_err(|e| ValidationRule::MalformedProposal(e.to_string()))?;

        Ok(Self {
            venue_id: raw.venue_id,
            customer_id: raw.customer_id,
            table_id: raw.table_id,
            party_size: raw.party_size,
            date: raw.date,
            window: TimeWindow::try_from(raw.window)?,
        })
    }

    pub fn into_booking(self, id: BookingId) -> Booking {
        Booking {
            id,
            venue_id: self.venue_id,
            customer_id: self.customer_id,
            table_id: self.table_id,
            party_size: self.party_size,
            date: self.date,
            window: self.window,
        }
    }
}

#[derive(Deserialize)]
struct RawProposal {
    venue_id: VenueId,
    customer_id: CustomerId,
    table_id: TableId,
    party_size: u32,
    date: NaiveDate,
    window: RawWindow,
}

/// A persisted booking. Immutable; removed only by cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub venue_id: VenueId,
    pub customer_id: CustomerId,
    pub table_id: TableId,
    pub party_size: u32,
    pub date: NaiveDate,
    pub window: TimeWindow,
}

impl Booking {
    /// Same venue, table and date with an overlapping window.
    pub fn clashes_with(&self, proposed: &ProposedBooking) -> bool {
        self.venue_id == proposed.venue_id
            && self.table_id == proposed.table_id
            && self.date == proposed.date
            && self.window.overlaps(&proposed.window)
    }
}

/// Selects the bookings of `table_ids` at `venue_id` on `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFilter {
    pub venue_id: VenueId,
    pub table_ids: Vec<TableId>,
    pub date: NaiveDate,
}

impl BookingFilter {
    pub fn new(venue_id: VenueId, table_ids: Vec<TableId>, date: NaiveDate) -> Self {
        Self {
            venue_id,
            table_ids,
            date,
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        booking.venue_id == self.venue_id
            && booking.date == self.date
            && self.table_ids.contains(&booking.table_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_window_rejects_reversed_and_empty() {
        assert_eq!(
            TimeWindow::new(at(20, 0), at(18, 0)),
            Err(ValidationRule::WindowNotOrdered)
        );
        assert_eq!(
            TimeWindow::new(at(18, 0), at(18, 0)),
            Err(ValidationRule::WindowNotOrdered)
        );
    }

    #[test]
    fn test_window_span_cap() {
        assert!(TimeWindow::new(at(9, 0), at(21, 0)).is_ok());
        assert_eq!(
            TimeWindow::new(at(9, 0), at(22, 0)),
            Err(ValidationRule::WindowTooLong)
        );
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = TimeWindow::new(at(18, 0), at(20, 0)).unwrap();
        let touching = TimeWindow::new(at(20, 0), at(22, 0)).unwrap();
        let inside = TimeWindow::new(at(18, 30), at(19, 30)).unwrap();
        let straddling = TimeWindow::new(at(19, 0), at(21, 0)).unwrap();

        assert!(!a.overlaps(&touching));
        assert!(!touching.overlaps(&a));
        assert!(a.overlaps(&inside));
        assert!(inside.overlaps(&a));
        assert!(a.overlaps(&straddling));
        assert!(a.overlaps(&a));
    }

    #[test]
    fn test_window_deserialization_is_validated() {
        let ok = r#"{"starts_at":"2024-06-01T18:00:00Z","ends_at":"2024-06-01T20:00:00Z"}"#;
        let window: TimeWindow = serde_json::from_str(ok).unwrap();
        assert_eq!(window.span(), Duration::hours(2));

        let reversed = r#"{"starts_at":"2024-06-01T20:00:00Z","ends_at":"2024-06-01T18:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeWindow>(reversed).is_err());
    }

    #[test]
    fn test_lies_within_rejects_midnight_crossing() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let late = TimeWindow::new(
            at(22, 0),
            Utc.with_ymd_and_hms(2024, 6, 2, 1, 0, 0).unwrap(),
        )
        .unwrap();
        assert!(!late.lies_within(date));
        assert!(TimeWindow::new(at(0, 0), at(2, 0)).unwrap().lies_within(date));
    }

    #[test]
    fn test_filter_matches_venue_table_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let booking = Booking {
            id: BookingId(1),
            venue_id: VenueId::new("hop-and-vine"),
            customer_id: CustomerId::new("a@b.c"),
            table_id: TableId(3),
            party_size: 2,
            date,
            window: TimeWindow::new(at(18, 0), at(20, 0)).unwrap(),
        };

        let filter = BookingFilter::new(VenueId::new("hop-and-vine"), vec![TableId(1), TableId(3)], date);
        assert!(filter.matches(&booking));

        let other_venue = BookingFilter::new(VenueId::new("elsewhere"), vec![TableId(3)], date);
        assert!(!other_venue.matches(&booking));

        let other_table = BookingFilter::new(VenueId::new("hop-and-vine"), vec![TableId(1)], date);
        assert!(!other_table.matches(&booking));
    }
}
