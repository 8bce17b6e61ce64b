use crate::domain::model::{BookingId, TableId, VenueId, MAX_BOOKING_HOURS};
use chrono::NaiveDate;
use thiserror::Error;

/// The business rule an enquiry or proposal broke.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    #[error("must have positive people")]
    PartySizeNotPositive,

    #[error("customer id cannot be empty")]
    CustomerMissing,

    #[error("venue id cannot be empty")]
    VenueMissing,

    #[error("starts at must be before ends at")]
    WindowNotOrdered,

    #[error("booking can not exceed {} hours", MAX_BOOKING_HOURS)]
    WindowTooLong,

    #[error("date must not be in the past")]
    DateInPast,

    #[error("all times must be on the booking date")]
    WindowOutsideDate,

    #[error("no candidate tables were given")]
    NoCandidateTables,

    #[error("table {0} does not exist")]
    UnknownTable(TableId),

    #[error("table {table_id} seats {capacity}, party of {party_size} requested")]
    TableTooSmall {
        table_id: TableId,
        capacity: u32,
        party_size: u32,
    },

    #[error("proposal is malformed: {0}")]
    MalformedProposal(String),
}

/// Errors surfaced by the slot-matching and commit engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationRule),

    #[error("no available slots at venue {venue_id} for {party_size} people")]
    NoAvailableSlots { venue_id: VenueId, party_size: u32 },

    #[error("table {table_id} is already booked for an overlapping window on {date}")]
    Conflict { table_id: TableId, date: NaiveDate },

    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: &'static str,
        reason: String,
    },

    #[error("booking {booking_id} not found")]
    NotFound { booking_id: BookingId },
}

impl BookingError {
    pub fn unavailable(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::NoAvailableSlots { .. } => "NO_AVAILABLE_SLOTS",
            Self::Conflict { .. } => "CONFLICT",
            Self::Unavailable { .. } => "UNAVAILABLE",
            Self::NotFound { .. } => "NOT_FOUND",
        }
    }

    /// Whether the caller may reasonably try again. The engine itself never does.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Conflict { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "Correct the request and submit it again",
            Self::NoAvailableSlots { .. } => "Try a different time, date or party size",
            Self::Conflict { .. } => "The slot was taken; request a new slot and confirm again",
            Self::Unavailable { .. } => "A backing service is unreachable; retry later",
            Self::NotFound { .. } => "Check the booking id",
        }
    }
}

/// Table Directory failures.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response status {status}")]
    Status { status: u16 },

    #[error("directory error: {message}")]
    Backend { message: String },
}

/// Booking Store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The insert would overlap an existing booking on the same table and date.
    #[error("overlaps existing booking {existing}")]
    Exclusion { existing: BookingId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store error: {message}")]
    Backend { message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_messages_are_actionable() {
        let err = BookingError::from(ValidationRule::WindowTooLong);
        assert_eq!(err.code(), "INVALID_REQUEST");
        assert_eq!(
            err.to_string(),
            "invalid request: booking can not exceed 12 hours"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BookingError::unavailable("booking store", "timed out").is_retryable());
        assert!(BookingError::Conflict {
            table_id: TableId(1),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
        .is_retryable());
        assert!(!BookingError::from(ValidationRule::DateInPast).is_retryable());
        assert!(!BookingError::NotFound {
            booking_id: BookingId(9)
        }
        .is_retryable());
    }
}
