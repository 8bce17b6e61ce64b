pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{EngineConfig, TomlConfig};

pub use core::{capacity::CapacityFilter, committer::BookingCommitter, matcher::SlotMatcher};
pub use core::{engine::BookingEngine, overlap::OverlapIndex, CallOptions};
pub use domain::model::{
    Booking, BookingEnquiry, BookingFilter, BookingId, CustomerId, ProposedBooking, Table, TableId,
    TimeWindow, VenueId,
};
pub use utils::error::{BookingError, Result, ValidationRule};
