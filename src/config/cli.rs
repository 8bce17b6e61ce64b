use crate::domain::model::{BookingEnquiry, CustomerId, TimeWindow, VenueId};
use crate::utils::error::ValidationRule;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "booking-core")]
#[command(about = "Match, commit and cancel restaurant table bookings")]
pub struct CliConfig {
    /// Path to a TOML configuration file; the environment is used when absent
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding tables.json and bookings.json
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Per-call timeout for the table directory and booking store, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Propose a table for an enquiry without booking it
    Match(EnquiryArgs),
    /// Propose a table and commit it straight away
    Book(EnquiryArgs),
    /// Commit a proposal previously printed by `match`
    Commit {
        /// JSON file containing the proposal, or `-` for stdin
        #[arg(long, default_value = "-")]
        proposal: String,
    },
    /// Cancel a booking by id
    Cancel {
        #[arg(long)]
        id: u64,
    },
    /// List a venue's bookings on a date
    List {
        #[arg(long)]
        venue: String,
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct EnquiryArgs {
    #[arg(long)]
    pub venue: String,

    /// Customer email
    #[arg(long)]
    pub customer: String,

    #[arg(long)]
    pub party: u32,

    /// Booking date, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,

    /// Start time (UTC), HH:MM
    #[arg(long, value_parser = parse_time_of_day)]
    pub from: NaiveTime,

    /// End time (UTC), HH:MM
    #[arg(long, value_parser = parse_time_of_day)]
    pub to: NaiveTime,
}

impl EnquiryArgs {
    /// Builds the enquiry; both times are taken on `date`.
    pub fn to_enquiry(&self) -> Result<BookingEnquiry, ValidationRule> {
        let starts_at = Utc.from_utc_datetime(&self.date.and_time(self.from));
        let ends_at = Utc.from_utc_datetime(&self.date.and_time(self.to));

        Ok(BookingEnquiry {
            venue_id: VenueId::new(self.venue.clone()),
            customer_id: CustomerId::new(self.customer.clone()),
            party_size: self.party,
            date: self.date,
            window: TimeWindow::new(starts_at, ends_at)?,
        })
    }
}

pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM, got '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert!(parse_time_of_day("6pm").is_err());
    }

    #[test]
    fn test_parse_match_command() {
        let cli = CliConfig::try_parse_from([
            "booking-core",
            "--data-dir",
            "/tmp/venue",
            "match",
            "--venue",
            "hop-and-vine",
            "--customer",
            "test@test.test",
            "--party",
            "2",
            "--date",
            "2024-06-01",
            "--from",
            "18:00",
            "--to",
            "20:00",
        ])
        .unwrap();

        let Command::Match(args) = cli.command else {
            panic!("expected match command");
        };
        let enquiry = args.to_enquiry().unwrap();
        assert_eq!(enquiry.party_size, 2);
        assert_eq!(enquiry.window.span(), chrono::Duration::hours(2));
    }

    #[test]
    fn test_overlong_window_is_rejected() {
        let args = EnquiryArgs {
            venue: "hop-and-vine".to_string(),
            customer: "test@test.test".to_string(),
            party: 2,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            from: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            to: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        };
        assert_eq!(args.to_enquiry(), Err(ValidationRule::WindowTooLong));
    }
}
