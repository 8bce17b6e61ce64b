use crate::domain::model::{BookingEnquiry, CustomerId, ProposedBooking, TimeWindow, VenueId};
use crate::utils::error::{ConfigError, ValidationRule};
use chrono::NaiveDate;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Rules shared by the matcher and the committer, checked in a fixed order so
/// the first broken rule is always the one reported.
fn validate_request(
    venue_id: &VenueId,
    customer_id: &CustomerId,
    party_size: u32,
    date: NaiveDate,
    window: &TimeWindow,
    today: NaiveDate,
) -> Result<(), ValidationRule> {
    if venue_id.as_str().trim().is_empty() {
        return Err(ValidationRule::VenueMissing);
    }

    if customer_id.is_blank() {
        return Err(ValidationRule::CustomerMissing);
    }

    if party_size < 1 {
        return Err(ValidationRule::PartySizeNotPositive);
    }

    if date < today {
        return Err(ValidationRule::DateInPast);
    }

    if !window.lies_within(date) {
        return Err(ValidationRule::WindowOutsideDate);
    }

    Ok(())
}

pub fn validate_enquiry(enquiry: &BookingEnquiry, today: NaiveDate) -> Result<(), ValidationRule> {
    validate_request(
        &enquiry.venue_id,
        &enquiry.customer_id,
        enquiry.party_size,
        enquiry.date,
        &enquiry.window,
        today,
    )
}

pub fn validate_proposal(proposal: &ProposedBooking, today: NaiveDate) -> Result<(), ValidationRule> {
    validate_request(
        &proposal.venue_id,
        &proposal.customer_id,
        proposal.party_size,
        proposal.date,
        &proposal.window,
        today,
    )
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<(), ConfigError> {
    if url_str.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_database_url(field_name: &str, url_str: &str) -> Result<(), ConfigError> {
    match Url::parse(url_str) {
        Ok(url) if matches!(url.scheme(), "postgres" | "postgresql") => Ok(()),
        Ok(url) => Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Unsupported database scheme: {}", url.scheme()),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::InvalidValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TimeWindow;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 30).unwrap()
    }

    fn enquiry(party_size: u32, date: NaiveDate, from: (u32, u32, u32), to: (u32, u32, u32)) -> BookingEnquiry {
        let d = NaiveDate::from_ymd_opt(2024, 6, from.0).unwrap();
        let e = NaiveDate::from_ymd_opt(2024, 6, to.0).unwrap();
        BookingEnquiry {
            venue_id: VenueId::new("hop-and-vine"),
            customer_id: CustomerId::new("test@test.test"),
            party_size,
            date,
            window: TimeWindow::new(
                Utc.from_utc_datetime(&d.and_hms_opt(from.1, from.2, 0).unwrap()),
                Utc.from_utc_datetime(&e.and_hms_opt(to.1, to.2, 0).unwrap()),
            )
            .unwrap(),
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_valid_enquiry() {
        let e = enquiry(2, june(1), (1, 18, 0), (1, 20, 0));
        assert_eq!(validate_enquiry(&e, today()), Ok(()));
    }

    #[test]
    fn test_booking_today_is_allowed() {
        let e = enquiry(2, june(1), (1, 18, 0), (1, 20, 0));
        assert_eq!(validate_enquiry(&e, june(1)), Ok(()));
    }

    #[test]
    fn test_rejects_zero_party() {
        let e = enquiry(0, june(1), (1, 18, 0), (1, 20, 0));
        assert_eq!(
            validate_enquiry(&e, today()),
            Err(ValidationRule::PartySizeNotPositive)
        );
    }

    #[test]
    fn test_rejects_past_date() {
        let e = enquiry(2, june(1), (1, 18, 0), (1, 20, 0));
        assert_eq!(validate_enquiry(&e, june(2)), Err(ValidationRule::DateInPast));
    }

    #[test]
    fn test_rejects_window_on_other_date() {
        let e = enquiry(2, june(1), (2, 18, 0), (2, 20, 0));
        assert_eq!(
            validate_enquiry(&e, today()),
            Err(ValidationRule::WindowOutsideDate)
        );
    }

    #[test]
    fn test_rejects_midnight_crossing() {
        let e = enquiry(2, june(1), (1, 22, 0), (2, 1, 0));
        assert_eq!(
            validate_enquiry(&e, today()),
            Err(ValidationRule::WindowOutsideDate)
        );
    }

    #[test]
    fn test_rejects_blank_customer() {
        let mut e = enquiry(2, june(1), (1, 18, 0), (1, 20, 0));
        e.customer_id = CustomerId::new("  ");
        assert_eq!(
            validate_enquiry(&e, today()),
            Err(ValidationRule::CustomerMissing)
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("venue_api_root", "https://example.com").is_ok());
        assert!(validate_url("venue_api_root", "http://example.com").is_ok());
        assert!(validate_url("venue_api_root", "").is_err());
        assert!(validate_url("venue_api_root", "invalid-url").is_err());
        assert!(validate_url("venue_api_root", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_database_url() {
        assert!(validate_database_url("database_url", "postgres://u:p@localhost/bookings").is_ok());
        assert!(validate_database_url("database_url", "mysql://localhost/bookings").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("call_timeout_ms", 500u64, 1, 60_000).is_ok());
        assert!(validate_range("call_timeout_ms", 0u64, 1, 60_000).is_err());
    }
}
