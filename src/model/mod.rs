//! Records exchanged with the SmartLibrary API.
//!
//! These are plain serde types. The server owns every consistency rule
//! (availability, permissions, duplicates); the client only checks
//! presence and format before sending.

pub mod book;
pub mod reservation;
pub mod review;
pub mod user;

pub use book::{Book, BookId, BookQuery, NewBook};
pub use reservation::Reservation;
pub use review::{NewReview, Review};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parse the date part of a server timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00Z`), a naive local timestamp
/// (`2024-03-01T10:00:00`, with or without fractional seconds) or a bare
/// date (`2024-03-01`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);

        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("2024-03-01T10:15:00"), expected);
        assert_eq!(parse_date("2024-03-01T10:15:00.123456"), expected);
        assert_eq!(parse_date("2024-03-01T10:15:00Z"), expected);
        assert_eq!(parse_date("2024-03-01T10:15:00+01:00"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }
}
