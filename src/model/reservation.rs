//! Reservation records.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{parse_date, BookId};

/// Loan period granted by a reservation.
pub const LOAN_PERIOD: Months = Months::new(1);

/// A user's claim on a book copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default)]
    pub book_id: Option<BookId>,

    #[serde(default)]
    pub book_title: Option<String>,

    /// Raw reservation timestamp as sent by the server.
    #[serde(default)]
    pub reservation_date: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub expired: bool,

    /// Whether the copy has been picked up.
    #[serde(default)]
    pub collected: bool,
}

impl Reservation {
    /// Date the reservation was made.
    pub fn reserved_on(&self) -> Option<NaiveDate> {
        self.reservation_date.as_deref().and_then(parse_date)
    }

    /// Date the copy is due back: one calendar month after the reservation,
    /// clamped to the end of shorter months.
    pub fn return_date(&self) -> Option<NaiveDate> {
        self.reserved_on()?.checked_add_months(LOAN_PERIOD)
    }

    /// Human-readable status line.
    pub fn status_label(&self) -> String {
        let mut label = if self.active {
            "Active".to_string()
        } else if self.expired {
            "Expired".to_string()
        } else {
            "Not active".to_string()
        };
        if self.collected {
            label.push_str(" · Collected");
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(date: &str) -> Reservation {
        Reservation {
            book_id: Some(BookId::Num(1)),
            book_title: Some("Emma".to_string()),
            reservation_date: Some(date.to_string()),
            active: true,
            expired: false,
            collected: false,
        }
    }

    #[test]
    fn test_return_date_is_one_month_later() {
        let r = reservation("2024-03-15T09:30:00");
        assert_eq!(r.return_date(), NaiveDate::from_ymd_opt(2024, 4, 15));
    }

    #[test]
    fn test_return_date_clamps_to_month_end() {
        let r = reservation("2024-01-31");
        assert_eq!(r.return_date(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn test_missing_date() {
        let mut r = reservation("");
        r.reservation_date = None;
        assert_eq!(r.reserved_on(), None);
        assert_eq!(r.return_date(), None);
    }

    #[test]
    fn test_status_label() {
        let mut r = reservation("2024-01-01");
        assert_eq!(r.status_label(), "Active");

        r.collected = true;
        assert_eq!(r.status_label(), "Active · Collected");

        r.active = false;
        r.collected = false;
        assert_eq!(r.status_label(), "Not active");

        r.expired = true;
        assert_eq!(r.status_label(), "Expired");
    }

    #[test]
    fn test_deserialize_server_shape() {
        let json = r#"{"bookId": 12, "bookTitle": "Dune", "reservationDate": "2024-05-02T11:00:00", "active": true}"#;
        let r: Reservation = serde_json::from_str(json).unwrap();

        assert_eq!(r.book_id, Some(BookId::Num(12)));
        assert!(!r.collected);
        assert_eq!(r.reserved_on(), NaiveDate::from_ymd_opt(2024, 5, 2));
    }
}
