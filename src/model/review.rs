//! Review records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::parse_date;
use crate::validate::FieldErrors;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// A rating with an optional comment, tied to a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub username: Option<String>,

    pub rating: u8,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub review_date: Option<String>,
}

impl Review {
    pub fn date(&self) -> Option<NaiveDate> {
        self.review_date.as_deref().and_then(parse_date)
    }

    /// Author name, or a generic label for anonymous reviews.
    pub fn author(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("User")
    }
}

/// Payload for `POST /api/books/{id}/reviews`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub rating: u8,
    /// Sent as `null` when empty.
    pub comment: Option<String>,
}

impl NewReview {
    /// Build a review, rejecting ratings outside 1..=5.
    pub fn new(rating: u8, comment: Option<&str>) -> Result<Self, FieldErrors> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            let mut errors = FieldErrors::default();
            errors.insert("rating", "Choose a rating from 1 to 5 stars");
            return Err(errors);
        }

        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self { rating, comment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(NewReview::new(0, None).is_err());
        assert!(NewReview::new(6, Some("great")).is_err());
        assert!(NewReview::new(1, None).is_ok());
        assert!(NewReview::new(5, None).is_ok());
    }

    #[test]
    fn test_blank_comment_is_null() {
        let review = NewReview::new(4, Some("   ")).unwrap();
        assert_eq!(review.comment, None);

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json, serde_json::json!({"rating": 4, "comment": null}));
    }

    #[test]
    fn test_comment_is_trimmed() {
        let review = NewReview::new(3, Some("  solid read ")).unwrap();
        assert_eq!(review.comment.as_deref(), Some("solid read"));
    }

    #[test]
    fn test_author_fallback() {
        let review: Review = serde_json::from_str(r#"{"rating": 2}"#).unwrap();
        assert_eq!(review.author(), "User");
        assert_eq!(review.date(), None);
    }
}
