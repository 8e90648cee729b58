//! Book records.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validate::FieldErrors;

/// First four-digit run in a published date (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`).
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

/// Book identifier.
///
/// The backend uses numeric ids; the public search fallback uses opaque
/// volume ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    /// Backend id.
    Num(i64),
    /// Public volume id.
    Text(String),
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for BookId {
    fn from(id: i64) -> Self {
        Self::Num(id)
    }
}

impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) => Self::Num(n),
            Err(_) => Self::Text(id.to_string()),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub genre: Option<String>,

    #[serde(default)]
    pub publication_year: Option<i32>,

    /// Copies the server reports as available. Absent means unknown.
    #[serde(default)]
    pub copies_available: Option<i64>,

    #[serde(default)]
    pub cover_image_url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Subject categories (public search fallback only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,

    /// Preferred ISBN (public search fallback only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    /// Raw published date (public search fallback only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

impl Book {
    /// Create a book with only an id and a title set.
    pub fn new(id: impl Into<BookId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            genre: None,
            publication_year: None,
            copies_available: None,
            cover_image_url: None,
            description: None,
            categories: Vec::new(),
            isbn: None,
            published_date: None,
        }
    }

    /// Case-insensitive substring match of `filter` against categories,
    /// genre and description. An empty filter matches everything.
    pub fn matches_genre(&self, filter: &str) -> bool {
        let filter = filter.trim();
        if filter.is_empty() {
            return true;
        }

        let mut text = self.categories.join(" ");
        if let Some(genre) = &self.genre {
            text.push(' ');
            text.push_str(genre);
        }
        if let Some(description) = &self.description {
            text.push(' ');
            text.push_str(description);
        }

        text.to_lowercase().contains(&filter.to_lowercase())
    }

    /// Publication year, from the numeric field or the raw published date.
    pub fn year(&self) -> Option<String> {
        if let Some(year) = self.publication_year {
            return Some(year.to_string());
        }
        self.published_date
            .as_deref()
            .and_then(|date| YEAR.find(date))
            .map(|m| m.as_str().to_string())
    }

    /// Whether the book can be reserved. Unknown stock counts as available.
    pub fn is_available(&self) -> bool {
        self.copies_available.map_or(true, |copies| copies > 0)
    }
}

/// Server-side catalog filter for `GET /api/books`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub genre: Option<String>,
}

impl BookQuery {
    pub fn new(title: Option<String>, genre: Option<String>) -> Self {
        Self { title, genre }
    }

    /// Non-empty parameters, in the order the server expects them.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(("title", title));
        }
        if let Some(genre) = self.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            params.push(("genre", genre));
        }
        params
    }
}

/// Payload for `POST /admin/books`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publication_year: Option<i32>,
    pub copies_available: u32,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
}

impl NewBook {
    /// Trim text fields, turn blank optionals into `None` and check that the
    /// required fields are present.
    pub fn normalized(mut self) -> Result<Self, FieldErrors> {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.genre = self.genre.trim().to_string();
        self.cover_image_url = blank_to_none(self.cover_image_url);
        self.description = blank_to_none(self.description);

        let mut errors = FieldErrors::default();
        if self.title.is_empty() {
            errors.insert("title", "Title is required");
        }
        if self.author.is_empty() {
            errors.insert("author", "Author is required");
        }
        if self.genre.is_empty() {
            errors.insert("genre", "Genre is required");
        }

        errors.into_result().map(|()| self)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
