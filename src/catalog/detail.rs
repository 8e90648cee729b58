//! Book detail view.
//!
//! State machine: `Closed` or `Open { index, book_id, reviews }`. Within
//! `Open`, reviews move from `Loading` to `Loaded`, `Unavailable` (403) or
//! `Failed`. After a failure they are not fetched again until the view is
//! reopened or a review is submitted.

use tracing::warn;

use crate::api::ApiError;
use crate::model::{Book, BookId, Review};

/// Reviews of the open book.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewsState {
    Loading,
    Loaded(Vec<Review>),
    /// The server refused access (403).
    Unavailable,
    Failed(String),
}

/// Detail view over the filtered book list.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DetailView {
    #[default]
    Closed,
    Open {
        /// Index into the filtered list.
        index: usize,
        /// Book at `index` when it was opened.
        book_id: BookId,
        reviews: ReviewsState,
    },
}

impl DetailView {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Open { index, .. } => Some(*index),
            Self::Closed => None,
        }
    }

    pub fn book_id(&self) -> Option<&BookId> {
        match self {
            Self::Open { book_id, .. } => Some(book_id),
            Self::Closed => None,
        }
    }

    pub fn reviews(&self) -> Option<&ReviewsState> {
        match self {
            Self::Open { reviews, .. } => Some(reviews),
            Self::Closed => None,
        }
    }

    /// Open on `index` of `filtered`. Out-of-range leaves the view unchanged.
    pub fn open(&mut self, index: usize, filtered: &[&Book]) -> bool {
        let Some(book) = filtered.get(index) else {
            return false;
        };
        *self = Self::Open {
            index,
            book_id: book.id.clone(),
            reviews: ReviewsState::Loading,
        };
        true
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    /// Re-locate the open book in a changed filtered list.
    ///
    /// Keeps the reviews already loaded. Closes when the book is gone.
    pub fn resolve(&mut self, filtered: &[&Book]) {
        let position = match self {
            Self::Open { book_id, .. } => filtered.iter().position(|book| book.id == *book_id),
            Self::Closed => return,
        };
        match (position, self) {
            (Some(position), Self::Open { index, .. }) => *index = position,
            (_, view) => view.close(),
        }
    }

    /// Whether reviews should be fetched now.
    pub fn needs_reviews(&self) -> bool {
        matches!(
            self,
            Self::Open {
                reviews: ReviewsState::Loading,
                ..
            }
        )
    }

    /// Record a reviews fetch. Ignored unless the view is open and loading.
    pub fn apply_reviews(&mut self, outcome: Result<Vec<Review>, ApiError>) {
        let Self::Open { reviews, book_id, .. } = self else {
            return;
        };
        if *reviews != ReviewsState::Loading {
            return;
        }
        *reviews = match outcome {
            Ok(list) => ReviewsState::Loaded(list),
            Err(ApiError::NotFound(_)) => ReviewsState::Loaded(Vec::new()),
            Err(ApiError::Forbidden(_)) => {
                warn!(book_id = %book_id, "Reviews refused (403)");
                ReviewsState::Unavailable
            }
            Err(e) => {
                warn!(book_id = %book_id, error = %e, "Reviews failed to load");
                ReviewsState::Failed(e.to_string())
            }
        };
    }

    /// Fetch reviews again (after submitting one).
    pub fn reload_reviews(&mut self) {
        if let Self::Open { reviews, .. } = self {
            *reviews = ReviewsState::Loading;
        }
    }
}

/// Fields shown for one book in the detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDetail {
    pub id: BookId,
    pub index: usize,
    pub title: String,
    pub authors: String,
    /// Categories joined with " · ", or the genre.
    pub categories: Option<String>,
    pub year: Option<String>,
    pub isbn: Option<String>,
    pub description: String,
    pub cover_url: Option<String>,
    pub copies_available: Option<i64>,
    pub available: bool,
    pub can_prev: bool,
    pub can_next: bool,
}

impl BookDetail {
    /// Detail for `book` at `index` of a filtered list of `len` books.
    pub fn new(book: &Book, index: usize, len: usize) -> Self {
        let title = Some(book.title.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or("Title not available")
            .to_string();

        let authors = book
            .author
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("Unknown author")
            .to_string();

        let categories = if book.categories.is_empty() {
            book.genre.clone().filter(|g| !g.is_empty())
        } else {
            Some(book.categories.join(" · "))
        };

        let description = book
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("No description available for this book.")
            .to_string();

        Self {
            id: book.id.clone(),
            index,
            title,
            authors,
            categories,
            year: book.year(),
            isbn: book.isbn.clone(),
            description,
            cover_url: book.cover_image_url.clone(),
            copies_available: book.copies_available,
            available: book.is_available(),
            can_prev: index > 0,
            can_next: index + 1 < len,
        }
    }
}
