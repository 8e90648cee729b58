//! In-memory catalog view.
//!
//! Holds the fetched books, a genre filter over them, the current page of
//! the filtered list and the detail view. Every index handed out or
//! accepted here refers to the *filtered* list, never the raw one.

pub mod detail;
pub mod source;

use tracing::debug;

use crate::api::ApiError;
use crate::model::{Book, Review};

pub use detail::{BookDetail, DetailView, ReviewsState};
pub use source::{CatalogSource, PublicCatalog};

/// Books shown per page.
pub const PAGE_SIZE: usize = 56;

/// Number of pages needed for `len` items.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Pagination controls for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page, 1-based.
    pub page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Filtered, paginated view over a fetched book list.
#[derive(Debug, Clone)]
pub struct CatalogView {
    books: Vec<Book>,
    genre_filter: String,
    page: usize,
    page_size: usize,
    detail: DetailView,
}

impl CatalogView {
    pub fn new(books: Vec<Book>) -> Self {
        Self::with_page_size(books, PAGE_SIZE)
    }

    /// View with a custom page size (minimum 1).
    pub fn with_page_size(books: Vec<Book>, page_size: usize) -> Self {
        Self {
            books,
            genre_filter: String::new(),
            page: 1,
            page_size: page_size.max(1),
            detail: DetailView::Closed,
        }
    }

    /// Replace the fetched books. Back to page 1 with the detail view closed.
    pub fn replace_books(&mut self, books: Vec<Book>) {
        self.books = books;
        self.page = 1;
        self.detail.close();
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn genre_filter(&self) -> &str {
        &self.genre_filter
    }

    /// Books passing the genre filter, in fetch order.
    pub fn filtered(&self) -> Vec<&Book> {
        self.books
            .iter()
            .filter(|book| book.matches_genre(&self.genre_filter))
            .collect()
    }

    /// Change the genre filter.
    ///
    /// Resets to page 1. An open detail view follows its book into the new
    /// filtered list, or closes if the book is filtered out.
    pub fn set_genre_filter(&mut self, filter: impl Into<String>) {
        self.genre_filter = filter.into().trim().to_string();
        self.page = 1;

        let filtered: Vec<&Book> = self
            .books
            .iter()
            .filter(|book| book.matches_genre(&self.genre_filter))
            .collect();
        self.detail.resolve(&filtered);

        debug!(filter = %self.genre_filter, matches = filtered.len(), "Genre filter applied");
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    /// Books on the current page, each with its index in the filtered list.
    pub fn page_items(&self) -> Vec<(usize, &Book)> {
        let start = (self.page - 1) * self.page_size;
        self.filtered()
            .into_iter()
            .enumerate()
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    /// Pagination controls, or `None` when everything fits on one page.
    pub fn pagination(&self) -> Option<Pagination> {
        let total = self.total_pages();
        if total <= 1 {
            return None;
        }
        Some(Pagination {
            page: self.page,
            total_pages: total,
            has_prev: self.page > 1,
            has_next: self.page < total,
        })
    }

    /// Advance one page. No-op on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page. No-op on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    /// Open the detail view on filtered index `index`. Out-of-range is a no-op.
    pub fn open_detail(&mut self, index: usize) -> bool {
        let filtered: Vec<&Book> = self
            .books
            .iter()
            .filter(|book| book.matches_genre(&self.genre_filter))
            .collect();
        self.detail.open(index, &filtered)
    }

    /// Step the detail view forward. No-op at the last book or when closed.
    pub fn detail_next(&mut self) -> bool {
        match self.detail.index() {
            Some(index) => self.open_detail(index + 1),
            None => false,
        }
    }

    /// Step the detail view back. No-op at the first book or when closed.
    pub fn detail_prev(&mut self) -> bool {
        match self.detail.index() {
            Some(index) if index > 0 => self.open_detail(index - 1),
            _ => false,
        }
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
    }

    /// Book under the detail view.
    pub fn current_book(&self) -> Option<&Book> {
        let index = self.detail.index()?;
        self.filtered().get(index).copied()
    }

    /// Detail fields and navigation state for the open book.
    pub fn current_detail(&self) -> Option<BookDetail> {
        let index = self.detail.index()?;
        let filtered = self.filtered();
        let book = filtered.get(index)?;
        Some(BookDetail::new(book, index, filtered.len()))
    }

    /// Record the outcome of a reviews fetch for the open book.
    pub fn apply_reviews(&mut self, outcome: Result<Vec<Review>, ApiError>) {
        self.detail.apply_reviews(outcome);
    }

    /// Mark reviews for reloading (after a submission).
    pub fn reload_reviews(&mut self) {
        self.detail.reload_reviews();
    }
}
