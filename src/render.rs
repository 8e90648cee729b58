//! Plain-text rendering for the terminal.
//!
//! Every function returns a `String` so output can be checked in tests;
//! printing is left to the binary.

use chrono::NaiveDate;

use crate::catalog::{BookDetail, CatalogView, ReviewsState};
use crate::model::review::MAX_RATING;
use crate::model::{Book, Reservation, Review, UserProfile};

/// Shown when a book has no cover.
const NO_COVER: &str = "(no cover)";

/// `5 March 2024`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Filled and empty stars for a 1-5 rating.
pub fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// One catalog card: `[index] #id Title by Author (Year)`.
///
/// `index` is the position in the filtered list (for `o <i>`); `id` is what
/// the book, review and reserve commands take.
pub fn book_line(index: usize, book: &Book) -> String {
    let title = Some(book.title.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or("Title not available");
    let mut line = format!("[{:>3}] #{} {}", index, book.id, title);

    if let Some(author) = book.author.as_deref().filter(|a| !a.is_empty()) {
        line.push_str(&format!(" by {}", author));
    }
    if let Some(year) = book.year() {
        line.push_str(&format!(" ({})", year));
    }
    if !book.is_available() {
        line.push_str(" [unavailable]");
    }
    line
}

/// The current page of the catalog with its pagination footer.
pub fn catalog_page(view: &CatalogView) -> String {
    let items = view.page_items();
    if items.is_empty() {
        return match view.genre_filter() {
            "" => "No books available.".to_string(),
            filter => format!("No books found for genre \"{}\".", filter),
        };
    }

    let mut lines: Vec<String> = items
        .iter()
        .map(|(index, book)| book_line(*index, book))
        .collect();

    if let Some(pagination) = view.pagination() {
        let mut footer = format!("Page {} of {}", pagination.page, pagination.total_pages);
        if pagination.has_prev {
            footer.push_str("  [p] prev");
        }
        if pagination.has_next {
            footer.push_str("  [n] next");
        }
        lines.push(String::new());
        lines.push(footer);
    }

    lines.join("\n")
}

/// Detail block for one book.
pub fn book_detail(detail: &BookDetail) -> String {
    let mut lines = vec![
        detail.title.clone(),
        "=".repeat(detail.title.chars().count()),
        format!("ID:          {}", detail.id),
        format!("Author:      {}", detail.authors),
    ];

    if let Some(categories) = &detail.categories {
        lines.push(format!("Categories:  {}", categories));
    }
    if let Some(year) = &detail.year {
        lines.push(format!("Published:   {}", year));
    }
    if let Some(isbn) = &detail.isbn {
        lines.push(format!("ISBN:        {}", isbn));
    }
    lines.push(format!(
        "Cover:       {}",
        detail.cover_url.as_deref().unwrap_or(NO_COVER)
    ));

    let availability = match (detail.available, detail.copies_available) {
        (true, Some(copies)) => format!("Available ({} copies)", copies),
        (true, None) => "Available".to_string(),
        (false, _) => "Not available, reservations closed".to_string(),
    };
    lines.push(format!("Status:      {}", availability));
    lines.push(String::new());
    lines.push(detail.description.clone());

    lines.join("\n")
}

/// One review: stars, author, date, id and comment.
pub fn review(review: &Review) -> String {
    let mut header = format!("{} {}", stars(review.rating), review.author());
    if let Some(date) = review.date() {
        header.push_str(&format!(" · {}", format_date(date)));
    }
    if let Some(id) = review.id {
        header.push_str(&format!(" [review #{}]", id));
    }
    match review.comment.as_deref().filter(|c| !c.is_empty()) {
        Some(comment) => format!("{}\n  {}", header, comment),
        None => header,
    }
}

/// Reviews section of the detail view.
pub fn reviews(state: &ReviewsState) -> String {
    match state {
        ReviewsState::Loading => "Loading reviews...".to_string(),
        ReviewsState::Loaded(list) if list.is_empty() => {
            "No reviews yet for this book.".to_string()
        }
        ReviewsState::Loaded(list) => list.iter().map(review).collect::<Vec<_>>().join("\n"),
        ReviewsState::Unavailable => "Reviews are not available.".to_string(),
        ReviewsState::Failed(error) => format!("Could not load reviews: {}", error),
    }
}

/// One reservation card. `book` is `None` when its details could not be
/// loaded.
pub fn reservation(reservation: &Reservation, book: Option<&Book>) -> String {
    let title = reservation
        .book_title
        .as_deref()
        .or(book.map(|b| b.title.as_str()))
        .filter(|t| !t.is_empty())
        .unwrap_or("Unknown title");

    let cover = book
        .and_then(|b| b.cover_image_url.as_deref())
        .unwrap_or(NO_COVER);

    let date = |d: Option<NaiveDate>| d.map(format_date).unwrap_or_else(|| "-".to_string());

    [
        title.to_string(),
        format!("  Cover:    {}", cover),
        format!("  Reserved: {}", date(reservation.reserved_on())),
        format!("  Return:   {}", date(reservation.return_date())),
        format!("  Status:   {}", reservation.status_label()),
    ]
    .join("\n")
}

/// Profile header: greeting, email and avatar.
pub fn profile(profile: &UserProfile) -> String {
    let avatar = match profile.profile_image_url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) if url.starts_with("data:") => "custom image".to_string(),
        Some(url) => url.to_string(),
        None => format!("({})", profile.initial()),
    };

    [
        format!("Hello, {}!", profile.display_name()),
        format!("Email:  {}", profile.email.as_deref().unwrap_or("-")),
        format!("Avatar: {}", avatar),
    ]
    .join("\n")
}
