//! Commands of the interactive catalog browser.
//!
//! One command per input line. Keys mirror the catalog's pagination and
//! detail-view controls:
//!
//! | Input | Command |
//! |---|---|
//! | `n`, `p` | next / previous page |
//! | `o <i>` | open the detail view on filtered index `i` |
//! | `l`, `next` / `h`, `prev` | step the detail view |
//! | `g <genre>` | set the genre filter (`g` alone clears it) |
//! | `r <1-5> [comment]` | review the open book |
//! | `reserve` | reserve the open book |
//! | `q`, `esc` | close the detail view |
//! | `quit` | leave the browser |

use thiserror::Error;

use crate::catalog::CatalogView;

/// Errors parsing a browser command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Expected a book number after `o`")]
    MissingIndex,

    #[error("Not a book number: {0}")]
    BadIndex(String),

    #[error("Expected a rating from 1 to 5 after `r`")]
    BadRating,
}

/// One browser command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    NextPage,
    PrevPage,
    Open(usize),
    DetailNext,
    DetailPrev,
    Filter(String),
    Review { rating: u8, comment: Option<String> },
    Reserve,
    Close,
    Quit,
    Help,
}

impl BrowseCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Result<Self, CommandError>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "n" => Ok(Self::NextPage),
            "p" => Ok(Self::PrevPage),
            "l" | "next" => Ok(Self::DetailNext),
            "h" | "prev" => Ok(Self::DetailPrev),
            "q" | "esc" => Ok(Self::Close),
            "quit" | "exit" => Ok(Self::Quit),
            "?" | "help" => Ok(Self::Help),
            "reserve" => Ok(Self::Reserve),
            "g" => Ok(Self::Filter(rest.to_string())),
            "o" if rest.is_empty() => Err(CommandError::MissingIndex),
            "o" => rest
                .parse()
                .map(Self::Open)
                .map_err(|_| CommandError::BadIndex(rest.to_string())),
            "r" => {
                let (rating, comment) = match rest.split_once(char::is_whitespace) {
                    Some((rating, comment)) => (rating, Some(comment.trim().to_string())),
                    None => (rest, None),
                };
                rating
                    .parse()
                    .map(|rating| Self::Review { rating, comment })
                    .map_err(|_| CommandError::BadRating)
            }
            _ => Err(CommandError::Unknown(word.to_string())),
        };
        Some(command)
    }

    /// Apply a view-only command. Returns `false` when nothing changed.
    ///
    /// `Review`, `Reserve`, `Quit` and `Help` need the caller and are not
    /// handled here.
    pub fn apply(&self, view: &mut CatalogView) -> bool {
        match self {
            Self::NextPage => view.next_page(),
            Self::PrevPage => view.prev_page(),
            Self::Open(index) => view.open_detail(*index),
            Self::DetailNext => view.detail_next(),
            Self::DetailPrev => view.detail_prev(),
            Self::Filter(genre) => {
                view.set_genre_filter(genre.as_str());
                true
            }
            Self::Close => {
                let was_open = view.detail().is_open();
                view.close_detail();
                was_open
            }
            Self::Review { .. } | Self::Reserve | Self::Quit | Self::Help => false,
        }
    }
}

/// Help text listing the browser commands.
pub const HELP: &str = "\
n / p               next / previous page
o <i>               open book number i
l, next / h, prev   next / previous book in the detail view
g <genre>           filter by genre (g alone clears the filter)
r <1-5> [text]      review the open book
reserve             reserve the open book
q, esc              close the detail view
quit                leave the browser";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Book;

    fn parse(line: &str) -> Result<BrowseCommand, CommandError> {
        BrowseCommand::parse(line).unwrap()
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(parse("n"), Ok(BrowseCommand::NextPage));
        assert_eq!(parse(" P "), Ok(BrowseCommand::PrevPage));
        assert_eq!(parse("next"), Ok(BrowseCommand::DetailNext));
        assert_eq!(parse("h"), Ok(BrowseCommand::DetailPrev));
        assert_eq!(parse("esc"), Ok(BrowseCommand::Close));
        assert_eq!(parse("quit"), Ok(BrowseCommand::Quit));
        assert_eq!(BrowseCommand::parse("   "), None);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse("o 12"), Ok(BrowseCommand::Open(12)));
        assert_eq!(parse("o"), Err(CommandError::MissingIndex));
        assert_eq!(parse("o x"), Err(CommandError::BadIndex("x".into())));
        assert_eq!(
            parse("g science fiction"),
            Ok(BrowseCommand::Filter("science fiction".into()))
        );
        assert_eq!(parse("g"), Ok(BrowseCommand::Filter(String::new())));
        assert_eq!(
            parse("r 4 Great  pacing"),
            Ok(BrowseCommand::Review {
                rating: 4,
                comment: Some("Great  pacing".into())
            })
        );
        assert_eq!(parse("r five"), Err(CommandError::BadRating));
        assert_eq!(parse("zap"), Err(CommandError::Unknown("zap".into())));
    }

    #[test]
    fn test_apply_navigation() {
        let books = (0..3i64).map(|i| Book::new(i, format!("Book {}", i))).collect();
        let mut view = CatalogView::new(books);

        assert!(BrowseCommand::Open(2).apply(&mut view));
        assert!(!BrowseCommand::DetailNext.apply(&mut view));
        assert!(BrowseCommand::DetailPrev.apply(&mut view));
        assert_eq!(view.detail().index(), Some(1));

        assert!(BrowseCommand::Close.apply(&mut view));
        assert!(!BrowseCommand::Close.apply(&mut view));
        assert!(!BrowseCommand::Open(7).apply(&mut view));
    }
}
