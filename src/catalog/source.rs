//! Where the catalog comes from.
//!
//! The backend catalog (`GET /api/books`) is the normal source. When no
//! backend catalog is configured, books are pulled straight from a public
//! Google-Books-compatible `volumes` endpoint:
//! - default catalog: one query per subject, merged, de-duplicated, shuffled
//! - free-text search: up to five pages of results, de-duplicated

use std::collections::HashSet;

use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::model::{Book, BookId, BookQuery};

/// Public volumes endpoint.
pub const DEFAULT_VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Subjects queried to build the default multi-genre catalog.
pub const SUBJECT_TERMS: [&str; 10] = [
    "subject:fiction",
    "subject:fantasy",
    "subject:romance",
    "subject:thriller",
    "subject:history",
    "subject:science",
    "subject:philosophy",
    "subject:technology",
    "subject:mystery",
    "subject:biography",
];

/// Results requested per subject (API maximum).
pub const MAX_RESULTS_PER_TERM: u32 = 40;

/// Results requested per search page (API maximum).
pub const SEARCH_RESULTS_PER_REQUEST: u32 = 40;

/// Search pages fetched at most.
pub const SEARCH_TOTAL_REQUESTS: u32 = 5;

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Option<Vec<Volume>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    large: Option<String>,
}

impl Volume {
    fn has_cover(&self) -> bool {
        self.volume_info
            .as_ref()
            .and_then(|info| info.image_links.as_ref())
            .is_some_and(|links| links.thumbnail.is_some())
    }

    fn into_book(self) -> Book {
        let info = self.volume_info.unwrap_or_default();

        let isbn = ["ISBN_13", "ISBN_10"]
            .iter()
            .find_map(|kind| info.industry_identifiers.iter().find(|id| id.kind == *kind))
            .or_else(|| info.industry_identifiers.first())
            .map(|id| id.identifier.clone());

        let cover = info
            .image_links
            .and_then(|links| links.large.or(links.thumbnail));

        let mut book = Book::new(BookId::Text(self.id), info.title.unwrap_or_default());
        book.author = Some(info.authors.join(", ")).filter(|a| !a.is_empty());
        book.categories = info.categories;
        book.published_date = info.published_date;
        book.description = info.description;
        book.isbn = isbn;
        book.cover_image_url = cover;
        book
    }
}

/// Keep volumes with a cover, drop repeated ids (first one wins) and map to
/// books.
fn collect_books(volumes: Vec<Volume>) -> Vec<Book> {
    let mut seen = HashSet::new();
    volumes
        .into_iter()
        .filter(Volume::has_cover)
        .filter(|volume| seen.insert(volume.id.clone()))
        .map(Volume::into_book)
        .collect()
}

/// Client for the public volumes API.
#[derive(Debug, Clone)]
pub struct PublicCatalog {
    http: Client,
    volumes_url: String,
    language: String,
}

impl PublicCatalog {
    pub fn new(http: Client, volumes_url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            http,
            volumes_url: volumes_url.into(),
            language: language.into(),
        }
    }

    /// Multi-genre catalog, shuffled. Subjects that error are skipped.
    pub async fn default_catalog(&self) -> Result<Vec<Book>, ApiError> {
        let mut volumes = Vec::new();

        for term in SUBJECT_TERMS {
            let response = self.fetch(term, MAX_RESULTS_PER_TERM, None).await?;
            if let Some(error) = response.error {
                warn!(term, error = %error, "Public catalog query failed, skipping");
                continue;
            }
            volumes.extend(response.items.unwrap_or_default());
        }

        let mut books = collect_books(volumes);
        books.shuffle(&mut rand::thread_rng());

        info!(count = books.len(), "Public catalog loaded");
        Ok(books)
    }

    /// Free-text search across up to [`SEARCH_TOTAL_REQUESTS`] pages.
    ///
    /// Stops at the first page that errors or comes back empty.
    pub async fn search(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        let mut volumes = Vec::new();

        for page in 0..SEARCH_TOTAL_REQUESTS {
            let start = page * SEARCH_RESULTS_PER_REQUEST;
            let response = self
                .fetch(query, SEARCH_RESULTS_PER_REQUEST, Some(start))
                .await?;

            if let Some(error) = response.error {
                warn!(query, error = %error, "Public search failed");
                break;
            }
            match response.items {
                Some(items) if !items.is_empty() => volumes.extend(items),
                _ => break,
            }
        }

        let books = collect_books(volumes);
        info!(query, count = books.len(), "Public search finished");
        Ok(books)
    }

    async fn fetch(
        &self,
        query: &str,
        max_results: u32,
        start_index: Option<u32>,
    ) -> Result<VolumesResponse, ApiError> {
        let mut url = format!(
            "{}?q={}&maxResults={}&langRestrict={}",
            self.volumes_url,
            urlencoding::encode(query),
            max_results,
            urlencoding::encode(&self.language),
        );
        if let Some(start) = start_index {
            url.push_str(&format!("&startIndex={}", start));
        }

        debug!(url = %url, "Querying public catalog");

        // Error responses carry a JSON `error` object; read it regardless of status.
        let response = self.http.get(&url).send().await.map_err(ApiError::Network)?;
        response.json().await.map_err(ApiError::Decode)
    }
}

/// Catalog backend in use.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// SmartLibrary API.
    Backend(ApiClient),
    /// Public volumes API.
    Public(PublicCatalog),
}

impl CatalogSource {
    /// Load the catalog.
    ///
    /// The public source treats a title as a free-text search. It has no
    /// genre parameter, so the genre is matched against each result with
    /// [`Book::matches_genre`].
    pub async fn load(&self, query: &BookQuery) -> Result<Vec<Book>, ApiError> {
        let public = match self {
            Self::Backend(api) => return api.list_books(query).await,
            Self::Public(public) => public,
        };

        let books = match query.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => public.search(title).await?,
            None => public.default_catalog().await?,
        };

        Ok(match query.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            Some(genre) => books
                .into_iter()
                .filter(|book| book.matches_genre(genre))
                .collect(),
            None => books,
        })
    }

    /// Whether per-book details (reviews, reservations) come from the backend.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
