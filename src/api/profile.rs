//! Reservations, profile image and account calls.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use reqwest::Method;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::{ApiClient, ApiError};
use crate::model::{Book, BookId, Reservation};

/// Errors preparing a profile image for upload.
#[derive(Debug, Error)]
pub enum ProfileImageError {
    #[error("Not an image file: {0}")]
    NotAnImage(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileImageRequest<'a> {
    profile_image_url: &'a str,
}

impl ApiClient {
    /// `POST /reservations/{id}`.
    pub async fn reserve(&self, book_id: &BookId) -> Result<(), ApiError> {
        let request = self.authed(Method::POST, &format!("/reservations/{}", book_id))?;
        self.send_empty(request).await?;
        info!(book_id = %book_id, "Book reserved");
        Ok(())
    }

    /// `GET /profile/reservations`.
    pub async fn reservations(&self) -> Result<Vec<Reservation>, ApiError> {
        let request = self.authed(Method::GET, "/profile/reservations")?;
        self.send_json(request).await
    }

    /// Reservations paired with their book details.
    ///
    /// Details are fetched one reservation at a time. A failed lookup leaves
    /// that entry without a book instead of failing the whole list.
    pub async fn reservations_with_books(
        &self,
    ) -> Result<Vec<(Reservation, Option<Book>)>, ApiError> {
        let reservations = self.reservations().await?;
        let mut entries = Vec::with_capacity(reservations.len());

        for reservation in reservations {
            let book = match &reservation.book_id {
                Some(id) => match self.get_book(id).await {
                    Ok(book) => Some(book),
                    Err(e) => {
                        warn!(book_id = %id, error = %e, "Could not load reserved book details");
                        None
                    }
                },
                None => None,
            };
            entries.push((reservation, book));
        }

        Ok(entries)
    }

    /// `POST /profile/image` with a `data:` URL.
    pub async fn upload_profile_image(&self, data_url: &str) -> Result<(), ApiError> {
        let request = self
            .authed(Method::POST, "/profile/image")?
            .json(&ProfileImageRequest {
                profile_image_url: data_url,
            });

        self.send_empty(request).await?;
        info!(bytes = data_url.len(), "Profile image saved");
        Ok(())
    }

    /// `DELETE /profile/delete`. The caller clears the stored session on
    /// success.
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        let request = self.authed(Method::DELETE, "/profile/delete")?;
        self.send_empty(request).await?;
        info!("Account deleted");
        Ok(())
    }
}

/// Image MIME type from a file extension.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

/// Read an image file into a `data:<mime>;base64,...` URL.
pub fn image_data_url(path: &Path) -> Result<String, ProfileImageError> {
    let mime = image_mime(path).ok_or_else(|| ProfileImageError::NotAnImage(path.to_path_buf()))?;
    let bytes = fs::read(path)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}
