//! Admin console calls.
//!
//! Every operation here expects an admin token; [`ApiClient::require_admin`]
//! is the gate callers run first.

use reqwest::Method;
use tracing::{info, warn};

use super::{ApiClient, ApiError};
use crate::model::{BookId, NewBook, UserProfile};
use crate::session::is_admin_role;

impl ApiClient {
    /// Check that the current token belongs to an admin.
    ///
    /// No token, or a failed `/auth/me`, means the user must log in again.
    /// A valid non-admin account is [`ApiError::Forbidden`].
    pub async fn require_admin(&self) -> Result<UserProfile, ApiError> {
        let profile = match self.me().await {
            Ok(profile) => profile,
            Err(ApiError::NotAuthenticated) => return Err(ApiError::NotAuthenticated),
            Err(e) => {
                warn!(error = %e, "Admin check failed");
                return Err(ApiError::NotAuthenticated);
            }
        };

        if !is_admin_role(profile.effective_role()) {
            return Err(ApiError::Forbidden(
                "only administrators can use the admin console".to_string(),
            ));
        }
        Ok(profile)
    }

    /// `POST /admin/books`.
    pub async fn add_book(&self, book: NewBook) -> Result<(), ApiError> {
        let book = book.normalized().map_err(ApiError::Validation)?;
        let request = self.authed(Method::POST, "/admin/books")?.json(&book);

        self.send_empty(request).await?;
        info!(title = %book.title, "Book added");
        Ok(())
    }

    /// `DELETE /admin/books/{id}`.
    pub async fn delete_book(&self, id: &BookId) -> Result<(), ApiError> {
        self.admin_delete(&format!("/books/{}", id)).await?;
        info!(book_id = %id, "Book deleted");
        Ok(())
    }

    /// `DELETE /admin/reviews/{id}`.
    pub async fn delete_review(&self, id: i64) -> Result<(), ApiError> {
        self.admin_delete(&format!("/reviews/{}", id)).await?;
        info!(review_id = id, "Review deleted");
        Ok(())
    }

    /// DELETE under `/admin`, retried once under the configured fallback
    /// prefix when the first attempt is refused with 403.
    async fn admin_delete(&self, suffix: &str) -> Result<(), ApiError> {
        let request = self.authed(Method::DELETE, &format!("/admin{}", suffix))?;
        match self.send_empty(request).await {
            Err(ApiError::Forbidden(message)) => match &self.admin_fallback_prefix {
                Some(prefix) => {
                    warn!(prefix = %prefix, suffix, "Admin route refused, trying fallback prefix");
                    let request = self.authed(Method::DELETE, &format!("{}{}", prefix, suffix))?;
                    self.send_empty(request).await
                }
                None => Err(ApiError::Forbidden(message)),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::client;
    use crate::config::ClientConfig;

    async fn me_mock(server: &mut mockito::Server, role: &str) -> mockito::Mock {
        server
            .mock("GET", "/auth/me")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"username": "x", "role": "{}"}}"#, role))
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_require_admin() {
        let mut server = mockito::Server::new_async().await;
        let _m = me_mock(&mut server, "ROLE_ADMIN").await;

        let api = client(&server, Some("t"));
        let profile = api.require_admin().await.unwrap();
        assert_eq!(profile.effective_role(), "ROLE_ADMIN");
    }

    #[tokio::test]
    async fn test_require_admin_rejects_user() {
        let mut server = mockito::Server::new_async().await;
        let _m = me_mock(&mut server, "ROLE_USER").await;

        let api = client(&server, Some("t"));
        assert!(matches!(api.require_admin().await, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_require_admin_expired_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/me")
            .with_status(401)
            .create_async()
            .await;

        let api = client(&server, Some("t"));
        assert!(matches!(api.require_admin().await, Err(ApiError::NotAuthenticated)));
        assert!(matches!(
            client(&server, None).require_admin().await,
            Err(ApiError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_delete_book_surfaces_server_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/admin/books/4")
            .with_status(500)
            .with_body("Book has active reservations")
            .create_async()
            .await;

        let api = client(&server, Some("t"));
        let err = api.delete_book(&BookId::Num(4)).await.unwrap_err();
        assert!(err.to_string().contains("Book has active reservations"));
    }

    #[tokio::test]
    async fn test_forbidden_without_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/admin/reviews/8")
            .with_status(403)
            .create_async()
            .await;
        let fallback = server
            .mock("DELETE", "/api/admin/reviews/8")
            .expect(0)
            .create_async()
            .await;

        let api = client(&server, Some("t"));
        assert!(matches!(api.delete_review(8).await, Err(ApiError::Forbidden(_))));
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn test_forbidden_with_fallback() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/admin/reviews/8")
            .with_status(403)
            .create_async()
            .await;
        let fallback = server
            .mock("DELETE", "/api/admin/reviews/8")
            .with_status(204)
            .create_async()
            .await;

        let config = ClientConfig::new(server.url()).with_admin_fallback("/api/admin");
        let api = ApiClient::new(&config)
            .unwrap()
            .with_token(Some("t".to_string()));

        api.delete_review(8).await.unwrap();
        fallback.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_book_validates_before_sending() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/admin/books")
            .expect(0)
            .create_async()
            .await;

        let api = client(&server, Some("t"));
        let book = NewBook {
            title: String::new(),
            author: "A".to_string(),
            genre: "G".to_string(),
            publication_year: None,
            copies_available: 1,
            cover_image_url: None,
            description: None,
        };

        assert!(matches!(api.add_book(book).await, Err(ApiError::Validation(_))));
        mock.assert_async().await;
    }
}
