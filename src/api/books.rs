//! Catalog, book detail and review calls.

use reqwest::Method;
use tracing::{debug, info};

use super::{ApiClient, ApiError};
use crate::model::{Book, BookId, BookQuery, NewReview, Review};

impl ApiClient {
    /// `GET /api/books`, optionally filtered server-side by title and genre.
    pub async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>, ApiError> {
        let request = self
            .request(Method::GET, "/api/books")
            .query(&query.params());

        let books: Vec<Book> = self.send_json(request).await?;
        debug!(count = books.len(), "Catalog loaded");
        Ok(books)
    }

    /// `GET /api/books/{id}`.
    pub async fn get_book(&self, id: &BookId) -> Result<Book, ApiError> {
        let request = self.request(Method::GET, &format!("/api/books/{}", id));
        self.send_json(request).await
    }

    /// `GET /api/books/{id}/reviews`. A 404 means the book has no reviews.
    pub async fn reviews(&self, id: &BookId) -> Result<Vec<Review>, ApiError> {
        let request = self.request(Method::GET, &format!("/api/books/{}/reviews", id));
        match self.send_json(request).await {
            Err(ApiError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// `POST /api/books/{id}/reviews`.
    ///
    /// The server answers 403 when the user has not reserved the book.
    pub async fn add_review(&self, id: &BookId, review: &NewReview) -> Result<(), ApiError> {
        let request = self
            .authed(Method::POST, &format!("/api/books/{}/reviews", id))?
            .json(review);

        self.send_empty(request).await?;
        info!(book_id = %id, rating = review.rating, "Review submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::api::test_support::client;

    #[tokio::test]
    async fn test_list_books_with_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/books")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("title".into(), "rosa".into()),
                Matcher::UrlEncoded("genre".into(), "Giallo".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "title": "Il nome della rosa", "genre": "Giallo"}]"#)
            .create_async()
            .await;

        let api = client(&server, None);
        let query = BookQuery::new(Some("rosa".into()), Some("Giallo".into()));
        let books = api.list_books(&query).await.unwrap();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, BookId::Num(1));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reviews_not_found_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/books/9/reviews")
            .with_status(404)
            .create_async()
            .await;

        let api = client(&server, None);
        let reviews = api.reviews(&BookId::Num(9)).await.unwrap();
        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn test_reviews_forbidden_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/books/9/reviews")
            .with_status(403)
            .create_async()
            .await;

        let api = client(&server, Some("t"));
        let result = api.reviews(&BookId::Num(9)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_add_review() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/books/3/reviews")
            .match_header("authorization", "Bearer t")
            .match_body(Matcher::Json(serde_json::json!({"rating": 5, "comment": null})))
            .with_status(201)
            .create_async()
            .await;

        let api = client(&server, Some("t"));
        let review = NewReview::new(5, Some("")).unwrap();
        api.add_review(&BookId::Num(3), &review).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_review_needs_login() {
        let server = mockito::Server::new_async().await;
        let api = client(&server, None);
        let review = NewReview::new(4, None).unwrap();

        let result = api.add_review(&BookId::Num(3), &review).await;
        assert!(matches!(result, Err(ApiError::NotAuthenticated)));
    }
}
