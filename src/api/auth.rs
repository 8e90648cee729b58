//! Login, registration and current-user calls.

use reqwest::Method;
use tracing::{info, warn};

use super::{ApiClient, ApiError};
use crate::model::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use crate::validate::{LoginForm, RegistrationForm};

impl ApiClient {
    /// `POST /auth/login`.
    ///
    /// Any rejection is reported as [`ApiError::InvalidCredentials`] so the
    /// caller cannot tell a wrong username from a wrong password.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginResponse, ApiError> {
        form.validate().map_err(ApiError::Validation)?;

        let request = self
            .request(Method::POST, "/auth/login")
            .json(&LoginRequest {
                username: &form.username,
                password: &form.password,
            });

        match self.send_json::<LoginResponse>(request).await {
            Ok(response) => {
                info!(username = %form.username, role = ?response.effective_role(), "Logged in");
                Ok(response)
            }
            Err(e @ (ApiError::Network(_) | ApiError::Decode(_))) => Err(e),
            Err(e) => {
                warn!(username = %form.username, error = %e, "Login rejected");
                Err(ApiError::InvalidCredentials)
            }
        }
    }

    /// `POST /auth/register`, after client-side validation.
    ///
    /// Server-side rejections keep their field mapping: see
    /// [`ApiError::field_errors`].
    pub async fn register(&self, form: &RegistrationForm) -> Result<(), ApiError> {
        form.validate().map_err(ApiError::Validation)?;

        let request = self
            .request(Method::POST, "/auth/register")
            .json(&RegisterRequest {
                username: &form.username,
                email: &form.email,
                password: &form.password,
            });

        self.send_empty(request).await?;
        info!(username = %form.username, "Registered");
        Ok(())
    }

    /// `GET /auth/me`.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let request = self.authed(Method::GET, "/auth/me")?;
        self.send_json(request).await
    }
}
