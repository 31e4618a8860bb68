//! Account endpoints.
//!
//! These go through [`ApiClient::fetch`], the low-level convention: the fetch
//! hook sees every status, and errors are built here from the raw response
//! without passing through the error interceptors.

use crate::client::{ApiClient, ApiRequest, decode_json, ensure_success};
use crate::error::ApiError;
use crate::responses::{Envelope, TokenResponse};
use focusapp_core::model::{Credentials, NewAccount, TokenPair, UserSummary};
use serde_json::json;

impl ApiClient {
    /// Exchange credentials for a token pair (`POST users/token/`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` on rejected credentials, and
    /// `ApiError::Rejected` when the body lacks either token.
    pub async fn obtain_tokens(&self, credentials: &Credentials) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::post("users/token/").json(json!({
            "username": credentials.username,
            "password": credentials.password,
        }));

        let response = ensure_success(self.fetch(request).await?).await?;
        let tokens: TokenResponse = decode_json(response).await?;

        match (tokens.access, tokens.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(TokenPair::new(access, refresh))
            }
            _ => Err(ApiError::Rejected {
                message: "token response is missing access or refresh".to_string(),
            }),
        }
    }

    /// Identity behind `access` (`GET users/me/`).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for an invalid token and
    /// `ApiError::Rejected` when the envelope reports failure.
    pub async fn current_user(&self, access: &str) -> Result<UserSummary, ApiError> {
        let request = ApiRequest::get("users/me/").bearer(access);
        let response = ensure_success(self.fetch(request).await?).await?;
        decode_json::<Envelope<UserSummary>>(response).await?.into_data()
    }

    /// Blacklist the refresh token server-side (`POST users/logout/`).
    ///
    /// # Errors
    ///
    /// Returns an error for any non-2xx answer.
    pub async fn revoke_session(&self, tokens: &TokenPair) -> Result<(), ApiError> {
        let request = ApiRequest::post("users/logout/")
            .bearer(tokens.access.as_str())
            .json(json!({ "refresh": tokens.refresh }));

        ensure_success(self.fetch(request).await?).await?;
        Ok(())
    }

    /// Create an account (`POST users/register/`). Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` with the validation errors as message when
    /// the backend rejects the form.
    pub async fn register_account(&self, account: &NewAccount) -> Result<UserSummary, ApiError> {
        let body =
            serde_json::to_value(account).map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        let request = ApiRequest::post("users/register/").json(body);

        let response = ensure_success(self.fetch(request).await?).await?;
        decode_json(response).await
    }
}
