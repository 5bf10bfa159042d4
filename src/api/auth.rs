use reqwest::Method;

use crate::api::types::{LoginRequest, LoginResponse, SignupRequest};
use crate::api::{ApiClient, ApiClientError, server_message};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Client-side password check applied before any signup request.
pub fn validate_signup_password(password: &str) -> Result<(), ApiClientError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiClientError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl ApiClient {
    /// Exchange email + password for a session token and display name.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiClientError> {
        let builder = self
            .request(Method::POST, "/api/auth/login")
            .json(&LoginRequest { email, password });
        let body = self.send_auth(builder, "Login failed").await?;
        serde_json::from_str::<LoginResponse>(&body)
            .map_err(|e| ApiClientError::Deserialize(format!("{e}: {body}")))
    }

    /// Register a new account. Never touches the network when the password
    /// is too short.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiClientError> {
        validate_signup_password(password)?;

        let builder = self
            .request(Method::POST, "/api/auth/signup")
            .json(&SignupRequest {
                name,
                email,
                password,
            });
        // The success body varies between deployments; only the status matters.
        self.send_auth(builder, "Signup failed").await?;
        Ok(())
    }

    /// Auth endpoints report every rejection as `Auth`, preferring the
    /// server's message over `fallback`. Returns the raw success body.
    async fn send_auth(
        &self,
        builder: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<String, ApiClientError> {
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "auth request rejected");
            return Err(ApiClientError::Auth {
                message: server_message(&body).unwrap_or_else(|| fallback.to_string()),
            });
        }

        Ok(body)
    }
}
