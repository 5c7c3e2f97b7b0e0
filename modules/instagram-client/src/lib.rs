pub mod error;

pub use error::{InstagramError, Result};

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

const BASE_URL: &str = "https://i.instagram.com/api/v1";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    authenticated: bool,
    #[serde(default)]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Unauthenticated Instagram client. `authenticate` exchanges credentials
/// for a [`Session`], the only handle that can publish.
pub struct InstagramClient {
    client: reqwest::Client,
    base_url: String,
}

impl InstagramClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Log in and return a publish-capable session.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        let url = format!("{}/accounts/login/", self.base_url);

        debug!(username = credentials.username.as_str(), "Logging in to Instagram");

        let resp = self
            .client
            .post(&url)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Auth(message));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let login: LoginResponse = resp.json().await?;
        if !login.authenticated {
            return Err(InstagramError::Auth("login rejected".to_string()));
        }

        info!(username = credentials.username.as_str(), "Instagram session established");

        Ok(Session {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_id: login.session_id,
            username: credentials.username.clone(),
        })
    }
}

impl Default for InstagramClient {
    fn default() -> Self {
        Self::new()
    }
}

/// An authenticated Instagram session. Single owner for the run; closed
/// explicitly with [`Session::close`].
pub struct Session {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
    username: String,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Upload one photo with its caption.
    pub async fn publish_photo(&self, media_path: &Path, caption: &str) -> Result<()> {
        let bytes = tokio::fs::read(media_path).await?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| InstagramError::Io(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("caption", caption.to_string())
            .part("photo", part);

        let url = format!("{}/media/upload/", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Cookie", format!("sessionid={}", self.session_id))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Auth(message));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let upload: UploadResponse = resp.json().await?;
        if upload.status != "ok" {
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message: upload.message,
            });
        }

        debug!(username = self.username.as_str(), "Photo published");
        Ok(())
    }

    /// Log out, invalidating the session id.
    pub async fn close(self) -> Result<()> {
        let url = format!("{}/accounts/logout/", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Cookie", format!("sessionid={}", self.session_id))
            .send()
            .await?;

        if !resp.status().is_success() {
            debug!(
                username = self.username.as_str(),
                status = resp.status().as_u16(),
                "Logout returned non-success, session will expire server-side"
            );
        }
        Ok(())
    }
}
