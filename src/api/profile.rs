use reqwest::Method;
use reqwest::multipart::Form;

use crate::api::media::ImageUpload;
use crate::api::types::{Profile, ProfileUpdate};
use crate::api::{ApiClient, ApiClientError, encode_segment};

/// Which profile to load: the session holder's own, or another user's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileTarget {
    Me,
    User(String),
}

impl ProfileTarget {
    /// An absent id means the caller's own profile.
    pub fn from_id(id: Option<String>) -> Self {
        match id {
            Some(id) if !id.trim().is_empty() => Self::User(id),
            _ => Self::Me,
        }
    }

    fn path(&self) -> String {
        match self {
            Self::Me => "/api/profile/me/details".to_string(),
            Self::User(id) => format!("/api/profile/{}", encode_segment(id)),
        }
    }
}

impl ApiClient {
    pub async fn get_profile(&self, target: &ProfileTarget) -> Result<Profile, ApiClientError> {
        self.send_json(self.request(Method::GET, &target.path()))
            .await
    }

    /// Partial update: only name, bio and headline are sent.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiClientError> {
        self.send_unit(self.request(Method::PUT, "/api/profile/update").json(update))
            .await
    }

    pub async fn upload_avatar(&self, image: ImageUpload) -> Result<(), ApiClientError> {
        let form = Form::new().part("profilePicture", image.into_part()?);
        self.send_unit(
            self.request(Method::POST, "/api/profile/upload-picture")
                .multipart(form),
        )
        .await
    }

    pub async fn follow(&self, user_id: &str) -> Result<(), ApiClientError> {
        let path = format!("/api/follow/{}", encode_segment(user_id));
        self.send_unit(
            self.request(Method::POST, &path)
                .json(&serde_json::json!({})),
        )
        .await
    }

    pub async fn unfollow(&self, user_id: &str) -> Result<(), ApiClientError> {
        let path = format!("/api/follow/{}", encode_segment(user_id));
        self.send_unit(
            self.request(Method::DELETE, &path)
                .json(&serde_json::json!({})),
        )
        .await
    }
}
