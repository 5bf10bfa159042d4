use reqwest::Method;
use reqwest::multipart::Form;

use crate::api::media::ImageUpload;
use crate::api::types::Post;
use crate::api::{ApiClient, ApiClientError, encode_segment};

impl ApiClient {
    /// Fetch every post, newest first as ordered by the server.
    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiClientError> {
        self.send_json(self.request(Method::GET, "/api/posts/all"))
            .await
    }

    /// Create a post. The `image` part is omitted entirely when absent.
    pub async fn create_post(
        &self,
        content: &str,
        image: Option<ImageUpload>,
    ) -> Result<(), ApiClientError> {
        let mut form = Form::new().text("content", content.to_string());
        if let Some(image) = image {
            form = form.part("image", image.into_part()?);
        }

        self.send_unit(self.request(Method::POST, "/api/posts/create").multipart(form))
            .await
    }

    /// Record a like. Not idempotent: the server may toggle or double-count.
    pub async fn like_post(&self, post_id: &str) -> Result<(), ApiClientError> {
        let path = format!("/api/posts/{}/like", encode_segment(post_id));
        self.send_unit(
            self.request(Method::POST, &path)
                .json(&serde_json::json!({})),
        )
        .await
    }
}
