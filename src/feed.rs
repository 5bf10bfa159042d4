//! Feed screen state: the post list plus the compose form.

use std::path::Path;

use crate::api::ApiClientError;
use crate::api::media::ImageUpload;
use crate::api::types::Post;
use crate::event::ApiResult;

/// An image picked for the next post, with the text shown in its place.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedImage {
    pub upload: ImageUpload,
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeForm {
    pub content: String,
    pub image: Option<StagedImage>,
}

impl ComposeForm {
    pub fn can_submit(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Read `path` into memory and stage it, replacing any previous image.
    pub fn stage_image(&mut self, path: impl AsRef<Path>) -> Result<(), ApiClientError> {
        let upload = ImageUpload::from_path(path)?;
        let preview = upload.describe();
        self.image = Some(StagedImage { upload, preview });
        Ok(())
    }

    pub fn remove_image(&mut self) {
        self.image = None;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.image = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub posts: Vec<Post>,
    pub compose: ComposeForm,
    pub error: Option<String>,
    pub loading: bool,
    pub submitting: bool,
    pub selected: usize,
}

impl FeedState {
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn apply_posts_loaded(&mut self, result: ApiResult<Vec<Post>>) {
        self.loading = false;
        match result {
            Ok(posts) => {
                self.posts = posts;
                self.error = None;
                if self.selected >= self.posts.len() {
                    self.selected = self.posts.len().saturating_sub(1);
                }
            }
            Err(e) => {
                tracing::warn!("loading posts failed: {e}");
                self.error = Some(e.user_message("Failed to load posts"));
            }
        }
    }

    /// Take the compose form contents for sending, or `None` when there is
    /// nothing to post or a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<(String, Option<ImageUpload>)> {
        if self.submitting || !self.compose.can_submit() {
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some((
            self.compose.content.clone(),
            self.compose.image.as_ref().map(|i| i.upload.clone()),
        ))
    }

    /// Returns `true` when the list should be re-fetched.
    pub fn apply_post_created(&mut self, result: ApiResult<()>) -> bool {
        self.submitting = false;
        match result {
            Ok(()) => {
                self.compose.clear();
                true
            }
            Err(e) => {
                tracing::warn!("creating post failed: {e}");
                self.error = Some(e.user_message("Failed to create post"));
                false
            }
        }
    }

    /// Like failures are only logged; the list is re-fetched on success.
    pub fn apply_like(&mut self, result: ApiResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("like failed: {e}");
                false
            }
        }
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.posts.is_empty() {
            self.selected = (self.selected + 1).min(self.posts.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn post(id: &str) -> Post {
        serde_json::from_value(serde_json::json!({"_id": id, "content": id})).unwrap()
    }

    #[test]
    fn blank_content_cannot_be_submitted() {
        let mut feed = FeedState::default();
        feed.compose.content = "   \n".into();
        assert!(feed.begin_submit().is_none());
        assert!(!feed.submitting);
        assert_eq!(feed.compose.content, "   \n");
    }

    #[test]
    fn submit_takes_content_and_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"jpg").unwrap();

        let mut feed = FeedState::default();
        feed.compose.content = "hello".into();
        feed.compose.stage_image(&path).unwrap();
        assert_eq!(
            feed.compose.image.as_ref().unwrap().preview,
            "a.jpg (image/jpeg, 3 B)"
        );

        let (content, image) = feed.begin_submit().unwrap();
        assert_eq!(content, "hello");
        assert_eq!(image.unwrap().bytes, b"jpg");
        assert!(feed.begin_submit().is_none(), "already submitting");
    }

    #[test]
    fn success_clears_compose_form() {
        let mut feed = FeedState::default();
        feed.compose.content = "hello".into();
        feed.begin_submit().unwrap();

        assert!(feed.apply_post_created(Ok(())));
        assert_eq!(feed.compose, ComposeForm::default());
        assert!(!feed.submitting);
    }

    #[test]
    fn failure_keeps_compose_form() {
        let mut feed = FeedState::default();
        feed.compose.content = "hello".into();
        feed.begin_submit().unwrap();

        let err = Arc::new(ApiClientError::Api {
            status: 500,
            detail: "boom".into(),
        });
        assert!(!feed.apply_post_created(Err(err)));
        assert_eq!(feed.compose.content, "hello");
        assert_eq!(feed.error.as_deref(), Some("Failed to create post"));
    }

    #[test]
    fn remove_image_clears_preview() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("b.png");
        std::fs::write(&path, b"png").unwrap();

        let mut compose = ComposeForm::default();
        compose.stage_image(&path).unwrap();
        compose.remove_image();
        assert!(compose.image.is_none());
    }

    #[test]
    fn load_failure_sets_message_and_keeps_posts() {
        let mut feed = FeedState::default();
        feed.apply_posts_loaded(Ok(vec![post("p1")]));
        feed.begin_load();

        let err = Arc::new(ApiClientError::Api {
            status: 503,
            detail: String::new(),
        });
        feed.apply_posts_loaded(Err(err));
        assert!(!feed.loading);
        assert_eq!(feed.posts.len(), 1);
        assert_eq!(feed.error.as_deref(), Some("Failed to load posts"));
    }

    #[test]
    fn selection_is_clamped_after_reload() {
        let mut feed = FeedState::default();
        feed.apply_posts_loaded(Ok(vec![post("p1"), post("p2"), post("p3")]));
        feed.select_next();
        feed.select_next();
        feed.select_next();
        assert_eq!(feed.selected, 2);

        feed.apply_posts_loaded(Ok(vec![post("p1")]));
        assert_eq!(feed.selected_post().unwrap().id, "p1");
        feed.select_prev();
        assert_eq!(feed.selected, 0);
    }

    #[test]
    fn like_failure_is_not_surfaced() {
        let mut feed = FeedState::default();
        let err = Arc::new(ApiClientError::Api {
            status: 500,
            detail: String::new(),
        });
        assert!(!feed.apply_like(Err(err)));
        assert!(feed.error.is_none());
        assert!(feed.apply_like(Ok(())));
    }
}
