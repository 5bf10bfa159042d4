//! Profile screen: composing the view-model and the edit/follow/avatar actions.

use serde::Serialize;

use crate::api::profile::ProfileTarget;
use crate::api::types::{Profile, ProfileUpdate, UserRef};
use crate::api::{ApiClient, ApiClientError};
use crate::event::ApiResult;

/// A profile together with how it relates to the session holder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub profile: Profile,
    pub is_own: bool,
    pub is_following: bool,
}

impl ProfileView {
    pub fn compose(profile: Profile, me: &Profile) -> Self {
        let is_own = profile.id == me.id;
        let is_following = !is_own && profile.has_follower(&me.id);
        Self {
            profile,
            is_own,
            is_following,
        }
    }
}

/// Fetch `target` and the caller's own profile, and derive the relationship
/// flags. Nothing is returned unless both fetches succeed.
pub async fn load_profile_view(
    api: &ApiClient,
    target: &ProfileTarget,
) -> Result<ProfileView, ApiClientError> {
    match target {
        ProfileTarget::Me => {
            let me = api.get_profile(&ProfileTarget::Me).await?;
            Ok(ProfileView {
                profile: me,
                is_own: true,
                is_following: false,
            })
        }
        ProfileTarget::User(_) => {
            let (profile, me) = tokio::try_join!(
                api.get_profile(target),
                api.get_profile(&ProfileTarget::Me)
            )?;
            Ok(ProfileView::compose(profile, &me))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileStatus {
    Loading,
    Ready(ProfileView),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Headline,
    Bio,
}

impl DraftField {
    pub const ALL: [DraftField; 3] = [Self::Name, Self::Headline, Self::Bio];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Headline => "Headline",
            Self::Bio => "Bio",
        }
    }
}

/// Local copy of the editable fields; discarded on cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub headline: String,
    pub bio: String,
    pub focus: DraftField,
}

impl ProfileDraft {
    fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            headline: profile.headline.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            focus: DraftField::Name,
        }
    }

    pub fn value(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Headline => &self.headline,
            DraftField::Bio => &self.bio,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            DraftField::Name => &mut self.name,
            DraftField::Headline => &mut self.headline,
            DraftField::Bio => &mut self.bio,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn pop_char(&mut self) {
        self.focused_mut().pop();
    }

    pub fn focus_next(&mut self) {
        let idx = DraftField::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = DraftField::ALL[(idx + 1) % DraftField::ALL.len()];
    }

    pub fn focus_prev(&mut self) {
        let idx = DraftField::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = DraftField::ALL[(idx + DraftField::ALL.len() - 1) % DraftField::ALL.len()];
    }

    fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.trim().to_string(),
            bio: self.bio.clone(),
            headline: self.headline.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileState {
    pub target: ProfileTarget,
    pub status: ProfileStatus,
    pub draft: Option<ProfileDraft>,
    /// Failure of the last action; the loaded profile stays on screen.
    pub error: Option<String>,
    pub busy: bool,
    pub selected: usize,
}

impl ProfileState {
    pub fn new(target: ProfileTarget) -> Self {
        Self {
            target,
            status: ProfileStatus::Loading,
            draft: None,
            error: None,
            busy: false,
            selected: 0,
        }
    }

    pub fn view(&self) -> Option<&ProfileView> {
        match self.status {
            ProfileStatus::Ready(ref view) => Some(view),
            _ => None,
        }
    }

    /// A reload keeps the current view on screen until the new one arrives.
    pub fn begin_load(&mut self) {
        if self.view().is_none() {
            self.status = ProfileStatus::Loading;
        }
    }

    pub fn apply_loaded(&mut self, result: ApiResult<ProfileView>) {
        self.busy = false;
        match result {
            Ok(view) => {
                let total = view.profile.followers.len() + view.profile.following.len();
                if self.selected >= total {
                    self.selected = total.saturating_sub(1);
                }
                self.status = ProfileStatus::Ready(view);
            }
            Err(e) => {
                tracing::warn!(profile = ?self.target, "loading profile failed: {e}");
                self.draft = None;
                let message = if e.is_not_found() {
                    "Profile not found"
                } else {
                    "Failed to load profile"
                };
                self.status = ProfileStatus::Failed(message.to_string());
            }
        }
    }

    /// Followers followed by following, in display order.
    pub fn connections(&self) -> Vec<&UserRef> {
        self.view()
            .map(|v| {
                v.profile
                    .followers
                    .iter()
                    .chain(v.profile.following.iter())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn selected_connection(&self) -> Option<&UserRef> {
        self.connections().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.connections().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn begin_edit(&mut self) -> bool {
        let draft = match self.view() {
            Some(view) if view.is_own => ProfileDraft::from_profile(&view.profile),
            _ => return false,
        };
        self.draft = Some(draft);
        self.error = None;
        true
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    pub fn begin_save(&mut self) -> Option<ProfileUpdate> {
        if self.busy {
            return None;
        }
        let update = self.draft.as_ref()?.to_update();
        if update.name.is_empty() {
            self.error = Some("Name is required".to_string());
            return None;
        }
        self.busy = true;
        self.error = None;
        Some(update)
    }

    /// Returns `true` when the profile should be reloaded.
    pub fn apply_saved(&mut self, result: ApiResult<()>) -> bool {
        self.busy = false;
        match result {
            Ok(()) => {
                self.draft = None;
                true
            }
            Err(e) => {
                tracing::warn!("updating profile failed: {e}");
                self.error = Some(e.user_message("Failed to update profile"));
                false
            }
        }
    }

    /// The user id to act on and whether the request is an unfollow.
    pub fn begin_follow(&mut self) -> Option<(String, bool)> {
        if self.busy {
            return None;
        }
        let view = self.view().filter(|v| !v.is_own)?;
        let request = (view.profile.id.clone(), view.is_following);
        self.busy = true;
        self.error = None;
        Some(request)
    }

    pub fn apply_follow(&mut self, result: ApiResult<()>) -> bool {
        self.busy = false;
        match result {
            Ok(()) => {
                if let ProfileStatus::Ready(ref mut view) = self.status {
                    view.is_following = !view.is_following;
                }
                true
            }
            Err(e) => {
                tracing::warn!("follow toggle failed: {e}");
                self.error = Some(e.user_message("Failed to update follow status"));
                false
            }
        }
    }

    pub fn can_change_avatar(&self) -> bool {
        !self.busy && self.view().is_some_and(|v| v.is_own)
    }

    pub fn begin_avatar(&mut self) {
        self.busy = true;
        self.error = None;
    }

    pub fn apply_avatar(&mut self, result: ApiResult<()>) -> bool {
        self.busy = false;
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("avatar upload failed: {e}");
                self.error = Some(e.user_message("Failed to upload profile picture"));
                false
            }
        }
    }

    /// Record a failure that happened before any request was sent.
    pub fn fail_avatar(&mut self, error: &ApiClientError) {
        self.busy = false;
        self.error = Some(error.user_message("Failed to upload profile picture"));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn profile_json(id: &str, name: &str, followers: &[&str]) -> serde_json::Value {
        let followers: Vec<_> = followers
            .iter()
            .map(|f| serde_json::json!({"_id": f, "name": f.to_uppercase()}))
            .collect();
        serde_json::json!({
            "_id": id,
            "name": name,
            "headline": "Engineer",
            "followers": followers,
            "following": []
        })
    }

    async fn mount_profile(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(server.uri(), server.uri()).with_token(Some("tok".into()))
    }

    fn ready_state(view: ProfileView) -> ProfileState {
        let mut state = ProfileState::new(ProfileTarget::Me);
        state.apply_loaded(Ok(view));
        state
    }

    fn profile(id: &str) -> Profile {
        serde_json::from_value(profile_json(id, id, &[])).unwrap()
    }

    #[tokio::test]
    async fn own_profile_via_me_uses_single_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile/me/details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("u1", "Ada", &[])))
            .expect(1)
            .mount(&server)
            .await;

        let view = load_profile_view(&client(&server), &ProfileTarget::Me)
            .await
            .unwrap();
        assert!(view.is_own);
        assert!(!view.is_following);
    }

    #[tokio::test]
    async fn own_profile_via_explicit_id_is_own() {
        let server = MockServer::start().await;
        mount_profile(&server, "/api/profile/me/details", profile_json("u1", "Ada", &[])).await;
        mount_profile(&server, "/api/profile/u1", profile_json("u1", "Ada", &[])).await;

        let view = load_profile_view(&client(&server), &ProfileTarget::User("u1".into()))
            .await
            .unwrap();
        assert!(view.is_own);
        assert!(!view.is_following);
    }

    #[tokio::test]
    async fn other_profile_reports_following_membership() {
        let server = MockServer::start().await;
        mount_profile(&server, "/api/profile/me/details", profile_json("u1", "Ada", &[])).await;
        mount_profile(&server, "/api/profile/u2", profile_json("u2", "Bob", &["u1"])).await;
        mount_profile(&server, "/api/profile/u3", profile_json("u3", "Cy", &["u9"])).await;

        let api = client(&server);
        let bob = load_profile_view(&api, &ProfileTarget::User("u2".into()))
            .await
            .unwrap();
        assert!(!bob.is_own);
        assert!(bob.is_following);

        let cy = load_profile_view(&api, &ProfileTarget::User("u3".into()))
            .await
            .unwrap();
        assert!(!cy.is_following);
    }

    #[tokio::test]
    async fn missing_profile_renders_not_found_without_controls() {
        let server = MockServer::start().await;
        mount_profile(&server, "/api/profile/me/details", profile_json("u1", "Ada", &[])).await;
        Mock::given(method("GET"))
            .and(path("/api/profile/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let target = ProfileTarget::User("ghost".into());
        let result = load_profile_view(&client(&server), &target).await;
        let mut state = ProfileState::new(target);
        state.apply_loaded(result.map_err(Arc::new));

        assert_eq!(
            state.status,
            ProfileStatus::Failed("Profile not found".into())
        );
        assert!(!state.begin_edit());
        assert!(state.begin_follow().is_none());
        assert!(!state.can_change_avatar());
    }

    #[tokio::test]
    async fn self_fetch_failure_fails_the_whole_view() {
        let server = MockServer::start().await;
        mount_profile(&server, "/api/profile/u2", profile_json("u2", "Bob", &[])).await;
        Mock::given(method("GET"))
            .and(path("/api/profile/me/details"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let target = ProfileTarget::User("u2".into());
        let result = load_profile_view(&client(&server), &target).await;
        let mut state = ProfileState::new(target);
        state.apply_loaded(result.map_err(Arc::new));
        assert_eq!(
            state.status,
            ProfileStatus::Failed("Failed to load profile".into())
        );
    }

    #[tokio::test]
    async fn follow_then_unfollow_restores_membership() {
        let server = MockServer::start().await;
        let api = client(&server);
        mount_profile(&server, "/api/profile/me/details", profile_json("u1", "Ada", &[])).await;
        mount_profile(&server, "/api/profile/u2", profile_json("u2", "Bob", &[])).await;
        Mock::given(method("POST"))
            .and(path("/api/follow/u2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/follow/u2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let target = ProfileTarget::User("u2".into());
        let mut state = ProfileState::new(target.clone());
        state.apply_loaded(load_profile_view(&api, &target).await.map_err(Arc::new));
        assert!(!state.view().unwrap().is_following);

        let (id, unfollow) = state.begin_follow().unwrap();
        assert!(!unfollow);
        let result = api.follow(&id).await.map_err(Arc::new);
        assert!(state.apply_follow(result));
        assert!(state.view().unwrap().is_following);

        let (id, unfollow) = state.begin_follow().unwrap();
        assert!(unfollow);
        let result = api.unfollow(&id).await.map_err(Arc::new);
        assert!(state.apply_follow(result));
        assert!(!state.view().unwrap().is_following);
    }

    #[test]
    fn edit_draft_is_seeded_and_cancel_discards() {
        let mut state = ready_state(ProfileView::compose(profile("u1"), &profile("u1")));
        assert!(state.begin_edit());
        let draft = state.draft.as_mut().unwrap();
        assert_eq!(draft.name, "u1");
        assert_eq!(draft.headline, "Engineer");
        draft.push_char('!');
        state.cancel_edit();
        assert!(state.draft.is_none());
        assert_eq!(state.view().unwrap().profile.name, "u1");
    }

    #[test]
    fn save_requires_name_and_closes_draft_on_success() {
        let mut state = ready_state(ProfileView::compose(profile("u1"), &profile("u1")));
        state.begin_edit();
        state.draft.as_mut().unwrap().name = "  ".into();
        assert!(state.begin_save().is_none());
        assert_eq!(state.error.as_deref(), Some("Name is required"));

        state.draft.as_mut().unwrap().name = "Ada".into();
        let update = state.begin_save().unwrap();
        assert_eq!(update.name, "Ada");
        assert!(state.apply_saved(Ok(())));
        assert!(state.draft.is_none());
    }

    #[test]
    fn action_failures_keep_view_and_set_message() {
        let mut state = ready_state(ProfileView::compose(profile("u2"), &profile("u1")));
        state.begin_follow().unwrap();
        let err = Arc::new(ApiClientError::Api {
            status: 500,
            detail: String::new(),
        });
        assert!(!state.apply_follow(Err(err.clone())));
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to update follow status")
        );
        assert!(state.view().is_some());
        assert!(!state.view().unwrap().is_following);

        assert!(!state.begin_edit(), "cannot edit someone else's profile");
        assert!(!state.apply_avatar(Err(err)));
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to upload profile picture")
        );
    }

    #[test]
    fn connections_chain_followers_then_following() {
        let mut profile: Profile =
            serde_json::from_value(profile_json("u1", "Ada", &["u2", "u3"])).unwrap();
        profile.following.push(UserRef {
            id: "u4".into(),
            name: "Dee".into(),
            avatar_url: None,
        });
        let me = profile.clone();
        let mut state = ready_state(ProfileView::compose(profile, &me));

        let ids: Vec<_> = state.connections().iter().map(|u| u.id.clone()).collect();
        assert_eq!(ids, ["u2", "u3", "u4"]);
        state.select_next();
        state.select_next();
        state.select_next();
        assert_eq!(state.selected_connection().unwrap().id, "u4");
    }

    #[test]
    fn draft_focus_cycles() {
        let mut draft = ProfileDraft::from_profile(&profile("u1"));
        draft.focus_prev();
        assert_eq!(draft.focus, DraftField::Bio);
        draft.push_char('x');
        assert_eq!(draft.bio, "x");
        draft.focus_next();
        assert_eq!(draft.focus, DraftField::Name);
    }
}
