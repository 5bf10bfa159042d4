use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::api::ApiClient;
use crate::api::media::ImageUpload;
use crate::api::profile::ProfileTarget;
use crate::auth::flow::{AuthForm, AuthMode, AuthPhase, Submission};
use crate::auth::session::SessionStore;
use crate::command::{self, Command};
use crate::config::{AppConfig, DefaultView};
use crate::event::{ApiEvent, ApiRequest, ApiResult, AppEvent, Event, EventHandler, ViewKind};
use crate::feed::FeedState;
use crate::guard;
use crate::profile::{ProfileState, load_profile_view};
use crate::ui;

// ---------------------------------------------------------------------------
// App mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Command,
    /// Typing into the feed's compose box.
    Compose,
    /// Editing the profile draft.
    Edit,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: AppConfig,

    // Backend access; the token is attached per request from `session`.
    pub api: ApiClient,
    pub session: SessionStore,

    // View system
    pub view_stack: Vec<ViewKind>,
    pub mode: AppMode,
    /// Bumped on every screen entry; completions from older epochs are dropped.
    pub epoch: u64,

    // Screen state
    pub auth: AuthForm,
    pub feed: FeedState,
    pub profile: ProfileState,

    // Input state
    pub command_input: String,

    // Status
    pub status_message: Option<String>,
    pub last_error: Option<String>,
    pub error_detail: Option<String>,
    pub in_flight: usize,
}

impl App {
    pub fn new(config: AppConfig, api: ApiClient, session: SessionStore, events: EventHandler) -> Self {
        Self {
            running: true,
            events,
            config,
            api,
            session,
            view_stack: Vec::new(),
            mode: AppMode::Normal,
            epoch: 0,
            auth: AuthForm::sign_in(),
            feed: FeedState::default(),
            profile: ProfileState::new(ProfileTarget::Me),
            command_input: String::new(),
            status_message: None,
            last_error: None,
            error_detail: None,
            in_flight: 0,
        }
    }

    /// Enter the first screen: the configured default when signed in,
    /// otherwise sign-in.
    pub fn start(&mut self) {
        let initial = match self.config.default_view {
            DefaultView::Feed => ViewKind::Feed,
            DefaultView::Profile => ViewKind::Profile(None),
        };
        self.reset_to(initial);
    }

    // -- Main event loop ----------------------------------------------------

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        self.start();

        while self.running {
            terminal.draw(|frame| self.draw(frame))?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => {
                    if let crossterm::event::Event::Key(key) = event
                        && key.kind == crossterm::event::KeyEventKind::Press
                    {
                        self.handle_key_event(key);
                    }
                }
                Event::App(app_event) => self.handle_app_event(*app_event),
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        ui::draw(frame, self);
    }

    fn tick(&self) {}

    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    // -- View stack ---------------------------------------------------------

    pub fn current_view(&self) -> Option<&ViewKind> {
        self.view_stack.last()
    }

    /// The view underneath an overlay such as Help.
    pub fn base_view(&self) -> Option<&ViewKind> {
        self.view_stack.iter().rev().find(|v| **v != ViewKind::Help)
    }

    /// Push `kind` and run its entry logic. Help is an overlay and does not
    /// start a new screen.
    pub fn push_view(&mut self, kind: ViewKind) {
        if kind == ViewKind::Help {
            if self.current_view() != Some(&ViewKind::Help) {
                self.view_stack.push(kind);
            }
            return;
        }
        if kind.is_protected() && guard::require_session(&self.session).is_none() {
            self.redirect_to_sign_in();
            return;
        }
        if self.current_view() != Some(&kind) {
            self.view_stack.push(kind);
        }
        self.enter_current();
    }

    pub fn pop_view(&mut self) {
        if self.view_stack.len() <= 1 {
            return;
        }
        let popped = self.view_stack.pop();
        if popped != Some(ViewKind::Help) {
            self.enter_current();
        }
    }

    /// Replace the whole history with a single screen.
    pub fn reset_to(&mut self, kind: ViewKind) {
        if kind.is_protected() && guard::require_session(&self.session).is_none() {
            self.redirect_to_sign_in();
            return;
        }
        self.view_stack = vec![kind];
        self.enter_current();
    }

    fn redirect_to_sign_in(&mut self) {
        tracing::debug!("no session, redirecting to sign-in");
        self.view_stack = vec![ViewKind::SignIn];
        self.enter_current();
    }

    /// Start a fresh screen for the top of the stack.
    fn enter_current(&mut self) {
        self.epoch += 1;
        self.mode = AppMode::Normal;

        let Some(kind) = self.current_view().cloned() else {
            return;
        };
        tracing::debug!(epoch = self.epoch, view = ?kind, "entering view");

        match kind {
            ViewKind::SignIn => self.auth = AuthForm::sign_in(),
            ViewKind::SignUp => self.auth = AuthForm::sign_up(),
            ViewKind::Feed => {
                // Every entry is a fresh screen; anything in flight for the
                // previous one is dropped by epoch.
                self.feed = FeedState::default();
                self.feed.begin_load();
                self.request(ApiRequest::ListPosts);
            }
            ViewKind::Profile(id) => {
                let target = ProfileTarget::from_id(id);
                self.profile = ProfileState::new(target.clone());
                self.request(ApiRequest::LoadProfile(target));
            }
            ViewKind::Help => {}
        }
    }

    // -- Key event routing --------------------------------------------------

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        // Ctrl-C always quits.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c' | 'C'))
        {
            self.events.send(AppEvent::Quit);
            return;
        }

        if self.error_detail.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_detail = None;
            }
            return;
        }

        if self.current_view() == Some(&ViewKind::Help) {
            if matches!(key.code, KeyCode::Char('q' | '?') | KeyCode::Esc) {
                self.events.send(AppEvent::Back);
            }
            return;
        }

        match self.mode {
            AppMode::Command => self.handle_command_key(key),
            AppMode::Compose => self.handle_compose_key(key),
            AppMode::Edit => self.handle_edit_key(key),
            AppMode::Normal => match self.current_view() {
                Some(ViewKind::SignIn | ViewKind::SignUp) => self.handle_auth_key(key),
                Some(ViewKind::Feed) => self.handle_feed_key(key),
                Some(ViewKind::Profile(_)) => self.handle_profile_key(key),
                _ => {}
            },
        }
    }

    fn handle_auth_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if matches!(key.code, KeyCode::Char('n' | 'N')) {
                let next = match self.auth.mode {
                    AuthMode::SignIn => ViewKind::SignUp,
                    AuthMode::SignUp => ViewKind::SignIn,
                };
                self.events.send(AppEvent::Navigate(next));
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                if self.view_stack.len() > 1 {
                    self.events.send(AppEvent::Back);
                } else {
                    self.events.send(AppEvent::Quit);
                }
            }
            KeyCode::Tab | KeyCode::Down => self.auth.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.auth.focus_prev(),
            KeyCode::Enter => self.submit_auth(),
            KeyCode::Backspace => self.auth.pop_char(),
            KeyCode::Char(c) => self.auth.push_char(c),
            _ => {}
        }
    }

    fn handle_feed_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Esc if self.view_stack.len() > 1 => self.events.send(AppEvent::Back),
            KeyCode::Char('j') | KeyCode::Down => self.feed.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.feed.select_prev(),
            KeyCode::Char('c') | KeyCode::Char('i') => self.mode = AppMode::Compose,
            KeyCode::Char('l') => {
                if let Some(post) = self.feed.selected_post() {
                    let id = post.id.clone();
                    self.request(ApiRequest::Like(id));
                }
            }
            KeyCode::Char('x') => self.feed.compose.remove_image(),
            KeyCode::Char('o') => self.open_selected_image(),
            KeyCode::Char('p') => self.events.send(AppEvent::Navigate(ViewKind::Profile(None))),
            KeyCode::Char('r') => {
                self.feed.begin_load();
                self.request(ApiRequest::ListPosts);
            }
            KeyCode::Char('E') => self.error_detail = self.last_error.clone(),
            KeyCode::Char('?') => self.events.send(AppEvent::Navigate(ViewKind::Help)),
            KeyCode::Char(':') => {
                self.mode = AppMode::Command;
                self.command_input.clear();
            }
            _ => {}
        }
    }

    fn handle_profile_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.view_stack.len() > 1 {
                    self.events.send(AppEvent::Back);
                } else {
                    self.events.send(AppEvent::Navigate(ViewKind::Feed));
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.profile.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.profile.select_prev(),
            KeyCode::Enter => {
                if let Some(user) = self.profile.selected_connection() {
                    let id = user.id.clone();
                    self.events
                        .send(AppEvent::Navigate(ViewKind::Profile(Some(id))));
                }
            }
            KeyCode::Char('e') => {
                if self.profile.begin_edit() {
                    self.mode = AppMode::Edit;
                }
            }
            KeyCode::Char('f') => {
                if let Some((user_id, following)) = self.profile.begin_follow() {
                    self.request(ApiRequest::Follow { user_id, following });
                }
            }
            KeyCode::Char('a') => {
                if self.profile.can_change_avatar() {
                    self.mode = AppMode::Command;
                    self.command_input = "avatar ".to_string();
                }
            }
            KeyCode::Char('r') => {
                let target = self.profile.target.clone();
                self.request(ApiRequest::LoadProfile(target));
            }
            KeyCode::Char('E') => self.error_detail = self.last_error.clone(),
            KeyCode::Char('?') => self.events.send(AppEvent::Navigate(ViewKind::Help)),
            KeyCode::Char(':') => {
                self.mode = AppMode::Command;
                self.command_input.clear();
            }
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
                self.execute_command();
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(c) => {
                self.command_input.push(c);
            }
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.mode = AppMode::Normal;
            return;
        }
        // The form is cleared when the pending post lands.
        if self.feed.submitting {
            return;
        }
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.feed.compose.content.push('\n');
            }
            KeyCode::Enter => self.submit_post(),
            KeyCode::Backspace => {
                self.feed.compose.content.pop();
            }
            KeyCode::Char(c) => self.feed.compose.content.push(c),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.profile.cancel_edit();
                self.mode = AppMode::Normal;
            }
            KeyCode::Enter => {
                if let Some(update) = self.profile.begin_save() {
                    self.request(ApiRequest::UpdateProfile(update));
                }
            }
            _ => {
                let Some(draft) = self.profile.draft.as_mut() else {
                    self.mode = AppMode::Normal;
                    return;
                };
                match key.code {
                    KeyCode::Tab | KeyCode::Down => draft.focus_next(),
                    KeyCode::BackTab | KeyCode::Up => draft.focus_prev(),
                    KeyCode::Backspace => draft.pop_char(),
                    KeyCode::Char(c) => draft.push_char(c),
                    _ => {}
                }
            }
        }
    }

    // -- Screen actions -----------------------------------------------------

    fn submit_auth(&mut self) {
        let Some(submission) = self.auth.begin_submit() else {
            return;
        };
        let request = match submission {
            Submission::Login { email, password } => ApiRequest::Login { email, password },
            Submission::Signup {
                name,
                email,
                password,
            } => ApiRequest::Signup {
                name,
                email,
                password,
            },
        };
        self.request(request);
    }

    /// Empty or whitespace-only content is ignored.
    fn submit_post(&mut self) {
        if let Some((content, image)) = self.feed.begin_submit() {
            self.mode = AppMode::Normal;
            self.request(ApiRequest::CreatePost { content, image });
        }
    }

    fn open_selected_image(&mut self) {
        let Some(path) = self
            .feed
            .selected_post()
            .and_then(|p| p.image_url.clone())
        else {
            self.status_message = Some("Selected post has no image".to_string());
            return;
        };
        let Some(url) = self.api.media_url(&path) else {
            self.status_message = Some(format!("Invalid image URL: {path}"));
            return;
        };
        if let Err(e) = open::that(&url) {
            tracing::warn!(%url, "failed to open image: {e}");
            self.status_message = Some("Failed to open image".to_string());
            self.last_error = Some(e.to_string());
        }
    }

    fn stage_image(&mut self, path: &Path) {
        if self.base_view() != Some(&ViewKind::Feed) {
            self.status_message = Some("Images can only be attached on the feed".to_string());
            return;
        }
        match self.feed.compose.stage_image(path) {
            Ok(()) => self.status_message = None,
            Err(e) => {
                self.status_message = Some(e.user_message("Failed to read image"));
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn upload_avatar(&mut self, path: &Path) {
        if !matches!(self.base_view(), Some(ViewKind::Profile(_))) || !self.profile.can_change_avatar()
        {
            self.status_message = Some("Open your own profile to change the photo".to_string());
            return;
        }
        match ImageUpload::from_path(path) {
            Ok(upload) => {
                self.profile.begin_avatar();
                self.request(ApiRequest::UploadAvatar(upload));
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.profile.fail_avatar(&e);
            }
        }
    }

    // -- Command execution --------------------------------------------------

    fn execute_command(&mut self) {
        let input = std::mem::take(&mut self.command_input);
        match command::parse_command(&input) {
            Some(Command::Feed) => self.events.send(AppEvent::Navigate(ViewKind::Feed)),
            Some(Command::Profile(id)) => {
                self.events.send(AppEvent::Navigate(ViewKind::Profile(id)));
            }
            Some(Command::Image(path)) => self.stage_image(&path),
            Some(Command::Avatar(path)) => self.upload_avatar(&path),
            Some(Command::Logout) => self.events.send(AppEvent::Logout),
            Some(Command::SignUp) => self.events.send(AppEvent::Navigate(ViewKind::SignUp)),
            Some(Command::SignIn) => self.events.send(AppEvent::Navigate(ViewKind::SignIn)),
            Some(Command::Help) => self.events.send(AppEvent::Navigate(ViewKind::Help)),
            Some(Command::Quit) => self.events.send(AppEvent::Quit),
            None => {
                self.status_message = Some(format!("Unknown command: {input}"));
            }
        }
    }

    // -- App event handling -------------------------------------------------

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => {
                self.running = false;
            }
            AppEvent::Navigate(kind) => self.push_view(kind),
            AppEvent::Back => self.pop_view(),
            AppEvent::Logout => self.logout(),
            AppEvent::Api { epoch, event } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if epoch != self.epoch {
                    tracing::debug!(epoch, current = self.epoch, "dropping stale response");
                    return;
                }
                self.handle_api_event(event);
            }
            AppEvent::SignupRedirect { epoch } => {
                if epoch == self.epoch && matches!(self.auth.phase, AuthPhase::Success(_)) {
                    self.auth.begin_redirect();
                    self.reset_to(ViewKind::SignIn);
                }
            }
        }
    }

    fn handle_api_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::LoggedIn(result) => {
                self.note_error(&result);
                if let Some(resp) = self.auth.apply_login(result) {
                    if let Err(e) = self.session.set_session(&resp.token, &resp.name) {
                        tracing::error!("failed to persist session: {e}");
                        self.error_detail = Some(format!("Could not save session: {e}"));
                    }
                    self.status_message = Some(format!("Signed in as {}", resp.name));
                    self.reset_to(ViewKind::Feed);
                }
            }
            ApiEvent::SignedUp(result) => {
                self.note_error(&result);
                if self.auth.apply_signup(result) {
                    self.schedule_signup_redirect();
                }
            }
            ApiEvent::PostsLoaded(result) => {
                self.note_error(&result);
                self.feed.apply_posts_loaded(result);
            }
            ApiEvent::PostCreated(result) => {
                self.note_error(&result);
                if self.feed.apply_post_created(result) {
                    self.request(ApiRequest::ListPosts);
                }
            }
            ApiEvent::LikeApplied(result) => {
                if self.feed.apply_like(result) {
                    self.request(ApiRequest::ListPosts);
                }
            }
            ApiEvent::ProfileLoaded(result) => {
                self.note_error(&result);
                self.profile.apply_loaded(result);
            }
            ApiEvent::ProfileSaved(result) => {
                self.note_error(&result);
                if self.profile.apply_saved(result) {
                    self.mode = AppMode::Normal;
                    self.reload_profile();
                }
            }
            ApiEvent::AvatarUploaded(result) => {
                self.note_error(&result);
                if self.profile.apply_avatar(result) {
                    self.reload_profile();
                }
            }
            ApiEvent::FollowToggled(result) => {
                self.note_error(&result);
                if self.profile.apply_follow(result) {
                    self.reload_profile();
                }
            }
        }
    }

    fn note_error<T>(&mut self, result: &ApiResult<T>) {
        if let Err(e) = result {
            self.last_error = Some(e.to_string());
        }
    }

    fn reload_profile(&mut self) {
        self.profile.begin_load();
        let target = self.profile.target.clone();
        self.request(ApiRequest::LoadProfile(target));
    }

    fn logout(&mut self) {
        if let Err(e) = self.session.clear_session() {
            tracing::error!("failed to clear session: {e}");
            self.error_detail = Some(format!("Could not remove saved session: {e}"));
        }
        self.feed = FeedState::default();
        self.profile = ProfileState::new(ProfileTarget::Me);
        self.status_message = Some("Signed out".to_string());
        self.reset_to(ViewKind::SignIn);
    }

    fn schedule_signup_redirect(&self) {
        let sender = self.events.sender();
        let epoch = self.epoch;
        let delay = Duration::from_secs(self.config.signup_redirect_secs);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(Event::App(Box::new(AppEvent::SignupRedirect { epoch })));
        });
    }

    // -- API dispatch -------------------------------------------------------

    /// Run `request` in a background task, tagged with the current epoch.
    fn request(&mut self, request: ApiRequest) {
        let needs_session = !matches!(request, ApiRequest::Login { .. } | ApiRequest::Signup { .. });
        let token = guard::require_session(&self.session).map(|s| s.token.clone());
        if needs_session && token.is_none() {
            self.redirect_to_sign_in();
            return;
        }

        let api = self.api.clone().with_token(token);
        let sender = self.events.sender();
        let epoch = self.epoch;
        self.in_flight += 1;

        tokio::spawn(async move {
            let event = match request {
                ApiRequest::Login { email, password } => {
                    ApiEvent::LoggedIn(api.login(&email, &password).await.map_err(Arc::new))
                }
                ApiRequest::Signup {
                    name,
                    email,
                    password,
                } => ApiEvent::SignedUp(
                    api.signup(&name, &email, &password)
                        .await
                        .map_err(Arc::new),
                ),
                ApiRequest::ListPosts => {
                    ApiEvent::PostsLoaded(api.list_posts().await.map_err(Arc::new))
                }
                ApiRequest::CreatePost { content, image } => ApiEvent::PostCreated(
                    api.create_post(&content, image).await.map_err(Arc::new),
                ),
                ApiRequest::Like(post_id) => {
                    ApiEvent::LikeApplied(api.like_post(&post_id).await.map_err(Arc::new))
                }
                ApiRequest::LoadProfile(target) => ApiEvent::ProfileLoaded(
                    load_profile_view(&api, &target).await.map_err(Arc::new),
                ),
                ApiRequest::UpdateProfile(update) => {
                    ApiEvent::ProfileSaved(api.update_profile(&update).await.map_err(Arc::new))
                }
                ApiRequest::UploadAvatar(image) => {
                    ApiEvent::AvatarUploaded(api.upload_avatar(image).await.map_err(Arc::new))
                }
                ApiRequest::Follow { user_id, following } => {
                    let result = if following {
                        api.unfollow(&user_id).await
                    } else {
                        api.follow(&user_id).await
                    };
                    ApiEvent::FollowToggled(result.map_err(Arc::new))
                }
            };
            let _ = sender.send(Event::App(Box::new(AppEvent::Api { epoch, event })));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClientError;
    use crate::feed::ComposeForm;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(server: &MockServer, dir: &TempDir, token: Option<&str>) -> App {
        let mut session = SessionStore::init(dir.path().join("session.json"));
        if let Some(token) = token {
            session.set_session(token, "Ada").unwrap();
        }
        let config = AppConfig {
            signup_redirect_secs: 0,
            ..AppConfig::default()
        };
        App::new(
            config,
            ApiClient::new(server.uri(), server.uri()),
            session,
            EventHandler::detached(),
        )
    }

    /// Feed queued app events back into the app until `done` holds.
    async fn pump_until(app: &mut App, done: impl Fn(&App) -> bool) {
        for _ in 0..20 {
            if done(app) {
                return;
            }
            let event = tokio::time::timeout(Duration::from_secs(5), app.events.next())
                .await
                .unwrap()
                .unwrap();
            if let Event::App(e) = event {
                app.handle_app_event(*e);
            }
        }
        panic!("condition not reached");
    }

    async fn mount_posts(server: &MockServer, posts: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/posts/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(posts))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn protected_start_without_session_goes_to_sign_in() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, None);

        app.start();
        assert_eq!(app.view_stack, vec![ViewKind::SignIn]);

        app.push_view(ViewKind::Profile(Some("u2".into())));
        assert_eq!(app.view_stack, vec![ViewKind::SignIn]);
        assert_eq!(app.in_flight, 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn start_with_session_loads_feed() {
        let server = MockServer::start().await;
        mount_posts(
            &server,
            serde_json::json!([{"_id": "p1", "content": "hi", "likes": []}]),
        )
        .await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));

        app.start();
        assert_eq!(app.current_view(), Some(&ViewKind::Feed));
        pump_until(&mut app, |a| !a.feed.posts.is_empty()).await;
        assert_eq!(app.feed.posts[0].id, "p1");
        assert!(!app.loading());
    }

    #[tokio::test]
    async fn stale_responses_are_dropped() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.view_stack = vec![ViewKind::Feed];
        app.epoch = 5;
        app.in_flight = 1;

        app.handle_app_event(AppEvent::Api {
            epoch: 4,
            event: ApiEvent::PostsLoaded(Ok(vec![])),
        });
        assert!(app.feed.error.is_none());
        assert!(app.feed.posts.is_empty());
        assert_eq!(app.in_flight, 0);

        let err = Arc::new(ApiClientError::Api {
            status: 500,
            detail: String::new(),
        });
        app.handle_app_event(AppEvent::Api {
            epoch: 5,
            event: ApiEvent::PostsLoaded(Err(err)),
        });
        assert_eq!(app.feed.error.as_deref(), Some("Failed to load posts"));
    }

    #[tokio::test]
    async fn empty_post_submission_is_a_no_op() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.view_stack = vec![ViewKind::Feed];
        app.mode = AppMode::Compose;
        app.feed.compose.content = "   ".into();

        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.in_flight, 0);
        assert_eq!(app.mode, AppMode::Compose);
        assert_eq!(app.feed.compose.content, "   ");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_stores_session_and_opens_feed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": "t1", "name": "Ada"})),
            )
            .mount(&server)
            .await;
        mount_posts(&server, serde_json::json!([])).await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, None);
        app.start();

        for c in "a@x.com".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Tab));
        for c in "secret1".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.auth.phase, AuthPhase::Submitting);

        pump_until(&mut app, |a| a.current_view() == Some(&ViewKind::Feed)).await;
        assert_eq!(app.session.get_session().map(|s| s.token.as_str()), Some("t1"));
        assert_eq!(app.view_stack, vec![ViewKind::Feed]);
    }

    #[tokio::test]
    async fn signup_success_redirects_to_sign_in() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, None);
        app.reset_to(ViewKind::SignUp);
        let epoch = app.epoch;

        app.handle_app_event(AppEvent::Api {
            epoch,
            event: ApiEvent::SignedUp(Ok(())),
        });
        assert!(matches!(app.auth.phase, AuthPhase::Success(_)));

        pump_until(&mut app, |a| a.current_view() == Some(&ViewKind::SignIn)).await;
        assert_eq!(app.auth.mode, AuthMode::SignIn);
    }

    #[tokio::test]
    async fn signup_redirect_is_ignored_after_leaving() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, None);
        app.reset_to(ViewKind::SignUp);
        let epoch = app.epoch;
        app.auth.phase = AuthPhase::Success("ok".into());

        app.push_view(ViewKind::SignIn);
        app.push_view(ViewKind::SignUp);
        app.handle_app_event(AppEvent::SignupRedirect { epoch });
        assert_eq!(app.current_view(), Some(&ViewKind::SignUp));
    }

    #[tokio::test]
    async fn logout_clears_session_and_returns_to_sign_in() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.view_stack = vec![ViewKind::Feed];

        app.handle_app_event(AppEvent::Logout);
        assert!(app.session.get_session().is_none());
        assert_eq!(app.view_stack, vec![ViewKind::SignIn]);

        app.handle_app_event(AppEvent::Navigate(ViewKind::Feed));
        assert_eq!(app.view_stack, vec![ViewKind::SignIn]);
    }

    #[tokio::test]
    async fn help_overlay_keeps_epoch() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, None);
        app.start();
        let epoch = app.epoch;

        app.push_view(ViewKind::Help);
        assert_eq!(app.current_view(), Some(&ViewKind::Help));
        assert_eq!(app.base_view(), Some(&ViewKind::SignIn));
        app.pop_view();
        assert_eq!(app.epoch, epoch);
        assert_eq!(app.current_view(), Some(&ViewKind::SignIn));
    }

    #[tokio::test]
    async fn failed_login_keeps_form_contents() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, None);
        app.start();
        app.auth.email = "a@x.com".into();
        app.auth.password = "nope".into();
        app.auth.begin_submit();
        let epoch = app.epoch;

        let err = Arc::new(ApiClientError::Auth {
            message: "Invalid credentials".into(),
        });
        app.handle_app_event(AppEvent::Api {
            epoch,
            event: ApiEvent::LoggedIn(Err(err)),
        });
        assert_eq!(app.current_view(), Some(&ViewKind::SignIn));
        assert_eq!(app.auth.error.as_deref(), Some("Invalid credentials"));
        assert_eq!(app.auth.email, "a@x.com");
        assert!(app.session.get_session().is_none());
    }

    #[tokio::test]
    async fn image_command_stages_on_feed_only() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("pic.png");
        std::fs::write(&image, b"png").unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.view_stack = vec![ViewKind::Feed];

        app.command_input = format!("image {}", image.display());
        app.execute_command();
        assert!(app.feed.compose.image.is_some());

        app.feed.compose.remove_image();
        app.view_stack = vec![ViewKind::SignIn];
        app.command_input = format!("image {}", image.display());
        app.execute_command();
        assert!(app.feed.compose.image.is_none());
    }

    #[tokio::test]
    async fn reentering_feed_discards_pending_compose_text() {
        let server = MockServer::start().await;
        mount_posts(&server, serde_json::json!([])).await;
        Mock::given(method("POST"))
            .and(path("/api/posts/create"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.start();

        app.handle_key_event(key(KeyCode::Char('c')));
        for c in "hello".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Enter));
        assert!(app.feed.submitting);

        // No edits while the post is on its way.
        app.mode = AppMode::Compose;
        app.handle_key_event(key(KeyCode::Char('!')));
        app.handle_key_event(key(KeyCode::Backspace));
        assert_eq!(app.feed.compose.content, "hello");

        app.push_view(ViewKind::Profile(None));
        app.pop_view();
        assert_eq!(app.current_view(), Some(&ViewKind::Feed));
        assert_eq!(app.feed.compose, ComposeForm::default());
        assert!(!app.feed.submitting);

        pump_until(&mut app, |a| a.in_flight == 0).await;
        assert_eq!(app.feed.compose, ComposeForm::default());
    }

    #[tokio::test]
    async fn created_post_shows_up_after_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_posts(
            &server,
            serde_json::json!([{"_id": "p1", "userName": "Ada", "content": "hello", "likes": []}]),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/api/posts/create"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.start();
        pump_until(&mut app, |a| !a.loading()).await;
        assert!(app.feed.posts.is_empty());

        app.handle_key_event(key(KeyCode::Char('c')));
        for c in "hello".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Enter));

        pump_until(&mut app, |a| !a.feed.posts.is_empty()).await;
        assert_eq!(app.feed.posts[0].content, "hello");
        assert_eq!(app.feed.compose, ComposeForm::default());
        assert!(!app.feed.submitting);
    }

    #[tokio::test]
    async fn like_refetch_shows_one_more_like() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"_id": "p1", "content": "hello", "likes": []}
            ])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        mount_posts(
            &server,
            serde_json::json!([{"_id": "p1", "content": "hello", "likes": ["u1"]}]),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/api/posts/p1/like"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.start();
        pump_until(&mut app, |a| !a.feed.posts.is_empty()).await;
        assert_eq!(app.feed.posts[0].like_count(), 0);

        app.handle_key_event(key(KeyCode::Char('l')));
        pump_until(&mut app, |a| a.feed.posts[0].like_count() > 0).await;
        assert_eq!(app.feed.posts[0].like_count(), 1);
        pump_until(&mut app, |a| a.in_flight == 0).await;
    }

    fn bob_with_followers(ids: &[&str]) -> serde_json::Value {
        let followers: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({"_id": id, "name": id}))
            .collect();
        serde_json::json!({"_id": "u2", "name": "Bob", "followers": followers, "following": []})
    }

    #[tokio::test]
    async fn follow_then_unfollow_restores_followers_after_reload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile/me/details"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"_id": "u1", "name": "Ada"})),
            )
            .mount(&server)
            .await;
        for followers in [&["u3"][..], &["u3", "u1"][..]] {
            Mock::given(method("GET"))
                .and(path("/api/profile/u2"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(bob_with_followers(followers)),
                )
                .up_to_n_times(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/api/profile/u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bob_with_followers(&["u3"])))
            .mount(&server)
            .await;
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

        let dir = TempDir::new().unwrap();
        let mut app = test_app(&server, &dir, Some("tok"));
        app.push_view(ViewKind::Profile(Some("u2".into())));
        pump_until(&mut app, |a| a.profile.view().is_some()).await;
        let follower_ids = |a: &App| -> Vec<String> {
            a.profile
                .view()
                .map(|v| v.profile.followers.iter().map(|f| f.id.clone()).collect())
                .unwrap_or_default()
        };
        let original = follower_ids(&app);
        assert_eq!(original, ["u3"]);
        assert!(!app.profile.view().unwrap().is_following);

        app.handle_key_event(key(KeyCode::Char('f')));
        pump_until(&mut app, |a| follower_ids(a).len() == 2).await;
        assert!(app.profile.view().unwrap().is_following);

        app.handle_key_event(key(KeyCode::Char('f')));
        pump_until(&mut app, |a| follower_ids(a).len() == 1).await;
        assert_eq!(follower_ids(&app), original);
        assert!(!app.profile.view().unwrap().is_following);
    }
}
