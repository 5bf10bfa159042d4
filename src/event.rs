use color_eyre::eyre::OptionExt;
use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::ApiClientError;
use crate::api::media::ImageUpload;
use crate::api::profile::ProfileTarget;
use crate::api::types::{LoginResponse, Post, ProfileUpdate};
use crate::profile::ProfileView;

/// Representation of all possible events.
#[derive(Clone, Debug)]
pub enum Event {
    /// An event that is emitted on a regular schedule.
    Tick,
    /// Crossterm events from the terminal.
    Crossterm(CrosstermEvent),
    /// Application-level events.
    App(Box<AppEvent>),
}

/// Application events for navigation, API requests, and API responses.
#[derive(Clone, Debug)]
pub enum AppEvent {
    // -- Navigation --
    Quit,
    Navigate(ViewKind),
    Back,
    Logout,

    /// Completion of a request issued while `epoch` was current.
    Api { epoch: u64, event: ApiEvent },

    /// The post-signup delay has elapsed.
    SignupRedirect { epoch: u64 },
}

/// Work to run against the backend.
#[derive(Clone, Debug)]
pub enum ApiRequest {
    Login {
        email: String,
        password: String,
    },
    Signup {
        name: String,
        email: String,
        password: String,
    },
    ListPosts,
    CreatePost {
        content: String,
        image: Option<ImageUpload>,
    },
    Like(String),
    LoadProfile(ProfileTarget),
    UpdateProfile(ProfileUpdate),
    UploadAvatar(ImageUpload),
    /// `following` is the state before the toggle.
    Follow { user_id: String, following: bool },
}

#[derive(Clone, Debug)]
pub enum ApiEvent {
    LoggedIn(ApiResult<LoginResponse>),
    SignedUp(ApiResult<()>),
    PostsLoaded(ApiResult<Vec<Post>>),
    PostCreated(ApiResult<()>),
    LikeApplied(ApiResult<()>),
    ProfileLoaded(ApiResult<ProfileView>),
    ProfileSaved(ApiResult<()>),
    AvatarUploaded(ApiResult<()>),
    FollowToggled(ApiResult<()>),
}

/// API result type using `Arc` so errors are `Clone`.
pub type ApiResult<T> = Result<T, Arc<ApiClientError>>;

/// Identifies a view for the view-stack navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    SignIn,
    SignUp,
    Feed,
    Profile(Option<String>), // user id, `None` for self
    Help,
}

impl ViewKind {
    /// Views that need a stored session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Feed | Self::Profile(_))
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::SignIn => "Sign In",
            Self::SignUp => "Sign Up",
            Self::Feed => "Feed",
            Self::Profile(_) => "Profile",
            Self::Help => "Help",
        }
    }
}

/// Terminal event handler.
///
/// Spawns a background task that emits tick and crossterm events, and exposes
/// an unbounded channel for application events.
#[derive(Debug)]
pub struct EventHandler {
    /// Event sender channel.
    sender: mpsc::UnboundedSender<Event>,
    /// Event receiver channel.
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Constructs a new instance of [`EventHandler`] and spawns the event task.
    pub fn new(tick_fps: f64) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = EventTask::new(sender.clone(), tick_fps);
        tokio::spawn(async { actor.run().await });
        Self { sender, receiver }
    }

    /// A handler with no terminal task attached; only app events flow.
    #[cfg(test)]
    pub fn detached() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// Receives the next event, blocking until one is available.
    pub async fn next(&mut self) -> color_eyre::Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("Failed to receive event")
    }

    /// Take an already-queued event without waiting.
    #[cfg(test)]
    pub fn try_next(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Queue an app event to be processed by the event loop.
    pub fn send(&self, app_event: AppEvent) {
        let _ = self.sender.send(Event::App(Box::new(app_event)));
    }

    /// Clone the underlying sender for use in spawned async tasks.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

/// Background task that reads crossterm events and emits ticks.
struct EventTask {
    sender: mpsc::UnboundedSender<Event>,
    tick_rate: Duration,
}

impl EventTask {
    fn new(sender: mpsc::UnboundedSender<Event>, tick_fps: f64) -> Self {
        let fps = if tick_fps > 0.0 { tick_fps } else { 30.0 };
        Self {
            sender,
            tick_rate: Duration::from_secs_f64(1.0 / fps),
        }
    }

    async fn run(self) -> color_eyre::Result<()> {
        let mut reader = crossterm::event::EventStream::new();
        let mut tick = tokio::time::interval(self.tick_rate);
        loop {
            let tick_delay = tick.tick();
            let crossterm_event = reader.next().fuse();
            tokio::select! {
                _ = self.sender.closed() => {
                    break;
                }
                _ = tick_delay => {
                    self.send(Event::Tick);
                }
                Some(Ok(evt)) = crossterm_event => {
                    self.send(Event::Crossterm(evt));
                }
            };
        }
        Ok(())
    }

    fn send(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}
