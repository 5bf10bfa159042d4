use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, eyre};

use crate::api::ApiClient;
use crate::api::media::{ImageUpload, resolve_media_url};
use crate::api::profile::ProfileTarget;
use crate::api::types::{Post, ProfileUpdate};
use crate::auth::session::SessionStore;
use crate::config::{AppConfig, load_config};
use crate::guard;
use crate::profile::{ProfileView, load_profile_view};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "linktui", about = "TUI and CLI for a small professional network")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Launch the interactive TUI (default)
    Tui,
    /// Sign in and store the session
    Login { email: String, password: String },
    /// Create an account
    Signup {
        name: String,
        email: String,
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List all posts (JSONL)
    Feed,
    /// Create a post
    Post {
        content: String,
        /// Image file to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Like a post
    Like { post_id: String },
    /// Show a profile with relationship flags (JSONL); your own without an id
    Profile { user_id: Option<String> },
    /// Follow a user
    Follow { user_id: String },
    /// Unfollow a user
    Unfollow { user_id: String },
    /// Update your name, headline and bio
    #[command(name = "update-profile")]
    UpdateProfile {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        headline: String,
        #[arg(long, default_value = "")]
        bio: String,
    },
    /// Upload a new profile picture
    Avatar { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Denormalization helpers
// ---------------------------------------------------------------------------

/// A post with its media paths resolved to absolute URLs.
fn denormalize_post(post: &Post, media_base: &str) -> serde_json::Value {
    let image = post
        .image_url
        .as_deref()
        .and_then(|p| resolve_media_url(media_base, p));
    let avatar = post
        .author_avatar_url
        .as_deref()
        .and_then(|p| resolve_media_url(media_base, p));

    serde_json::json!({
        "post": post,
        "image_url": image,
        "author_avatar_url": avatar,
    })
}

fn denormalize_profile(view: &ProfileView, media_base: &str) -> serde_json::Value {
    let avatar = view
        .profile
        .avatar_url
        .as_deref()
        .and_then(|p| resolve_media_url(media_base, p));

    serde_json::json!({
        "profile": view.profile,
        "avatar_url": avatar,
        "is_own": view.is_own,
        "is_following": view.is_following,
    })
}

fn print_line(value: &serde_json::Value) -> eyre::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Client construction (shared with main.rs TUI path)
// ---------------------------------------------------------------------------

/// Load config (and env files) plus the session store.
pub fn build_context() -> eyre::Result<(AppConfig, ApiClient, SessionStore)> {
    let config = load_config();
    let session = SessionStore::open_default().map_err(|e| eyre!("{e}"))?;
    let api = ApiClient::from_config(&config);
    Ok((config, api, session))
}

/// A client carrying the stored token, or an error telling the user to sign in.
fn authed_client(api: &ApiClient, session: &SessionStore) -> eyre::Result<ApiClient> {
    let session = guard::require_session(session)
        .ok_or_else(|| eyre!("not signed in.\nHint: Run `linktui login <email> <password>` first."))?;
    Ok(api.clone().with_token(Some(session.token.clone())))
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

pub async fn run_command(cmd: CliCommand) -> eyre::Result<()> {
    let (_, api, mut session) = build_context()?;
    execute(cmd, &api, &mut session).await
}

async fn execute(cmd: CliCommand, api: &ApiClient, session: &mut SessionStore) -> eyre::Result<()> {
    let media_base = api.media_base_url().to_string();

    match cmd {
        CliCommand::Tui => unreachable!("tui is handled in main"),

        CliCommand::Login { email, password } => {
            let resp = api
                .login(&email, &password)
                .await
                .map_err(|e| eyre!("{e}"))?;
            session
                .set_session(&resp.token, &resp.name)
                .map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({
                "name": resp.name,
                "session": session.path().display().to_string(),
            }))?;
        }

        CliCommand::Signup {
            name,
            email,
            password,
        } => {
            api.signup(&name, &email, &password)
                .await
                .map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "created", "email": email }))?;
        }

        CliCommand::Logout => {
            session.clear_session().map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "signed_out" }))?;
        }

        CliCommand::Feed => {
            let client = authed_client(api, session)?;
            let posts = client.list_posts().await.map_err(|e| eyre!("{e}"))?;
            for post in &posts {
                print_line(&denormalize_post(post, &media_base))?;
            }
        }

        CliCommand::Post { content, image } => {
            if content.trim().is_empty() {
                return Err(eyre!("post content must not be empty"));
            }
            let client = authed_client(api, session)?;
            let image = image
                .map(ImageUpload::from_path)
                .transpose()
                .map_err(|e| eyre!("{e}"))?;
            client
                .create_post(&content, image)
                .await
                .map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "created" }))?;
        }

        CliCommand::Like { post_id } => {
            let client = authed_client(api, session)?;
            client.like_post(&post_id).await.map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "liked", "post_id": post_id }))?;
        }

        CliCommand::Profile { user_id } => {
            let client = authed_client(api, session)?;
            let target = ProfileTarget::from_id(user_id);
            let view = load_profile_view(&client, &target).await.map_err(|e| {
                if e.is_not_found() {
                    eyre!("Profile not found")
                } else {
                    eyre!("{e}")
                }
            })?;
            print_line(&denormalize_profile(&view, &media_base))?;
        }

        CliCommand::Follow { user_id } => {
            let client = authed_client(api, session)?;
            client.follow(&user_id).await.map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "following", "user_id": user_id }))?;
        }

        CliCommand::Unfollow { user_id } => {
            let client = authed_client(api, session)?;
            client.unfollow(&user_id).await.map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "unfollowed", "user_id": user_id }))?;
        }

        CliCommand::UpdateProfile {
            name,
            headline,
            bio,
        } => {
            let client = authed_client(api, session)?;
            let update = ProfileUpdate {
                name,
                bio,
                headline,
            };
            client
                .update_profile(&update)
                .await
                .map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "updated", "profile": update }))?;
        }

        CliCommand::Avatar { path } => {
            let client = authed_client(api, session)?;
            let upload = ImageUpload::from_path(&path).map_err(|e| eyre!("{e}"))?;
            client.upload_avatar(upload).await.map_err(|e| eyre!("{e}"))?;
            print_line(&serde_json::json!({ "status": "uploaded" }))?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
