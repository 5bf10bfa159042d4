//! Protected-screen guard.

use crate::auth::session::{Session, SessionStore};

/// The session to use for a protected screen, or `None` when the caller must
/// be sent to sign-in instead.
/// An empty token counts as signed out.
pub fn require_session(store: &SessionStore) -> Option<&Session> {
    store.get_session().filter(|s| !s.token.is_empty())
}
