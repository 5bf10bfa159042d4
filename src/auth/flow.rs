//! Sign-in / sign-up form state machine.
//!
//! `Editing -> Submitting -> { Success -> Redirecting, Editing (with error) }`

use crate::api::auth::validate_signup_password;
use crate::api::types::LoginResponse;
use crate::event::ApiResult;

pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created! Redirecting to login...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
}

impl AuthField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Full Name",
            Self::Email => "Email",
            Self::Password => "Password",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Editing,
    Submitting,
    Success(String),
    Redirecting,
}

/// A validated request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Login {
        email: String,
        password: String,
    },
    Signup {
        name: String,
        email: String,
        password: String,
    },
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub name: String,
    pub email: String,
    pub password: String,
    pub focus: AuthField,
    pub phase: AuthPhase,
    pub error: Option<String>,
}

impl AuthForm {
    pub fn sign_in() -> Self {
        Self::new(AuthMode::SignIn)
    }

    pub fn sign_up() -> Self {
        Self::new(AuthMode::SignUp)
    }

    fn new(mode: AuthMode) -> Self {
        let focus = match mode {
            AuthMode::SignIn => AuthField::Email,
            AuthMode::SignUp => AuthField::Name,
        };
        Self {
            mode,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            focus,
            phase: AuthPhase::Editing,
            error: None,
        }
    }

    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::SignIn => &[AuthField::Email, AuthField::Password],
            AuthMode::SignUp => &[AuthField::Name, AuthField::Email, AuthField::Password],
        }
    }

    pub fn value(&self, field: AuthField) -> &str {
        match field {
            AuthField::Name => &self.name,
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
        }
    }

    fn value_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    /// Edits are ignored once the form has left `Editing`.
    pub fn push_char(&mut self, c: char) {
        if self.phase == AuthPhase::Editing {
            let field = self.focus;
            self.value_mut(field).push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if self.phase == AuthPhase::Editing {
            let field = self.focus;
            self.value_mut(field).pop();
        }
    }

    /// Validate locally and move to `Submitting`.
    ///
    /// Returns `None` (and stays in `Editing` with an error) when a required
    /// field is empty or a sign-up password is too short, and when a
    /// submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if self.phase != AuthPhase::Editing {
            return None;
        }
        self.error = None;

        if let Some(missing) = self
            .fields()
            .iter()
            .find(|f| self.value(**f).trim().is_empty())
        {
            self.error = Some(format!("{} is required", missing.label()));
            return None;
        }

        let submission = match self.mode {
            AuthMode::SignIn => Submission::Login {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            },
            AuthMode::SignUp => {
                if let Err(e) = validate_signup_password(&self.password) {
                    self.error = Some(e.to_string());
                    return None;
                }
                Submission::Signup {
                    name: self.name.trim().to_string(),
                    email: self.email.trim().to_string(),
                    password: self.password.clone(),
                }
            }
        };

        self.phase = AuthPhase::Submitting;
        Some(submission)
    }

    /// Apply a login response. On success the caller stores the session and
    /// navigates away.
    pub fn apply_login(&mut self, result: ApiResult<LoginResponse>) -> Option<LoginResponse> {
        match result {
            Ok(resp) => {
                self.phase = AuthPhase::Redirecting;
                Some(resp)
            }
            Err(e) => {
                self.fail(e.user_message("Login failed"));
                None
            }
        }
    }

    /// Apply a signup response; `true` means the redirect should be scheduled.
    pub fn apply_signup(&mut self, result: ApiResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.phase = AuthPhase::Success(SIGNUP_SUCCESS_MESSAGE.to_string());
                true
            }
            Err(e) => {
                self.fail(e.user_message("Signup failed"));
                false
            }
        }
    }

    pub fn begin_redirect(&mut self) {
        self.phase = AuthPhase::Redirecting;
    }

    fn fail(&mut self, message: String) {
        self.phase = AuthPhase::Editing;
        self.error = Some(message);
    }
}
