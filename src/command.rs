use std::path::PathBuf;

use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Feed,
    Profile(Option<String>),
    Image(PathBuf),
    Avatar(PathBuf),
    Logout,
    SignUp,
    SignIn,
    Help,
    Quit,
}

pub fn parse_command(input: &str) -> Option<Command> {
    let input = input.strip_prefix(':').unwrap_or(input).trim();

    if input.is_empty() {
        return None;
    }

    let (cmd, args) = match input.split_once(char::is_whitespace) {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (input, ""),
    };

    match cmd {
        "feed" | "f" => Some(Command::Feed),
        "profile" | "p" if args.is_empty() => Some(Command::Profile(None)),
        "profile" | "p" => parse_profile_ref(args).map(|id| Command::Profile(Some(id))),
        "image" | "img" if !args.is_empty() => Some(Command::Image(expand_home(args))),
        "avatar" if !args.is_empty() => Some(Command::Avatar(expand_home(args))),
        "logout" => Some(Command::Logout),
        "signup" | "register" => Some(Command::SignUp),
        "signin" | "login" => Some(Command::SignIn),
        "help" | "h" => Some(Command::Help),
        "quit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

/// Accept a bare user id, a `/profile/<id>` route, or a full URL ending in one.
pub fn parse_profile_ref(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_owned(),
        Err(_) if trimmed.starts_with('/') => trimmed.to_owned(),
        Err(_) => {
            return (!trimmed.contains(char::is_whitespace)).then(|| trimmed.to_owned());
        }
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["profile", id] => Some((*id).to_owned()),
        _ => None,
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
