pub mod auth;
pub mod command_bar;
pub mod error_popup;
pub mod feed;
pub mod help;
pub mod input;
pub mod post;
pub mod profile;
pub mod status_bar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::app::{App, AppMode};
use crate::event::ViewKind;

use auth::AuthView;
use command_bar::CommandBar;
use error_popup::ErrorPopup;
use feed::FeedView;
use help::HelpView;
use profile::ProfileScreen;
use status_bar::StatusBar;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main content + status bar + command line while typing a command
    let bottom_height = if app.mode == AppMode::Command { 2 } else { 1 };

    let [main_area, bottom_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(bottom_height)]).areas(area);

    if app.mode == AppMode::Command {
        let [status_area, cmd_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(bottom_area);
        frame.render_widget(StatusBar::new(app), status_area);
        frame.render_widget(CommandBar::new(app), cmd_area);
    } else {
        frame.render_widget(StatusBar::new(app), bottom_area);
    }

    match app.base_view() {
        Some(ViewKind::SignIn | ViewKind::SignUp) => {
            frame.render_widget(AuthView::new(&app.auth), main_area);
        }
        Some(ViewKind::Feed) => {
            let name = app.session.get_session().map(|s| s.display_name.as_str());
            frame.render_widget(
                FeedView::new(&app.feed)
                    .composing(app.mode == AppMode::Compose)
                    .display_name(name),
                main_area,
            );
        }
        Some(ViewKind::Profile(_)) => {
            frame.render_widget(ProfileScreen::new(&app.profile), main_area);
        }
        Some(ViewKind::Help) | None => {}
    }

    if app.current_view() == Some(&ViewKind::Help) {
        frame.render_widget(HelpView::new(), main_area);
    }

    // Error detail popup renders on top of everything
    if let Some(ref detail) = app.error_detail {
        frame.render_widget(ErrorPopup::new(detail), frame.area());
    }
}
