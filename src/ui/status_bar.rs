use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppMode};
use crate::event::ViewKind;
use crate::ui::input::tail_to_width;

/// Bottom status bar showing mode, current view, session and status messages.
pub struct StatusBar<'a> {
    pub app: &'a App,
}

impl<'a> StatusBar<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf[(x, area.y)].set_style(bg_style);
        }

        let mut spans = Vec::new();

        let (mode_str, mode_color) = match self.app.mode {
            AppMode::Normal => (" NORMAL ", Color::Blue),
            AppMode::Command => (" COMMAND ", Color::Magenta),
            AppMode::Compose => (" COMPOSE ", Color::Yellow),
            AppMode::Edit => (" EDIT ", Color::Green),
        };
        spans.push(Span::styled(
            mode_str,
            Style::default()
                .bg(mode_color)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));

        let view_name = match self.app.current_view() {
            Some(ViewKind::Profile(Some(id))) => format!("Profile: {id}"),
            Some(view) => view.title().to_string(),
            None => "linktui".to_string(),
        };
        spans.push(Span::styled(view_name, bg_style));

        if let Some(session) = self.app.session.get_session() {
            spans.push(Span::styled(
                format!(" · {}", session.display_name),
                Style::default().bg(Color::DarkGray).fg(Color::Gray),
            ));
        }

        if self.app.loading() {
            spans.push(Span::styled(
                " [loading...]",
                Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            ));
        }

        // Status message (right-aligned)
        if let Some(ref msg) = self.app.status_message {
            let left_width: usize = spans.iter().map(|s| s.width()).sum();
            let room = (area.width as usize).saturating_sub(left_width + 1);
            let shown = tail_to_width(msg, room);
            let padding = (area.width as usize).saturating_sub(left_width + shown.width());
            if padding > 0 {
                spans.push(Span::styled(" ".repeat(padding), bg_style));
            }
            spans.push(Span::styled(
                shown,
                Style::default().bg(Color::DarkGray).fg(Color::LightRed),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
