use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};

use crate::auth::flow::{AuthField, AuthForm, AuthMode, AuthPhase};

/// Centered sign-in / sign-up form.
pub struct AuthView<'a> {
    pub form: &'a AuthForm,
}

impl<'a> AuthView<'a> {
    pub fn new(form: &'a AuthForm) -> Self {
        Self { form }
    }
}

impl Widget for AuthView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 14u16.min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let panel = Rect::new(x, y, width, height);

        Clear.render(panel, buf);

        let title = match self.form.mode {
            AuthMode::SignIn => " Sign In ",
            AuthMode::SignUp => " Join now ",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(panel);
        block.render(panel, buf);

        let mut lines = vec![Line::from("")];
        for field in self.form.fields() {
            lines.push(field_line(self.form, *field));
            lines.push(Line::from(""));
        }

        match self.form.phase {
            AuthPhase::Editing => {
                if let Some(ref error) = self.form.error {
                    lines.push(Line::from(Span::styled(
                        error.as_str(),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
            AuthPhase::Submitting => {
                let msg = match self.form.mode {
                    AuthMode::SignIn => "Signing in...",
                    AuthMode::SignUp => "Creating account...",
                };
                lines.push(Line::from(Span::styled(
                    msg,
                    Style::default().fg(Color::Yellow),
                )));
            }
            AuthPhase::Success(ref message) => {
                lines.push(Line::from(Span::styled(
                    message.as_str(),
                    Style::default().fg(Color::Green),
                )));
            }
            AuthPhase::Redirecting => {
                lines.push(Line::from(Span::styled(
                    "Redirecting...",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        let switch_hint = match self.form.mode {
            AuthMode::SignIn => "New here? Ctrl-N to sign up",
            AuthMode::SignUp => "Already have an account? Ctrl-N to sign in",
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Enter submit · Tab next field · {switch_hint}"),
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

fn field_line(form: &AuthForm, field: AuthField) -> Line<'static> {
    let focused = form.focus == field && form.phase == AuthPhase::Editing;
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let raw = form.value(field);
    let mut shown = match field {
        AuthField::Password => "\u{2022}".repeat(raw.chars().count()),
        _ => raw.to_string(),
    };
    if focused {
        shown.push('\u{2588}');
    }

    Line::from(vec![
        Span::styled(format!(" {:<10}", field.label()), label_style),
        Span::raw(shown),
    ])
}
