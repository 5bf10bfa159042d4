use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use crate::api::types::{Profile, UserRef};
use crate::profile::{DraftField, ProfileDraft, ProfileState, ProfileStatus, ProfileView};

/// Profile screen: header, controls, optional edit form and connections.
pub struct ProfileScreen<'a> {
    pub state: &'a ProfileState,
}

impl<'a> ProfileScreen<'a> {
    pub fn new(state: &'a ProfileState) -> Self {
        Self { state }
    }
}

impl Widget for ProfileScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = match self.state.status {
            ProfileStatus::Loading => {
                message_block(" Profile ", "Loading...", Color::DarkGray).render(area, buf);
                return;
            }
            ProfileStatus::Failed(ref message) => {
                message_block(" Profile ", message, Color::Red).render(area, buf);
                return;
            }
            ProfileStatus::Ready(ref view) => view,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", view.profile.name))
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        block.render(area, buf);

        let [info_area, detail_area] =
            Layout::vertical([Constraint::Length(8), Constraint::Min(1)]).areas(inner);

        Paragraph::new(info_lines(view, self.state))
            .wrap(Wrap { trim: true })
            .render(info_area, buf);

        match self.state.draft {
            Some(ref draft) => EditForm { draft }.render(detail_area, buf),
            None if view.profile.has_connections() => Connections {
                profile: &view.profile,
                selected: self.state.selected,
            }
            .render(detail_area, buf),
            None => {}
        }
    }
}

fn message_block<'a>(title: &'a str, message: &'a str, color: Color) -> Paragraph<'a> {
    Paragraph::new(Span::styled(message, Style::default().fg(color))).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
}

fn info_lines<'a>(view: &'a ProfileView, state: &'a ProfileState) -> Vec<Line<'a>> {
    let profile = &view.profile;
    let dim = Style::default().fg(Color::DarkGray);
    let bold = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("({}) ", initial(&profile.name)), dim),
            Span::styled(profile.name.as_str(), bold),
        ]),
        Line::from(Span::styled(
            profile.headline.as_deref().filter(|h| !h.is_empty()).unwrap_or("No headline"),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::raw(
            profile.bio.as_deref().filter(|b| !b.is_empty()).unwrap_or("No bio added yet"),
        )),
        Line::from(vec![
            Span::styled(profile.followers.len().to_string(), bold),
            Span::styled(" Followers  ", dim),
            Span::styled(profile.following.len().to_string(), bold),
            Span::styled(" Following", dim),
        ]),
        Line::from(""),
    ];

    let key_style = Style::default().fg(Color::Yellow);
    let controls = if view.is_own {
        vec![
            Span::styled("[e]", key_style),
            Span::raw(" Edit Profile  "),
            Span::styled("[a]", key_style),
            Span::raw(" Change Photo"),
        ]
    } else {
        let label = if view.is_following { " Unfollow" } else { " Follow" };
        vec![Span::styled("[f]", key_style), Span::raw(label)]
    };
    lines.push(Line::from(controls));

    if state.busy {
        lines.push(Line::from(Span::styled("Working...", dim)));
    } else if let Some(ref error) = state.error {
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(Color::Red),
        )));
    }

    lines
}

/// First letter of a name, upper-cased, as a stand-in for the photo.
fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

struct EditForm<'a> {
    draft: &'a ProfileDraft,
}

impl Widget for EditForm<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::TOP)
            .title(" Edit Profile (Tab next · Enter save · Esc cancel) ")
            .title_style(Style::default().fg(Color::Yellow))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line<'_>> = DraftField::ALL
            .iter()
            .map(|field| {
                let focused = *field == self.draft.focus;
                let label_style = if focused {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let mut value = self.draft.value(*field).to_string();
                if focused {
                    value.push('\u{2588}');
                }
                Line::from(vec![
                    Span::styled(format!("{:<10}", field.label()), label_style),
                    Span::raw(value),
                ])
            })
            .collect();

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

struct Connections<'a> {
    profile: &'a Profile,
    selected: usize,
}

impl Widget for Connections<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [followers_area, following_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(area);

        let offset = self.profile.followers.len();
        let followers = format!(" Followers ({}) ", self.profile.followers.len());
        let following = format!(" Following ({}) ", self.profile.following.len());
        // One row goes to the top border.
        let rows = area.height.saturating_sub(1);
        user_list(followers, &self.profile.followers, self.selected, 0, rows)
            .render(followers_area, buf);
        user_list(following, &self.profile.following, self.selected, offset, rows)
            .render(following_area, buf);
    }
}

/// First row to show so that the selected entry of a list stays within
/// `rows` visible rows. `None` means the selection is in another list.
fn list_scroll(selected: Option<usize>, rows: u16) -> u16 {
    match selected {
        Some(idx) if rows > 0 && idx >= usize::from(rows) => {
            u16::try_from(idx + 1 - usize::from(rows)).unwrap_or(u16::MAX)
        }
        _ => 0,
    }
}

/// `offset` is the list's position in the combined selection order.
fn user_list(
    title: String,
    users: &[UserRef],
    selected: usize,
    offset: usize,
    rows: u16,
) -> Paragraph<'_> {
    let local = selected
        .checked_sub(offset)
        .filter(|idx| *idx < users.len());

    let lines: Vec<Line<'_>> = users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            let style = if i + offset == selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!("({}) ", initial(&user.name)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(user.name.as_str(), style),
            ])
        })
        .collect();

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .title(title)
                .title_style(Style::default().fg(Color::DarkGray))
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .scroll((list_scroll(local, rows), 0))
}
