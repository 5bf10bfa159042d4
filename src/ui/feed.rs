use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

use crate::feed::FeedState;
use crate::ui::post::{PostCard, post_card_height};

/// Compose box above a scrollable list of posts.
pub struct FeedView<'a> {
    pub feed: &'a FeedState,
    pub composing: bool,
    pub display_name: Option<&'a str>,
}

impl<'a> FeedView<'a> {
    pub fn new(feed: &'a FeedState) -> Self {
        Self {
            feed,
            composing: false,
            display_name: None,
        }
    }

    pub fn composing(mut self, composing: bool) -> Self {
        self.composing = composing;
        self
    }

    pub fn display_name(mut self, name: Option<&'a str>) -> Self {
        self.display_name = name;
        self
    }
}

impl Widget for FeedView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let compose_height = 5;
        let error_height = u16::from(self.feed.error.is_some());
        let [compose_area, error_area, list_area] = Layout::vertical([
            Constraint::Length(compose_height),
            Constraint::Length(error_height),
            Constraint::Min(1),
        ])
        .areas(area);

        ComposeBox {
            feed: self.feed,
            active: self.composing,
        }
        .render(compose_area, buf);

        if let Some(ref error) = self.feed.error {
            buf.set_string(
                area.x + 1,
                error_area.y,
                error,
                Style::default().fg(Color::Red),
            );
        }

        let title = match self.display_name {
            Some(name) => format!(" Feed · {name} "),
            None => " Feed ".to_string(),
        };
        PostList {
            feed: self.feed,
            title,
        }
        .render(list_area, buf);
    }
}

struct ComposeBox<'a> {
    feed: &'a FeedState,
    active: bool,
}

impl Widget for ComposeBox<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.active { Color::Yellow } else { Color::DarkGray };
        let title = if self.feed.submitting {
            " Posting... "
        } else if self.active {
            " What do you want to talk about? (Enter post · Alt-Enter newline · Esc done) "
        } else {
            " New post (c) "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let compose = &self.feed.compose;
        let [text_area, image_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

        let mut text = compose.content.clone();
        if self.active {
            text.push('\u{2588}');
        }
        let paragraph = if text.is_empty() {
            Paragraph::new(Span::styled(
                "Start a post",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Paragraph::new(text).wrap(Wrap { trim: false })
        };
        paragraph.render(text_area, buf);

        if let Some(ref image) = compose.image {
            let line = Line::from(vec![
                Span::styled("\u{1F5BC} ", Style::default().fg(Color::Magenta)),
                Span::raw(image.preview.as_str()),
                Span::styled("  (x to remove)", Style::default().fg(Color::DarkGray)),
            ]);
            buf.set_line(image_area.x, image_area.y, &line, image_area.width);
        }
    }
}

struct PostList<'a> {
    feed: &'a FeedState,
    title: String,
}

impl Widget for PostList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title)
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::DarkGray));

        let inner = block.inner(area);
        block.render(area, buf);

        let posts = &self.feed.posts;
        if posts.is_empty() {
            let msg = if self.feed.loading {
                "Loading..."
            } else {
                "No posts yet"
            };
            buf.set_string(
                inner.x + 1,
                inner.y,
                msg,
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let content_width = inner.width.saturating_sub(1); // 1 char left margin

        // Card heights including the separator line.
        let heights: Vec<u16> = posts
            .iter()
            .map(|p| post_card_height(p, content_width).saturating_add(1))
            .collect();

        let selected = self.feed.selected;
        let scroll_start = compute_scroll_start(&heights, selected, inner.height);

        let mut y = inner.y;
        let mut idx = scroll_start;
        while idx < posts.len() && y < inner.y + inner.height {
            let card_h = heights[idx];
            let remaining = inner.y + inner.height - y;
            let render_h = card_h.min(remaining);

            let card_area = Rect::new(inner.x + 1, y, content_width, render_h.saturating_sub(1));
            PostCard::new(&posts[idx])
                .selected(idx == selected)
                .render(card_area, buf);

            y += render_h;

            if y < inner.y + inner.height && idx + 1 < posts.len() {
                let sep = "\u{2500}".repeat(content_width as usize);
                buf.set_string(
                    inner.x + 1,
                    y.saturating_sub(1),
                    &sep,
                    Style::default().fg(Color::DarkGray),
                );
            }

            idx += 1;
        }
    }
}

/// Find the smallest scroll start index so that the selected item fits
/// within the available height.
pub fn compute_scroll_start(heights: &[u16], selected: usize, available: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }

    let selected = selected.min(heights.len() - 1);
    if available == 0 {
        return selected;
    }

    // Include the selected card and pack as many earlier cards above it as fit.
    let mut start = selected;
    let mut used = heights[selected];

    while start > 0 {
        let next = used.saturating_add(heights[start - 1]);
        if next > available {
            break;
        }
        start -= 1;
        used = next;
    }

    start
}
