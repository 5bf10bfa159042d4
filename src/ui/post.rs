use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;
use unicode_width::UnicodeWidthStr;

use crate::api::types::Post;

/// Renders a single post as a compact card.
///
/// Layout:
///   Author Name · 2h ago                  [image]
///   Post text (may wrap) ...
///   ♥ 12  💬 5
pub struct PostCard<'a> {
    pub post: &'a Post,
    pub selected: bool,
}

impl<'a> PostCard<'a> {
    pub fn new(post: &'a Post) -> Self {
        Self {
            post,
            selected: false,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for PostCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let highlight_style = if self.selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let mut y = area.y;

        // -- Line 1: author + age + image marker --
        let author = if self.post.author_name.is_empty() {
            "Unknown"
        } else {
            self.post.author_name.as_str()
        };

        let mut header_spans = vec![Span::styled(
            author,
            highlight_style.add_modifier(Modifier::BOLD),
        )];

        if let Some(created) = self.post.created_at {
            header_spans.push(Span::styled(
                format!(" · {}", format_time_ago(created)),
                Style::default().fg(Color::DarkGray),
            ));
        }

        if self.post.image_url.is_some() {
            header_spans.push(Span::styled(" [image]", Style::default().fg(Color::Magenta)));
        }

        buf.set_line(area.x, y, &Line::from(header_spans), area.width);
        y += 1;

        if y >= area.y + area.height {
            return;
        }

        // -- Line 2+: content (wrapped) --
        let width = area.width as usize;
        let max_text_lines = (area.height - (y - area.y) - 1).max(1) as usize; // Reserve 1 line for counts

        let text_style = if self.selected {
            Style::default().fg(Color::White)
        } else {
            Style::default()
        };
        for (i, line_text) in wrap_text(&self.post.content, width).into_iter().enumerate() {
            if i >= max_text_lines || y >= area.y + area.height {
                break;
            }
            buf.set_string(area.x, y, &line_text, text_style);
            y += 1;
        }

        if y >= area.y + area.height {
            return;
        }

        // -- Last line: counts --
        let heart = if self.post.is_liked() { "\u{2665}" } else { "\u{2661}" };
        let counts = Line::from(vec![
            Span::styled(
                format!("{heart} {}", self.post.like_count()),
                Style::default().fg(Color::Red),
            ),
            Span::raw("  "),
            Span::styled(
                format!("\u{1F4AC} {}", self.post.comment_count()),
                Style::default().fg(Color::Blue),
            ),
        ]);
        buf.set_line(area.x, y, &counts, area.width);
    }
}

/// Height in lines needed for a post card.
pub fn post_card_height(post: &Post, width: u16) -> u16 {
    let text_lines = u16::try_from(wrap_text(&post.content, width as usize).len())
        .unwrap_or(u16::MAX);
    // header + text + counts
    text_lines.saturating_add(2)
}

/// Greedy word wrap by display width. Words wider than `width` get a line of
/// their own and are clipped when drawn.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.width() + 1 + word.width() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

pub fn format_time_ago(dt: chrono::DateTime<chrono::Utc>) -> String {
    format_age(chrono::Utc::now().signed_duration_since(dt), dt)
}

fn format_age(diff: chrono::TimeDelta, dt: chrono::DateTime<chrono::Utc>) -> String {
    if diff.num_seconds() < 60 {
        format!("{}s", diff.num_seconds().max(0))
    } else if diff.num_minutes() < 60 {
        format!("{}m", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("{}h", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d", diff.num_days())
    } else {
        dt.format("%b %d").to_string()
    }
}
