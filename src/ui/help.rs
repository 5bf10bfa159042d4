use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

/// Help overlay showing keybindings.
#[derive(Default)]
pub struct HelpView;

impl HelpView {
    pub fn new() -> Self {
        Self
    }
}

impl Widget for HelpView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = 62u16.min(area.width.saturating_sub(4));
        let height = 30u16.min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let panel = Rect::new(x, y, width, height);

        Clear.render(panel, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Help - Keybindings ")
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::Cyan));

        let inner = block.inner(panel);
        block.render(panel, buf);

        let key_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(Color::White);
        let section_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let bindings: Vec<Line<'_>> = vec![
            Line::from(Span::styled("Feed", section_style)),
            binding_line("j/k", "Move between posts", key_style, desc_style),
            binding_line("c", "Write a post", key_style, desc_style),
            binding_line("l", "Like selected post", key_style, desc_style),
            binding_line("o", "Open post image in browser", key_style, desc_style),
            binding_line("x", "Remove attached image", key_style, desc_style),
            binding_line("p", "Your profile", key_style, desc_style),
            binding_line("r", "Reload", key_style, desc_style),
            Line::from(""),
            Line::from(Span::styled("Profile", section_style)),
            binding_line("j/k Enter", "Pick and open a connection", key_style, desc_style),
            binding_line("e", "Edit your profile", key_style, desc_style),
            binding_line("a", "Change your photo", key_style, desc_style),
            binding_line("f", "Follow / unfollow", key_style, desc_style),
            binding_line("Esc/q", "Go back", key_style, desc_style),
            Line::from(""),
            Line::from(Span::styled("Commands", section_style)),
            binding_line(":feed", "Go to the feed", key_style, desc_style),
            binding_line(":profile [id]", "Open a profile", key_style, desc_style),
            binding_line(":image <path>", "Attach an image to the post", key_style, desc_style),
            binding_line(":avatar <path>", "Upload a profile picture", key_style, desc_style),
            binding_line(":logout", "Sign out", key_style, desc_style),
            Line::from(""),
            binding_line("E", "Show last error details", key_style, desc_style),
            binding_line("?", "This help screen", key_style, desc_style),
            binding_line("Ctrl-C", "Quit", key_style, desc_style),
        ];

        Paragraph::new(bindings).render(inner, buf);
    }
}

fn binding_line<'a>(key: &'a str, desc: &'a str, key_style: Style, desc_style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {key:<16}"), key_style),
        Span::styled(desc, desc_style),
    ])
}
