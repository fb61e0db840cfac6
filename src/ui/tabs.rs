//! Page tab bar

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs as RataTabs;
use ratatui::Frame;

use crate::app::App;

/// Draw one tab per configured page, numbered for the 1-9 shortcuts
pub fn draw_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = app
        .config
        .pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            Line::from(vec![
                Span::styled(
                    format!("{}:", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(page.name.clone()),
            ])
        })
        .collect();

    let tabs = RataTabs::new(titles)
        .select(app.page_index)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, area);
}
