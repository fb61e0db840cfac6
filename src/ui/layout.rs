use std::ops::Range;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy)]
pub struct UiAreas {
    pub size: Rect,
    pub header: Rect,
    pub tabs: Rect,
    pub card: Rect,
    pub activity: Rect,
    pub status_line: Rect,
    pub command_line: Rect,
}

pub fn areas(size: Rect) -> UiAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(size);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(vertical[2]);

    let footer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(vertical[3]);

    UiAreas {
        size,
        header: vertical[0],
        tabs: vertical[1],
        card: main_chunks[0],
        activity: main_chunks[1],
        status_line: footer_chunks[0],
        command_line: footer_chunks[1],
    }
}

/// Panels that fit in `available` rows with `selected` among them
///
/// Starts at the first panel and scrolls down only as far as needed.
pub fn visible_panels(heights: &[u16], selected: usize, available: u16) -> Range<usize> {
    if heights.is_empty() {
        return 0..0;
    }
    let selected = selected.min(heights.len() - 1);

    let mut start = 0;
    while start < selected && heights[start..=selected].iter().sum::<u16>() > available {
        start += 1;
    }

    let mut end = start;
    let mut used = 0u16;
    while end < heights.len() {
        let next = used.saturating_add(heights[end]);
        if next > available && end > selected {
            break;
        }
        used = next;
        end += 1;
        if used >= available {
            break;
        }
    }
    start..end.max(selected + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_fits() {
        assert_eq!(visible_panels(&[3, 5, 4], 0, 20), 0..3);
        assert_eq!(visible_panels(&[], 0, 20), 0..0);
    }

    #[test]
    fn test_scrolls_to_selection() {
        let heights = [5, 5, 5, 5];
        assert_eq!(visible_panels(&heights, 0, 10), 0..2);
        assert_eq!(visible_panels(&heights, 3, 10), 2..4);
    }

    #[test]
    fn test_oversized_selection_still_shown() {
        assert_eq!(visible_panels(&[3, 30], 1, 10), 1..2);
    }
}
