use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::error::RepoError;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for the form cards and modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Turn an error into the one-line message shown to the user. Validation
/// failures are already phrased for the form; anything else shows its
/// headline plus the root cause.
pub(crate) fn surface_error(err: &Error) -> String {
    if let Some(repo_err) = err.downcast_ref::<RepoError>() {
        if repo_err.validation().is_some() {
            return repo_err.to_string();
        }
    }
    let headline = err.to_string();
    let root = err.root_cause().to_string();
    if headline == root {
        headline
    } else {
        format!("{headline}: {root}")
    }
}

/// Column `offset` characters into `area`, held to the last column of the
/// area so long input never moves the cursor outside it.
pub(crate) fn cursor_column(area: Rect, offset: usize) -> u16 {
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);
    area.x
        .saturating_add(offset)
        .min(area.right().saturating_sub(1))
}

/// Three-button row for confirmation dialogs, highlighting `selected`.
pub(crate) fn button_row(labels: &[&str], selected: usize) -> Line<'static> {
    let mut spans = Vec::with_capacity(labels.len() * 2);
    for (index, label) in labels.iter().enumerate() {
        let style = if index == selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!("[ {label} ]"), style));
        if index + 1 < labels.len() {
            spans.push(Span::raw("  "));
        }
    }
    Line::from(spans)
}

/// `[key] action` hint pairs for the footer.
pub(crate) fn key_hints(pairs: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (index, (key, action)) in pairs.iter().enumerate() {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        let separator = if index + 1 < pairs.len() { "   " } else { "" };
        spans.push(Span::raw(format!(" {action}{separator}")));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn validation_errors_are_shown_as_is() {
        let err = Error::from(RepoError::from(ValidationError::MissingField("Name")));
        assert_eq!(surface_error(&err), "Name is required.");
    }

    #[test]
    fn wrapped_errors_show_headline_and_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(io).context("failed to save");
        assert_eq!(surface_error(&err), "failed to save: denied");
        assert_eq!(surface_error(&anyhow!("plain")), "plain");
    }

    #[test]
    fn cursor_column_is_clamped_to_area() {
        let area = Rect::new(10, 0, 20, 3);
        assert_eq!(cursor_column(area, 4), 14);
        assert_eq!(cursor_column(area, 500), 29);
        assert_eq!(cursor_column(area, usize::MAX), 29);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 50, area);
        assert_eq!(inner.width, 60);
        assert!(inner.x >= 20 && inner.y >= 10);
    }
}
