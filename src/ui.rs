use crate::app::{App, Severity, EMPTY_PLACEHOLDER};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
};

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let dim = Style::default().fg(Color::DarkGray);
    let bright = Style::default().fg(Color::White).bold();

    let outer = Block::default()
        .title(" typetrace ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let vert = Layout::vertical([
        Constraint::Length(4), // Session panel
        Constraint::Min(5),    // Preview
        Constraint::Length(1), // Status line
        Constraint::Length(1), // Control bar
    ])
    .split(inner);

    render_session(frame, app, vert[0], dim, bright);
    render_preview(frame, app, vert[1], dim);

    frame.render_widget(Paragraph::new(app.status.as_str()).style(dim), vert[2]);
    frame.render_widget(
        Paragraph::new(
            "F2 start  F3 stop  F4 log file  F5 refresh  F6 clear  F7 export  Ctrl-Q quit",
        )
        .style(dim),
        vert[3],
    );

    if let Some(prompt) = &app.prompt {
        let lines = vec![
            Line::from(prompt.buffer.as_str()),
            Line::from(Span::styled("Enter to accept, Esc to cancel", dim)),
        ];
        render_modal(frame, area, prompt.title(), lines, Color::Cyan);
    }

    if let Some(notice) = &app.notice {
        let (title, color) = match notice.severity {
            Severity::Info => (" OK ", Color::Green),
            Severity::Warn => (" Warning ", Color::Yellow),
            Severity::Error => (" Error ", Color::Red),
        };
        let lines = vec![
            Line::from(notice.text.as_str()),
            Line::from(Span::styled("Enter to dismiss", dim)),
        ];
        render_modal(frame, area, title, lines, color);
    }
}

fn render_session(frame: &mut Frame, app: &App, area: Rect, dim: Style, bright: Style) {
    let state = if app.logging {
        Span::styled("● LOGGING", Style::default().fg(Color::Green).bold())
    } else {
        Span::styled("○ stopped", dim)
    };
    let block = Block::default()
        .title(Line::from(vec![" Session ".into(), state, " ".into()]))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.logging {
            Color::Green
        } else {
            Color::DarkGray
        }))
        .padding(Padding::horizontal(1));
    let si = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                "Log file: ".into(),
                Span::styled(app.log_path.display().to_string(), bright),
            ]),
            Line::from(vec![
                "Recorded this session: ".into(),
                Span::styled(format!("{}", app.recorded_count), bright),
            ]),
        ])
        .wrap(Wrap { trim: false }),
        si,
    );
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect, dim: Style) {
    let block = Block::default()
        .title(" Preview ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .padding(Padding::horizontal(1));
    let pi = block.inner(area);
    frame.render_widget(block, area);

    if app.preview.is_empty() {
        let placeholder = app.preview_note.as_deref().unwrap_or(EMPTY_PLACEHOLDER);
        frame.render_widget(Paragraph::new(placeholder).style(dim), pi);
        return;
    }

    // Scrolled to the newest line: show the tail that fits.
    let visible = pi.height as usize;
    let start = app.preview.len().saturating_sub(visible);
    let lines: Vec<Line> = app.preview[start..]
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    frame.render_widget(Paragraph::new(lines), pi);
}

fn render_modal(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, color: Color) {
    let width = area.width.saturating_sub(8).min(70).max(20);
    let height = 4;
    let modal = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, modal);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .padding(Padding::horizontal(1));
    let mi = block.inner(modal);
    frame.render_widget(block, modal);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), mi);
}
