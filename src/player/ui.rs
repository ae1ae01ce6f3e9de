use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph,
        canvas::{self, Canvas},
    },
};

use super::app::App;

const DISABLED: Color = Color::DarkGray;

pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();

    let mut constraints = vec![
        Constraint::Length(2), // Title
        Constraint::Length(2), // File info
        Constraint::Length(3), // Transport controls
    ];
    if app.waveform {
        constraints.push(Constraint::Min(5)); // Waveform
    } else {
        constraints.push(Constraint::Min(0));
    }
    constraints.push(Constraint::Length(2)); // Key help

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(size);

    let title = Paragraph::new("tapedeck")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    draw_file_info(f, chunks[1], app);
    draw_controls(f, chunks[2], app);

    if app.waveform {
        draw_waveform(f, chunks[3], app);
    }

    draw_help(f, chunks[4]);
}

fn draw_file_info(f: &mut Frame, area: Rect, app: &App) {
    let line = if let Some(message) = &app.message {
        Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)))
    } else if let Some(file) = app.current_file() {
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        Line::from(format!("Loaded: {filename}"))
    } else {
        Line::from(Span::styled(
            "No file loaded - pass file paths on the command line",
            Style::default().fg(DISABLED),
        ))
    };

    f.render_widget(Paragraph::new(line), area);
}

fn button<'a>(key: &'a str, label: &'a str, enabled: bool, color: Color) -> Paragraph<'a> {
    let (key_style, label_style) = if enabled {
        (Style::default().fg(color), Style::default().fg(Color::White))
    } else {
        (Style::default().fg(DISABLED), Style::default().fg(DISABLED))
    };

    Paragraph::new(Line::from(vec![
        Span::styled(key, key_style),
        Span::raw(" "),
        Span::styled(label, label_style),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(label_style))
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(area);

    let controls = app.transport.controls();

    f.render_widget(
        button("[space]", controls.play_label, controls.play_enabled, Color::Green),
        chunks[0],
    );
    f.render_widget(
        button("[s]", controls.stop_label, controls.stop_enabled, Color::Yellow),
        chunks[1],
    );

    let repeat_label = if app.transport.looping() {
        "Repeat ●"
    } else {
        "Repeat ○"
    };
    f.render_widget(button("[l]", repeat_label, true, Color::Magenta), chunks[2]);

    let position = Paragraph::new(app.position_label.as_str())
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(position, chunks[3]);
}

fn draw_waveform(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let placeholder = match (app.current_file(), &app.thumbnail) {
        (None, _) => Some("No File Loaded"),
        (Some(_), None) => Some("Building waveform..."),
        (Some(_), Some(_)) => None,
    };

    if let Some(text) = placeholder {
        let inner = block.inner(area);
        f.render_widget(block, area);
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        f.render_widget(
            Paragraph::new(text)
                .style(Style::default().fg(DISABLED))
                .alignment(Alignment::Center),
            vertical[1],
        );
        return;
    }

    let Some(thumbnail) = &app.thumbnail else {
        return;
    };

    let width = area.width.saturating_sub(2).max(1) as f64;
    let peaks = thumbnail.display_peaks(width as usize);
    let playhead = app
        .playhead()
        .map(|position| thumbnail.playhead_x(position, width));

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([0.0, width])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            for (x, &(min, max)) in peaks.iter().enumerate() {
                ctx.draw(&canvas::Line {
                    x1: x as f64,
                    y1: min.clamp(-1.0, 1.0) as f64,
                    x2: x as f64,
                    y2: max.clamp(-1.0, 1.0) as f64,
                    color: Color::Rgb(0, 200, 100),
                });
            }

            if let Some(x) = playhead {
                ctx.draw(&canvas::Line {
                    x1: x,
                    y1: -1.0,
                    x2: x,
                    y2: 1.0,
                    color: Color::Red,
                });
            }
        });

    f.render_widget(canvas, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = vec![
        Span::styled("[space]", Style::default().fg(Color::Green)),
        Span::raw(" play/pause  "),
        Span::styled("[s]", Style::default().fg(Color::Yellow)),
        Span::raw(" stop  "),
        Span::styled("[l]", Style::default().fg(Color::Magenta)),
        Span::raw(" repeat  "),
        Span::styled("[n/p]", Style::default().fg(Color::Blue)),
        Span::raw(" next/prev file  "),
        Span::styled("[q]", Style::default().fg(Color::Red)),
        Span::raw(" quit"),
    ];

    let border = Block::default().borders(Borders::TOP);
    f.render_widget(border, area);

    let inner = Rect {
        y: area.y + 1,
        height: area.height.saturating_sub(1),
        ..area
    };
    f.render_widget(
        Paragraph::new(Line::from(help)).alignment(Alignment::Center),
        inner,
    );
}
