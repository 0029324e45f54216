use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Gauge, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        canvas::{Canvas, Context},
    },
};
use wavetty::playback::{PlaybackState, VisualizationMode, reducer::reduce_waveform};

use super::app::App;
use super::browser::EntryKind;

const KEY_HELP: &str = "q quit  ⏎ play  a queue all  s skip  x clear  p pause  1/2 mode  ←/→ seek";

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45), // Browser + now playing
            Constraint::Min(5),         // Visualizer
            Constraint::Length(1),      // Status bar
        ])
        .split(size);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[0]);

    draw_browser(f, top[0], app);
    draw_now_playing(f, top[1], app);
    draw_visualizer(f, rows[1], app);
    draw_status_bar(f, rows[2], app);
}

fn draw_browser(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Browser ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height < 2 || inner.width < 4 {
        return;
    }

    let width = inner.width as usize;
    let dir_line = ellipsize_middle(&app.browser.dir.to_string_lossy(), width);
    f.render_widget(
        Paragraph::new(dir_line).style(Style::default().fg(Color::Yellow)),
        Rect { height: 1, ..inner },
    );

    let list_area = Rect {
        y: inner.y + 1,
        height: inner.height - 1,
        ..inner
    };
    let visible = list_area.height as usize;
    app.browser.ensure_visible(visible);

    let lines: Vec<Line> = app
        .browser
        .entries
        .iter()
        .enumerate()
        .skip(app.browser.offset)
        .take(visible)
        .map(|(i, entry)| {
            let color = match entry.kind {
                EntryKind::Parent => Color::Magenta,
                EntryKind::Directory => Color::Blue,
                EntryKind::File if entry.is_playable() => Color::Green,
                EntryKind::File => Color::Gray,
            };
            let mut style = Style::default().fg(color);
            if i == app.browser.selected {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            Line::from(Span::styled(
                ellipsize_end(&entry.label(), width.saturating_sub(1)),
                style,
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list_area);

    let total = app.browser.entries.len();
    if total > visible {
        let mut state = ScrollbarState::new(total.saturating_sub(visible)).position(app.browser.offset);
        f.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(None)
                .end_symbol(None),
            list_area,
            &mut state,
        );
    }
}

fn draw_now_playing(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Now Playing ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 || inner.width < 4 {
        return;
    }

    let snap = &app.snapshot;
    let state = app.session.state();
    let width = inner.width as usize;

    let state_color = match state {
        PlaybackState::Idle => Color::DarkGray,
        PlaybackState::Playing => Color::Green,
        PlaybackState::Paused => Color::Yellow,
    };

    let file_name = snap
        .track
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    let lines = vec![
        Line::from(vec![
            Span::raw("State: "),
            Span::styled(
                state.label(),
                Style::default().fg(state_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!(
            "File:  {}",
            ellipsize_middle(&file_name, width.saturating_sub(7))
        )),
        Line::from(format!(
            "Time:  {} / {}",
            format_time(snap.elapsed_secs),
            format_time(snap.total_secs)
        )),
        Line::from(format!("Mode:  {}", app.session.mode().label())),
        draw_leds(snap.left_level, snap.right_level, state != PlaybackState::Idle),
    ];

    let text_height = (lines.len() as u16).min(inner.height);
    f.render_widget(Paragraph::new(lines), Rect { height: text_height, ..inner });

    if inner.height > text_height {
        let gauge_area = Rect {
            y: inner.y + text_height,
            height: 1,
            ..inner
        };
        let progress = snap.progress();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
            .ratio(progress)
            .label(format!("{:.0}%", progress * 100.0));
        f.render_widget(gauge, gauge_area);
    }
}

fn draw_leds(left: f32, right: f32, active: bool) -> Line<'static> {
    if !active {
        return Line::from(vec![
            Span::raw("Level: L"),
            Span::styled("○", Style::default().fg(Color::DarkGray)),
            Span::raw(" R"),
            Span::styled("○", Style::default().fg(Color::DarkGray)),
        ]);
    }
    Line::from(vec![
        Span::raw("Level: L"),
        Span::styled(led_char(left), Style::default().fg(led_color(left, true))),
        Span::raw(" R"),
        Span::styled(led_char(right), Style::default().fg(led_color(right, false))),
    ])
}

fn led_char(level: f32) -> &'static str {
    if level < 0.05 {
        "○"
    } else if level < 0.3 {
        "◐"
    } else {
        "●"
    }
}

fn led_color(level: f32, is_left: bool) -> Color {
    match (is_left, level) {
        (_, l) if l > 0.9 => Color::Rgb(255, 70, 70), // Clipping
        (true, l) if l > 0.3 => Color::Rgb(100, 255, 100),
        (true, l) if l > 0.05 => Color::Rgb(50, 200, 50),
        (true, _) => Color::Rgb(20, 100, 20),
        (false, l) if l > 0.3 => Color::Rgb(255, 150, 0),
        (false, l) if l > 0.05 => Color::Rgb(200, 100, 0),
        (false, _) => Color::Rgb(100, 50, 0),
    }
}

fn draw_visualizer(f: &mut Frame, area: Rect, app: &App) {
    let mode = app.session.mode();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Visualizer - {} ", mode.label()));

    let plot = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    app.session.control.set_display_width(plot.width as usize);

    let width = plot.width.max(1) as f64;
    let snap = &app.snapshot;
    let empty = match mode {
        VisualizationMode::Waveform => snap.mono.is_empty(),
        VisualizationMode::Spectrum => snap.magnitudes.is_empty(),
    };

    if empty || plot.width < 2 || plot.height < 2 {
        let msg = match mode {
            VisualizationMode::Waveform => "No data",
            VisualizationMode::Spectrum => "No spectrum",
        };
        let pad = plot.height / 2;
        let mut lines = vec![Line::from(""); pad as usize];
        lines.push(Line::from(Span::styled(msg, Style::default().fg(Color::DarkGray))));
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    match mode {
        VisualizationMode::Waveform => {
            let columns = reduce_waveform(&snap.mono, 1, plot.width as usize);
            let canvas = Canvas::default()
                .block(block)
                .x_bounds([0.0, width])
                .y_bounds([-1.0, 1.0])
                .paint(move |ctx| {
                    draw_center_line(ctx, width);
                    let points: Vec<(f64, f64)> = columns
                        .iter()
                        .enumerate()
                        .map(|(x, &s)| (x as f64, s as f64 / 32768.0))
                        .collect();
                    for pair in points.windows(2) {
                        ctx.draw(&ratatui::widgets::canvas::Line {
                            x1: pair[0].0,
                            y1: pair[0].1,
                            x2: pair[1].0,
                            y2: pair[1].1,
                            color: Color::Rgb(0, 255, 100),
                        });
                    }
                });
            f.render_widget(canvas, area);
        }
        VisualizationMode::Spectrum => {
            let bars = snap.magnitudes.clone();
            let canvas = Canvas::default()
                .block(block)
                .x_bounds([0.0, width])
                .y_bounds([0.0, 1.0])
                .paint(move |ctx| {
                    for (x, &height) in bars.iter().enumerate() {
                        if height <= 0.0 {
                            continue;
                        }
                        ctx.draw(&ratatui::widgets::canvas::Line {
                            x1: x as f64,
                            y1: 0.0,
                            x2: x as f64,
                            y2: height,
                            color: spectrum_color(height),
                        });
                    }
                });
            f.render_widget(canvas, area);
        }
    }
}

fn draw_center_line(ctx: &mut Context, width: f64) {
    ctx.draw(&ratatui::widgets::canvas::Line {
        x1: 0.0,
        y1: 0.0,
        x2: width,
        y2: 0.0,
        color: Color::Rgb(0, 100, 50),
    });
}

fn spectrum_color(height: f64) -> Color {
    if height > 0.85 {
        Color::Rgb(255, 90, 90)
    } else if height > 0.5 {
        Color::Rgb(255, 200, 0)
    } else {
        Color::Rgb(0, 220, 120)
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let width = area.width as usize;
    let left = app.message.as_deref().unwrap_or(KEY_HELP);

    let right = format!(
        "Dir: {} | Queue: {} | Mode: {} | State: {}",
        app.browser.dir.display(),
        app.session.queued(),
        app.session.mode().label(),
        app.session.state().label()
    );

    // The right side gets what the help text leaves, but never less than half
    let left_width = left.chars().count().min(width / 2);
    let right_width = width.saturating_sub(left_width + 1);
    let right = ellipsize_middle(&right, right_width);
    let left = ellipsize_end(left, width.saturating_sub(right.chars().count() + 1));
    let gap = width.saturating_sub(left.chars().count() + right.chars().count());

    let line = Line::from(vec![
        Span::styled(left, Style::default().fg(Color::Gray)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(Color::White)),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Rgb(30, 30, 40))),
        area,
    );
}

/// Cut `s` to `max` characters, ending in `...` when shortened.
pub fn ellipsize_end(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    if max <= 3 {
        return s.chars().take(max).collect();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Cut `s` to `max` characters by replacing its middle with `...`.
pub fn ellipsize_middle(s: &str, max: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max {
        return s.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let left = (max - 3) / 2;
    let right = max - 3 - left;
    let mut out: String = chars[..left].iter().collect();
    out.push_str("...");
    out.extend(&chars[chars.len() - right..]);
    out
}

/// `mm:ss`, with negative times shown as zero.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsize_end() {
        assert_eq!(ellipsize_end("short", 10), "short");
        assert_eq!(ellipsize_end("a long file name.mp3", 10), "a long ...");
        assert_eq!(ellipsize_end("abcdef", 3), "abc");
        assert_eq!(ellipsize_end("abcdef", 0), "");
    }

    #[test]
    fn test_ellipsize_middle() {
        assert_eq!(ellipsize_middle("/music/albums", 20), "/music/albums");
        assert_eq!(ellipsize_middle("/home/user/music/albums", 11), "/hom...bums");
        assert_eq!(ellipsize_middle("abcdef", 2), "ab");
        assert_eq!(ellipsize_middle("ééééééé", 5), "é...é");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(61.0), "01:01");
        assert_eq!(format_time(3725.0), "62:05");
        assert_eq!(format_time(-4.0), "00:00");
    }

    #[test]
    fn test_led_thresholds() {
        assert_eq!(led_char(0.0), "○");
        assert_eq!(led_char(0.1), "◐");
        assert_eq!(led_char(0.8), "●");
        assert_eq!(led_color(0.95, true), led_color(0.95, false));
    }
}
