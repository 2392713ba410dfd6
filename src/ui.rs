//! Terminal rendering.
//!
//! The coordination loop hands each composed [`VisualFrame`] together with a
//! [`DisplayMetadata`] to a [`Renderer`]. Renderers only paint; they never
//! touch playback state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::config::{TimeField, UiSettings};
use crate::library::{Catalog, Track, display_from_fields};
use crate::playback::{PlaybackState, Status, VisualizerMode};
use crate::visualizer::{MAX_LEVEL, VisualFrame};

/// Paints one frame. Implementations must not block for long; the loop calls
/// this once per tick.
pub trait Renderer {
    fn render(&mut self, frame: &VisualFrame, meta: &DisplayMetadata) -> anyhow::Result<()>;
}

/// Owned description of what to show next to the visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMetadata {
    pub state: PlaybackState,
    /// Catalog entry of `state.current`.
    pub track: Option<Track>,
    pub track_count: usize,
}

impl DisplayMetadata {
    pub fn new(state: PlaybackState, catalog: &Catalog) -> Self {
        Self {
            track: state.current.and_then(|i| catalog.get(i)).cloned(),
            track_count: catalog.len(),
            state,
        }
    }
}

/// Low-to-high color ramp shared by all modes.
const GRADIENT: [Color; 12] = [
    Color::LightBlue,
    Color::Blue,
    Color::Cyan,
    Color::LightCyan,
    Color::Green,
    Color::LightGreen,
    Color::Yellow,
    Color::LightYellow,
    Color::Red,
    Color::LightRed,
    Color::Magenta,
    Color::LightMagenta,
];

const EIGHTHS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

const CONTROLS: [(&str, &str); 8] = [
    ("space", "play/pause"),
    ("s", "stop"),
    ("n/p", "next/prev"),
    ("←/→", "seek"),
    ("↑/↓", "volume"),
    ("v", "visualizer"),
    ("r", "loop mode"),
    ("q", "quit"),
];

/// ratatui renderer drawing header, visualizer, playlist and footer.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    catalog: Arc<Catalog>,
    settings: UiSettings,
    seek_seconds: u64,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(
        terminal: Terminal<B>,
        catalog: Arc<Catalog>,
        settings: UiSettings,
        seek_seconds: u64,
    ) -> Self {
        Self {
            terminal,
            catalog,
            settings,
            seek_seconds,
        }
    }

    #[cfg(test)]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, frame: &VisualFrame, meta: &DisplayMetadata) -> anyhow::Result<()> {
        let Self {
            terminal,
            catalog,
            settings,
            seek_seconds,
        } = self;
        terminal
            .draw(|f| draw(f, frame, meta, catalog, settings, *seek_seconds))
            .map_err(|e| anyhow!("terminal draw failed: {e}"))?;
        Ok(())
    }
}

/// Render the controls help text, incorporating seek seconds.
fn controls_text(seek_seconds: u64) -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| {
            if *k == "←/→" {
                format!("[{k}] {v} -/+{seek_seconds}s")
            } else {
                format!("[{k}] {v}")
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or_default()
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn status_text(meta: &DisplayMetadata, ui: &UiSettings) -> String {
    let s = &meta.state;
    let mut parts: Vec<String> = Vec::new();

    let icon = match s.status {
        Status::Playing => "▶",
        Status::Paused => "⏸",
        Status::Stopped => "■",
    };
    parts.push(format!("{icon} {}", s.status.label()));

    if let Some(track) = &meta.track {
        let song = display_from_fields(
            track,
            &ui.now_playing_track_fields,
            &ui.now_playing_track_separator,
        );
        match now_playing_time_text(secs_to_duration(s.elapsed), track.duration, ui) {
            Some(time) => parts.push(format!("{song} [{time}]")),
            None => parts.push(song),
        }
    }

    parts.push(format!("Vol {:.0}%", s.volume * 100.0));
    parts.push(format!("Mode: {}", s.mode.label()));
    parts.push(format!("Loop: {}", s.loop_mode.label()));
    if s.seek_degraded {
        parts.push("Seek: approx".to_string());
    }
    if s.load_errors > 0 {
        parts.push(format!("Load errors: {}", s.load_errors));
    }
    if let Some(fault) = s.fault {
        parts.push(format!("Error: {}", fault.message()));
    }

    parts.join(" • ")
}

fn progress_ratio(meta: &DisplayMetadata) -> f64 {
    match meta.track.as_ref().and_then(Track::duration_secs) {
        Some(total) if meta.state.status != Status::Stopped => {
            (meta.state.elapsed / total).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Nearest-neighbour resampling of `levels` to `width` columns.
fn resample(levels: &[u8], width: usize) -> Vec<u8> {
    if levels.is_empty() {
        return vec![0; width];
    }
    (0..width).map(|i| levels[i * levels.len() / width]).collect()
}

fn gradient(fraction: f64) -> Color {
    let idx = (fraction.clamp(0.0, 1.0) * GRADIENT.len() as f64) as usize;
    GRADIENT[idx.min(GRADIENT.len() - 1)]
}

/// Turn a frame into styled text lines filling `area`.
fn visualizer_lines(frame: &VisualFrame, area: Rect, dimmed: bool) -> Vec<Line<'static>> {
    let (width, height) = (area.width as usize, area.height as usize);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let levels = resample(&frame.columns, width);
    let heights: Vec<f64> = levels
        .iter()
        .map(|&l| f64::from(l) / f64::from(MAX_LEVEL) * height as f64)
        .collect();

    let base = if frame.idle {
        Style::default().fg(Color::DarkGray)
    } else if dimmed {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };

    let mut rows: Vec<Vec<Span<'static>>> = (0..height)
        .map(|row| {
            let from_bottom = (height - 1 - row) as f64;
            (0..width)
                .map(|x| match frame.mode {
                    VisualizerMode::Wave if !frame.idle => {
                        wave_cell(levels[x], row, height, base)
                    }
                    mode => {
                        let fill = (heights[x] - from_bottom).clamp(0.0, 1.0);
                        let glyph = EIGHTHS[(fill * 8.0).round() as usize];
                        let color = if mode == VisualizerMode::Spectrum {
                            gradient(x as f64 / width as f64)
                        } else {
                            gradient(heights[x] / height as f64)
                        };
                        let style = if frame.idle { base } else { base.fg(color) };
                        Span::styled(glyph, style)
                    }
                })
                .collect()
        })
        .collect();

    if frame.idle && !frame.caption.is_empty() {
        let caption: Vec<char> = frame.caption.chars().collect();
        let row = height / 2;
        let start = width.saturating_sub(caption.len()) / 2;
        for (i, ch) in caption.iter().take(width).enumerate() {
            rows[row][start + i] = Span::styled(
                ch.to_string(),
                Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
            );
        }
    }

    rows.into_iter().map(Line::from).collect()
}

fn wave_cell(level: u8, row: usize, height: usize, base: Style) -> Span<'static> {
    let mid = (height / 2) as f64;
    let offset = (f64::from(level) / f64::from(MAX_LEVEL) - 0.5) * height as f64;
    let y = (mid - offset).round().clamp(0.0, (height - 1) as f64) as usize;
    if y != row {
        return Span::raw(" ");
    }
    let distance = (y as f64 - mid).abs() / (height as f64 / 2.0).max(1.0);
    Span::styled("●", base.fg(gradient(distance)))
}

/// Render the entire UI into the provided `frame`.
fn draw(
    f: &mut Frame,
    visual: &VisualFrame,
    meta: &DisplayMetadata,
    catalog: &Catalog,
    ui: &UiSettings,
    seek_seconds: u64,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    // Header: status line and progress bar.
    let header_block = Block::default()
        .borders(Borders::ALL)
        .title(ui.header_text.as_str())
        .title_alignment(Alignment::Center);
    let header_inner = header_block.inner(chunks[0]);
    f.render_widget(header_block, chunks[0]);

    let header_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(header_inner);
    f.render_widget(Paragraph::new(status_text(meta, ui)), header_rows[0]);

    let time_label = meta
        .track
        .as_ref()
        .and_then(|t| now_playing_time_text(secs_to_duration(meta.state.elapsed), t.duration, ui))
        .unwrap_or_default();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(progress_ratio(meta))
        .label(time_label);
    f.render_widget(gauge, header_rows[1]);

    // Body: visualizer and optional playlist.
    let body = if ui.show_playlist {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(chunks[1])
    };

    let vis_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", visual.mode.label().to_lowercase()));
    let vis_area = vis_block.inner(body[0]);
    f.render_widget(vis_block, body[0]);
    let dimmed = meta.state.status == Status::Paused;
    f.render_widget(Paragraph::new(visualizer_lines(visual, vis_area, dimmed)), vis_area);

    if ui.show_playlist && body.len() > 1 {
        draw_playlist(f, body[1], catalog, meta.state.current);
    }

    let footer = Paragraph::new(controls_text(seek_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(footer, chunks[2]);
}

fn draw_playlist(f: &mut Frame, area: Rect, catalog: &Catalog, current: Option<usize>) {
    // Only build ListItems for the visible window, centered on the current track.
    let total = catalog.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = current.unwrap_or(0).min(total.saturating_sub(1));
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let items: Vec<ListItem> = catalog.tracks()[start..end]
        .iter()
        .map(|t| ListItem::new(t.display.as_str()))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" tracks ({total}) ")),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if current.is_some() && total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    f.render_stateful_widget(list, area, &mut state);
}
