//! Status bar widget - key, queue depth, graph size and audio level

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use netsonify::engine::Session;

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    played: u64,
    input_open: bool,
    sample_rate: Option<f32>,
    audio_stats: &AudioStats,
) {
    let block = Block::default().title(" netsonify ").borders(Borders::ALL);

    let chords = session.chords();
    let chord = chords
        .current()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let graph = session.graph();

    let (input, input_color) = if input_open {
        ("● live", Color::Green)
    } else {
        ("■ input done", Color::Yellow)
    };
    let audio = match sample_rate {
        Some(rate) => format!("{:.1}kHz  ", rate / 1000.0),
        None => "muted  ".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Key: {} minor  ", session.scales().key),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{input}  "), Style::default().fg(input_color)),
        Span::styled(
            format!("Queue: {}  Played: {played}  ", session.queued()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Hosts: {}  Links: {}  ", graph.nodes().len(), graph.edges().len()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Chord {}: {chord}  ", chords.index() + 1),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(audio, Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", audio_stats.peak, audio_stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
