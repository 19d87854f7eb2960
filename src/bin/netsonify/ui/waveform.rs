//! Output scope. Packet notes are mostly quiet, so the vertical range
//! follows the recent peak instead of sitting at full scale.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Smallest half-height of the scope, so silence stays flat
const MIN_RANGE: f64 = 0.05;
/// Above this the output is near the clamp in the audio callback
const HOT_LEVEL: f64 = 0.9;

/// Peak absolute sample in `samples`.
fn peak(samples: &[f32]) -> f64 {
    samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs() as f64))
}

/// Symmetric vertical bounds for a given peak, never past full scale.
fn scope_range(peak: f64) -> f64 {
    (peak * 1.1).clamp(MIN_RANGE, 1.0)
}

pub fn render_waveform(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let level = peak(audio_buffer);
    let range = scope_range(level);

    let title = if audio_buffer.is_empty() {
        " Output (silent) ".to_string()
    } else {
        format!(" Output  peak {level:.2} ")
    };
    let color = if level > HOT_LEVEL { Color::Red } else { Color::Cyan };
    let block = Block::default().title(title).borders(Borders::ALL);

    // Only as many points as the braille grid can show
    let columns = (area.width.saturating_sub(2) as usize * 2).max(1);
    let stride = (audio_buffer.len() / columns).max(1);
    let len = audio_buffer.len().max(1) as f64;
    let data: Vec<(f64, f64)> = audio_buffer
        .iter()
        .enumerate()
        .step_by(stride)
        .map(|(i, &sample)| (i as f64 / len, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-range, range])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
