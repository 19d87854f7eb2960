//! Note log widget - the most recent packets and what they played

use std::collections::VecDeque;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use netsonify::{engine::Played, sonify::Voice};

use super::graph::protocol_color;

const MAX_LINES: usize = 200;

pub struct NoteLog {
    lines: VecDeque<Line<'static>>,
}

impl NoteLog {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(MAX_LINES),
        }
    }

    pub fn push(&mut self, now: f64, played: &Played) {
        let packet = &played.packet;
        let size = packet
            .size
            .map_or_else(|| "-".to_string(), |size| size.to_string());

        let mut spans = vec![
            Span::styled(format!("{now:7.1}s "), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:<7}", packet.protocol.name()),
                Style::default().fg(protocol_color(packet.protocol)),
            ),
            Span::raw(format!("{size:>6}B ")),
        ];
        if played.events.is_empty() {
            spans.push(Span::styled("silent", Style::default().fg(Color::DarkGray)));
        }
        for event in &played.events {
            let notes = event
                .pitches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            spans.push(Span::styled(
                format!("{}:{notes} ", event.voice),
                Style::default().fg(voice_color(event.voice)),
            ));
        }

        if self.lines.len() == MAX_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(Line::from(spans));
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" Notes ").borders(Borders::ALL);
        let visible = block.inner(area).height as usize;

        // Newest at the bottom
        let lines: Vec<Line> = self
            .lines
            .iter()
            .skip(self.lines.len().saturating_sub(visible))
            .cloned()
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn voice_color(voice: Voice) -> Color {
    match voice {
        Voice::Melody => Color::White,
        Voice::Harmony => Color::LightYellow,
        Voice::Bass => Color::Blue,
        Voice::Percussion => Color::Red,
        Voice::Pad => Color::LightMagenta,
    }
}
