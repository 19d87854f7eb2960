//! Terminal UI for netsonify
//!
//! Drives the session clock on the UI thread and shows what it plays: host
//! graph, note log and the output waveform.

mod graph;
mod notes;
mod status;
mod waveform;

use std::{
    sync::mpsc::Receiver,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use netsonify::{engine::device::SoundDevice, engine::Session, packet::Packet};

use self::{
    graph::GraphLayout,
    notes::NoteLog,
    status::{render_status, AudioStats},
    waveform::render_waveform,
};
use super::source;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// UI application state
pub struct UiApp<D: SoundDevice> {
    session: Session,
    /// Packets from the input source
    packets: Receiver<Packet>,
    /// Whether the input source can still deliver
    input_open: bool,
    device: D,
    graph: GraphLayout,
    notes: NoteLog,
    /// Ring buffer receiver for audio samples
    audio_rx: Option<Consumer<f32>>,
    /// Audio sample buffer for visualization
    audio_buffer: Vec<f32>,
    sample_rate: Option<f32>,
    clock: Instant,
    played: u64,
    should_quit: bool,
}

impl<D: SoundDevice> UiApp<D> {
    pub fn new(
        session: Session,
        packets: Receiver<Packet>,
        device: D,
        audio_rx: Option<Consumer<f32>>,
        sample_rate: Option<f32>,
    ) -> Self {
        Self {
            session,
            packets,
            input_open: true,
            device,
            graph: GraphLayout::new(),
            notes: NoteLog::new(),
            audio_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            sample_rate,
            clock: Instant::now(),
            played: 0,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            if self.input_open {
                self.input_open = source::drain(&self.packets, &mut self.session);
            }

            let now = self.clock.elapsed().as_secs_f64();
            if let Some(played) = self.session.tick(now, &mut self.device, &mut self.graph) {
                self.played += 1;
                self.notes.push(now, &played);
            }

            self.graph.step();
            self.poll_audio();

            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Poll for new audio samples from ring buffer
    fn poll_audio(&mut self) {
        let Some(rx) = self.audio_rx.as_mut() else {
            return;
        };

        // Keep only the last VIS_BUFFER_SIZE samples
        while let Ok(sample) = rx.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if let KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc = key {
            self.should_quit = true;
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Main layout: status, graph + notes, waveform, help
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Graph and note log
                Constraint::Length(8), // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(rows[1]);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(
            frame,
            rows[0],
            &self.session,
            self.played,
            self.input_open,
            self.sample_rate,
            &stats,
        );
        self.graph.render(frame, middle[0]);
        self.notes.render(frame, middle[1]);
        render_waveform(frame, rows[2], &self.audio_buffer);

        let help = Paragraph::new(" [Q] Quit").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}
