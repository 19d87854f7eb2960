//! Host graph widget - force-directed layout drawn on a braille canvas
//!
//! The layout is a small velocity-Verlet simulation:
//!
//!   charge  every pair of hosts repels (inverse distance)
//!   link    each edge pulls its endpoints toward a rest length
//!   center  the whole cloud is shifted back onto the origin
//!
//! Each step is scaled by `alpha`, which cools toward zero so the picture
//! settles. A graph change reheats it.

use std::collections::HashMap;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Block, Borders,
    },
    Frame,
};

use netsonify::{
    network::{GraphEdge, GraphNode, GraphView},
    packet::Protocol,
};

const CHARGE: f64 = -50.0;
const LINK_DISTANCE: f64 = 120.0;
const VELOCITY_DECAY: f64 = 0.4;
const ALPHA_MIN: f64 = 0.001;
const ALPHA_RESTART: f64 = 0.9;
/// 1 - ALPHA_MIN^(1/300): cools in about 300 steps
const ALPHA_DECAY: f64 = 0.0228;
/// Hosts labelled by address only while the graph is this small
const LABEL_LIMIT: usize = 24;

pub fn protocol_color(protocol: Protocol) -> Color {
    match protocol {
        Protocol::Udp => Color::Rgb(0x1D, 0xB9, 0x54),
        Protocol::Tcp => Color::Rgb(0xF3, 0x9C, 0x12),
        _ => Color::Rgb(0x7D, 0x3C, 0x98),
    }
}

#[derive(Debug, Clone)]
struct LayoutNode {
    id: String,
    protocol: Protocol,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

#[derive(Debug, Clone, Copy)]
struct LayoutLink {
    source: usize,
    target: usize,
    protocol: Protocol,
}

/// One drawn line standing for `count` links between the same hosts.
#[derive(Debug, Clone, Copy)]
struct Stroke {
    source: usize,
    target: usize,
    protocol: Protocol,
    count: usize,
}

pub struct GraphLayout {
    nodes: Vec<LayoutNode>,
    links: Vec<LayoutLink>,
    strokes: Vec<Stroke>,
    alpha: f64,
}

impl GraphLayout {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            strokes: Vec::new(),
            alpha: 0.0,
        }
    }

    /// Advance the simulation one step, if it is still warm.
    pub fn step(&mut self) {
        if self.alpha < ALPHA_MIN || self.nodes.is_empty() {
            return;
        }
        self.alpha -= self.alpha * ALPHA_DECAY;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_charge(alpha);

        for node in &mut self.nodes {
            node.vx *= 1.0 - VELOCITY_DECAY;
            node.vy *= 1.0 - VELOCITY_DECAY;
            node.x += node.vx;
            node.y += node.vy;
        }

        self.apply_center();
    }

    fn apply_links(&mut self, alpha: f64) {
        let mut degree = vec![0usize; self.nodes.len()];
        for link in &self.links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }

        for link in &self.links {
            let (s, t) = (link.source, link.target);
            if s == t {
                continue;
            }
            let source = &self.nodes[s];
            let target = &self.nodes[t];
            let mut dx = target.x + target.vx - source.x - source.vx;
            let mut dy = target.y + target.vy - source.y - source.vy;
            let mut len = (dx * dx + dy * dy).sqrt();
            if len < 1e-6 {
                // Coincident endpoints: nudge apart deterministically
                dx = 1e-3;
                dy = 0.0;
                len = 1e-3;
            }

            let strength = 1.0 / degree[s].min(degree[t]).max(1) as f64;
            let pull = (len - LINK_DISTANCE) / len * alpha * strength;
            let (dx, dy) = (dx * pull, dy * pull);
            let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;

            let target = &mut self.nodes[t];
            target.vx -= dx * bias;
            target.vy -= dy * bias;
            let source = &mut self.nodes[s];
            source.vx += dx * (1.0 - bias);
            source.vy += dy * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self, alpha: f64) {
        let count = self.nodes.len();
        for i in 0..count {
            let (mut fx, mut fy) = (0.0, 0.0);
            let (xi, yi) = (self.nodes[i].x, self.nodes[i].y);
            for (j, other) in self.nodes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let dx = other.x - xi;
                let dy = other.y - yi;
                let dist2 = (dx * dx + dy * dy).max(1.0);
                let w = CHARGE * alpha / dist2;
                fx += dx * w;
                fy += dy * w;
            }
            self.nodes[i].vx += fx;
            self.nodes[i].vy += fy;
        }
    }

    fn apply_center(&mut self) {
        let n = self.nodes.len() as f64;
        let (sx, sy) = self
            .nodes
            .iter()
            .fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
        let (cx, cy) = (sx / n, sy / n);
        for node in &mut self.nodes {
            node.x -= cx;
            node.y -= cy;
        }
    }

    /// Bounding box with some padding, never degenerate.
    fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let mut min = (-LINK_DISTANCE, -LINK_DISTANCE);
        let mut max = (LINK_DISTANCE, LINK_DISTANCE);
        for node in &self.nodes {
            min = (min.0.min(node.x), min.1.min(node.y));
            max = (max.0.max(node.x), max.1.max(node.y));
        }
        let pad = 20.0;
        ([min.0 - pad, max.0 + pad], [min.1 - pad, max.1 + pad])
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" Hosts ").borders(Borders::ALL);
        let (x_bounds, y_bounds) = self.bounds();
        let labelled = self.nodes.len() <= LABEL_LIMIT;

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(|ctx| {
                for stroke in &self.strokes {
                    let (s, t) = (&self.nodes[stroke.source], &self.nodes[stroke.target]);
                    let color = protocol_color(stroke.protocol);
                    ctx.draw(&CanvasLine::new(s.x, s.y, t.x, t.y, color));
                    if labelled && stroke.count > 1 {
                        ctx.print(
                            (s.x + t.x) / 2.0,
                            (s.y + t.y) / 2.0,
                            Span::styled(format!("x{}", stroke.count), Style::default().fg(color)),
                        );
                    }
                }
                ctx.layer();
                for node in &self.nodes {
                    ctx.draw(&Points {
                        coords: &[(node.x, node.y)],
                        color: protocol_color(node.protocol),
                    });
                    if labelled {
                        ctx.print(
                            node.x,
                            node.y,
                            Span::styled(node.id.clone(), Style::default().fg(Color::Gray)),
                        );
                    }
                }
            });

        frame.render_widget(canvas, area);
    }
}

/// Phyllotaxis spiral: spreads new hosts without overlapping.
fn initial_position(index: usize) -> (f64, f64) {
    let radius = 10.0 * (0.5 + index as f64).sqrt();
    let angle = index as f64 * std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (radius * angle.cos(), radius * angle.sin())
}

impl GraphView for GraphLayout {
    fn set_nodes(&mut self, nodes: &[GraphNode]) {
        let previous: HashMap<String, LayoutNode> = self
            .nodes
            .drain(..)
            .map(|node| (node.id.clone(), node))
            .collect();

        self.nodes = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| match previous.get(&node.id) {
                Some(kept) => LayoutNode {
                    protocol: node.protocol,
                    ..kept.clone()
                },
                None => {
                    let (x, y) = initial_position(index);
                    LayoutNode {
                        id: node.id.clone(),
                        protocol: node.protocol,
                        x,
                        y,
                        vx: 0.0,
                        vy: 0.0,
                    }
                }
            })
            .collect();
        // Indices changed, old links are stale until set_edges
        self.links.clear();
        self.strokes.clear();
    }

    fn set_edges(&mut self, edges: &[GraphEdge]) {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        // Every edge is its own link: repeated traffic adds pull and degree
        self.links = edges
            .iter()
            .filter_map(|edge| {
                let source = *index.get(edge.source.as_str())?;
                let target = *index.get(edge.target.as_str())?;
                Some(LayoutLink {
                    source,
                    target,
                    protocol: edge.protocol,
                })
            })
            .collect();

        // Drawn once per host pair, newest protocol, labelled with the count
        let mut strokes: Vec<Stroke> = Vec::new();
        let mut by_pair: HashMap<(usize, usize), usize> = HashMap::new();
        for link in &self.links {
            let pair = (link.source.min(link.target), link.source.max(link.target));
            match by_pair.get(&pair) {
                Some(&i) => {
                    strokes[i].count += 1;
                    strokes[i].protocol = link.protocol;
                }
                None => {
                    by_pair.insert(pair, strokes.len());
                    strokes.push(Stroke {
                        source: link.source,
                        target: link.target,
                        protocol: link.protocol,
                        count: 1,
                    });
                }
            }
        }
        self.strokes = strokes;
    }

    fn restart_layout(&mut self) {
        self.alpha = ALPHA_RESTART;
    }
}
