//! Polygon scene widget
//!
//! Renders the fitted polygon, its vertices and the travelling marker on a
//! braille canvas. The canvas inner size doubles as the session viewport, so
//! the polygon refits itself when the terminal is resized.

use super::App;
use crate::sequencer::PlaybackState;
use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders,
    },
    Frame,
};

pub(crate) fn draw_polygon(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default().borders(Borders::ALL).title(" Polygon ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    app.fit_canvas(inner.width, inner.height);

    let viewport = app.session.viewport();
    let height = viewport.height;
    let polygon = app.session.polygon().clone();
    let active = app.session.edge_index();
    let stopped = app.session.state() == PlaybackState::Stopped;
    let marker = app.session.marker();
    let vertex_radius = (viewport.radius() / 14.0).max(1.0);

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, viewport.width])
        .y_bounds([0.0, height])
        .paint(move |ctx| {
            // Geometry uses screen coordinates (y down), the canvas a
            // mathematical y-axis, so every point is flipped against height.
            let n = polygon.len();
            for i in 0..n {
                let (a, b) = polygon.edge(i);
                let color = if !stopped && i == active {
                    Color::Yellow
                } else {
                    Color::Green
                };
                ctx.draw(&CanvasLine {
                    x1: a.x,
                    y1: height - a.y,
                    x2: b.x,
                    y2: height - b.y,
                    color,
                });
            }

            for i in 0..n {
                let v = polygon.vertex(i);
                let color = if !stopped && i == active {
                    Color::Yellow
                } else {
                    Color::White
                };
                ctx.draw(&Circle {
                    x: v.x,
                    y: height - v.y,
                    radius: vertex_radius,
                    color,
                });
            }

            if !stopped {
                ctx.draw(&Circle {
                    x: marker.x,
                    y: height - marker.y,
                    radius: (vertex_radius / 2.0).max(0.5),
                    color: Color::Magenta,
                });
            }
        });

    f.render_widget(canvas, inner);
}
