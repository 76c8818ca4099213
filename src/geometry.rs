//! Polygon geometry
//!
//! Pure vertex placement for regular polygons plus the viewport fitting used
//! by the renderer. Coordinates follow the screen convention (y grows
//! downward); views that need a mathematical y-axis flip it at draw time.

use std::f64::consts::PI;

/// Minimum number of polygon vertices. Requests below this are clamped.
pub const MIN_SIDES: usize = 3;

/// Default rotation offset so the first vertex points straight up.
pub const DEFAULT_ROTATION: f64 = -PI / 2.0;

/// A 2D point. Immutable once computed for a given shape and viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate (grows downward)
    pub y: f64,
}

impl Vertex {
    /// Create a vertex at the given coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Vertex { x, y }
    }

    /// Euclidean distance to another vertex.
    pub fn distance_to(&self, other: &Vertex) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Linear interpolation towards `other` by fraction `t` in [0, 1].
    pub fn lerp(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Compute the vertices of a regular polygon.
///
/// Vertex `i` sits at angle `rotation + i * 2π/n` on the circle of radius `r`
/// around `(cx, cy)`. Pure and deterministic; `n` is clamped to [`MIN_SIDES`].
pub fn polygon_vertices(cx: f64, cy: f64, r: f64, n: usize, rotation: f64) -> Vec<Vertex> {
    let n = n.max(MIN_SIDES);
    let mut pts = Vec::with_capacity(n);
    for i in 0..n {
        let a = rotation + i as f64 * 2.0 * PI / n as f64;
        pts.push(Vertex::new(cx + r * a.cos(), cy + r * a.sin()));
    }
    pts
}

/// Drawing area the polygon is fitted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in drawing units
    pub width: f64,
    /// Height in drawing units
    pub height: f64,
}

impl Viewport {
    /// Create a viewport of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Viewport { width, height }
    }

    /// Center point of the viewport.
    pub fn center(&self) -> Vertex {
        Vertex::new(self.width / 2.0, self.height / 2.0)
    }

    /// Polygon radius for this viewport: one third of the smaller dimension.
    pub fn radius(&self) -> f64 {
        self.width.min(self.height) / 3.0
    }

    /// Build a centered regular polygon with `n` vertices, first vertex up.
    pub fn fit_polygon(&self, n: usize) -> Polygon {
        let c = self.center();
        Polygon::new(polygon_vertices(c.x, c.y, self.radius(), n, DEFAULT_ROTATION))
    }
}

/// An ordered, implicitly closed sequence of vertices.
///
/// Edge `i` runs from vertex `i` to vertex `(i + 1) % len`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl Polygon {
    /// Wrap a vertex list. The list must hold at least [`MIN_SIDES`] points;
    /// shorter input is rebuilt as a degenerate triangle at the origin rather
    /// than panicking.
    pub fn new(vertices: Vec<Vertex>) -> Self {
        if vertices.len() < MIN_SIDES {
            return Polygon {
                vertices: vec![Vertex::default(); MIN_SIDES],
            };
        }
        Polygon { vertices }
    }

    /// Number of vertices (equals the number of edges).
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; construction guarantees at least [`MIN_SIDES`] vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex at index `i` (wraps around).
    pub fn vertex(&self, i: usize) -> Vertex {
        self.vertices[i % self.vertices.len()]
    }

    /// All vertices in order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Endpoints of edge `i`: vertex `i` and its successor.
    pub fn edge(&self, i: usize) -> (Vertex, Vertex) {
        let n = self.vertices.len();
        (self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    /// Point at fraction `t` in [0, 1) along edge `i`.
    pub fn point_on_edge(&self, i: usize, t: f64) -> Vertex {
        let (a, b) = self.edge(i);
        a.lerp(&b, t)
    }
}
