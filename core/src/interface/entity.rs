use serde::{Deserialize, Serialize};

/// How the vertices of a drawing entity are to be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryMode {
    /// Vertices are the polyline points (spline-fit export).
    PointSequence,
    /// Consecutive vertex pairs span circular arcs described by their bulge.
    ArcVertices,
    /// Anything else the drawing contains; rejected during reconstruction.
    Unrecognized(String),
}

/// Polyline vertex in drawing millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub location: [f64; 3],
    /// Tangent of a quarter of the included arc angle towards the next vertex.
    pub bulge: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64, bulge: f64) -> Self {
        Self {
            location: [x, y, 0.0],
            bulge,
        }
    }
}

/// One raw entity of a vector drawing, tagged with its layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingEntity {
    pub layer: String,
    pub mode: GeometryMode,
    pub vertices: Vec<Vertex>,
    /// The last vertex connects back to the first one.
    pub closed: bool,
}

impl DrawingEntity {
    pub fn new(layer: impl Into<String>, mode: GeometryMode, vertices: Vec<Vertex>) -> Self {
        Self {
            layer: layer.into(),
            mode,
            vertices,
            closed: false,
        }
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }
}
