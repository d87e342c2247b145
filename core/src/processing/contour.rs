use crate::interface::entity::{DrawingEntity, GeometryMode, Vertex};
use crate::math::interp::linspace;
use crate::prelude::{ContourConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use std::collections::HashMap;

/// Planar point in millimeters, `[width axis, height axis]`.
pub type Point = [f64; 2];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineFragment {
    points: Vec<Point>,
}

impl LineFragment {
    pub fn new(points: Vec<Point>) -> PipelineResult<Self> {
        if points.is_empty() {
            return Err(PipelineError::Drawing("fragment without points".into()));
        }
        Ok(Self { points })
    }

    /// Converts a drawing entity into its point sequence.
    pub fn from_entity(entity: &DrawingEntity, arc_points: usize) -> PipelineResult<Self> {
        let points = match &entity.mode {
            GeometryMode::PointSequence => entity
                .vertices
                .iter()
                .map(|v| [v.location[1], v.location[0]])
                .collect(),
            GeometryMode::ArcVertices => arc_to_points(&entity.vertices, entity.closed, arc_points),
            GeometryMode::Unrecognized(mode) => {
                return Err(PipelineError::UnrecognizedGeometry {
                    layer: entity.layer.clone(),
                    mode: mode.clone(),
                })
            }
        };
        Self::new(points).map_err(|_| {
            PipelineError::Drawing(format!("entity on layer `{}` has no vertices", entity.layer))
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    fn append(mut self, other: LineFragment) -> Self {
        self.points.extend(other.points);
        self
    }

    fn reversed(mut self) -> Self {
        self.reverse();
        self
    }
}

/// Samples the circular arcs between consecutive vertices.
///
/// The arc center is taken to be the drawing origin; points are returned in
/// the same swapped axis order as point-sequence entities.
fn arc_to_points(vertices: &[Vertex], closed: bool, n: usize) -> Vec<Point> {
    let mut pairs: Vec<(&Vertex, &Vertex)> = vertices.iter().zip(vertices.iter().skip(1)).collect();
    if closed && vertices.len() > 1 {
        let (first, last) = (&vertices[0], &vertices[vertices.len() - 1]);
        if first.location != last.location {
            pairs.push((last, first));
        }
    }
    if pairs.is_empty() {
        return vertices
            .iter()
            .map(|v| [v.location[1], v.location[0]])
            .collect();
    }

    let mut points = Vec::with_capacity(pairs.len() * n);
    for (v1, v2) in pairs {
        let chord = distance_3d(v1.location, v2.location);
        let angle = 4.0 * v1.bulge.atan();
        let half_sine = (0.5 * angle).sin();
        if chord == 0.0 || half_sine == 0.0 {
            points.push([v1.location[1], v1.location[0]]);
            points.push([v2.location[1], v2.location[0]]);
            continue;
        }
        let radius = (chord / (2.0 * half_sine)).abs();
        let theta_start = v1.location[0].atan2(v1.location[1]);
        let theta_end = theta_start - angle;
        points.extend(
            linspace(theta_start, theta_end, n)
                .into_iter()
                .map(|theta| [radius * theta.cos(), radius * theta.sin()]),
        );
    }
    points
}

fn distance(a: Point, b: Point) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn distance_3d(a: [f64; 3], b: [f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    /// end(a) meets start(b): a + b
    EndToStart,
    /// end(b) meets start(a): b + a
    StartToEnd,
    /// end(a) meets end(b): a + reversed(b)
    EndToEnd,
    /// start(a) meets start(b): reversed(a) + b
    StartToStart,
}

fn find_join(a: &LineFragment, b: &LineFragment, tolerance: f64) -> Option<Join> {
    if distance(a.end(), b.start()) < tolerance {
        Some(Join::EndToStart)
    } else if distance(b.end(), a.start()) < tolerance {
        Some(Join::StartToEnd)
    } else if distance(a.end(), b.end()) < tolerance {
        Some(Join::EndToEnd)
    } else if distance(a.start(), b.start()) < tolerance {
        Some(Join::StartToStart)
    } else {
        None
    }
}

fn apply_join(join: Join, a: LineFragment, b: LineFragment) -> LineFragment {
    match join {
        Join::EndToStart => a.append(b),
        Join::StartToEnd => b.append(a),
        Join::EndToEnd => a.append(b.reversed()),
        Join::StartToStart => a.reversed().append(b),
    }
}

/// One sweep over the worklist. Returns the number of joins performed.
fn merge_pass(arena: &mut [LineFragment], live: &mut Vec<usize>, tolerance: f64) -> usize {
    let mut joins = 0;
    let mut a = 0;
    while a < live.len() {
        let mut b = a + 1;
        while b < live.len() {
            match find_join(&arena[live[a]], &arena[live[b]], tolerance) {
                Some(join) => {
                    let first = std::mem::take(&mut arena[live[a]]);
                    let second = std::mem::take(&mut arena[live[b]]);
                    arena[live[a]] = apply_join(join, first, second);
                    live.remove(b);
                    joins += 1;
                    b = a + 1;
                }
                None => b += 1,
            }
        }
        a += 1;
    }
    joins
}

/// Joins fragments until no pass reduces their number any further.
pub fn merge_fragments(
    fragments: Vec<LineFragment>,
    tolerance: f64,
    max_iterations: usize,
) -> Vec<LineFragment> {
    let mut arena = fragments;
    let mut live: Vec<usize> = (0..arena.len()).collect();
    for _ in 0..max_iterations.max(1) {
        if merge_pass(&mut arena, &mut live, tolerance) == 0 {
            break;
        }
    }
    live.into_iter()
        .map(|idx| std::mem::take(&mut arena[idx]))
        .collect()
}

/// Merged fragments of one drawing layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub layer: String,
    pub fragments: Vec<LineFragment>,
}

impl Contour {
    /// True when no two fragments have endpoints within `tolerance`.
    pub fn is_maximally_merged(&self, tolerance: f64) -> bool {
        self.fragments.iter().enumerate().all(|(i, a)| {
            self.fragments[i + 1..]
                .iter()
                .all(|b| find_join(a, b, tolerance).is_none())
        })
    }
}

pub struct ContourReconstructor {
    config: ContourConfig,
    logger: LogManager,
}

impl ContourReconstructor {
    pub fn new(config: ContourConfig) -> Self {
        Self {
            config,
            logger: LogManager::new(),
        }
    }

    /// Groups entities by layer and merges each layer's fragments. Layers are
    /// returned in the order they first appear in the drawing, which is also
    /// the draw order of the rasterizer.
    pub fn reconstruct(&self, entities: &[DrawingEntity]) -> PipelineResult<Vec<Contour>> {
        let mut order: Vec<String> = Vec::new();
        let mut by_layer: HashMap<String, Vec<LineFragment>> = HashMap::new();
        for entity in entities {
            let fragment = LineFragment::from_entity(entity, self.config.arc_points)?;
            by_layer
                .entry(entity.layer.clone())
                .or_insert_with(|| {
                    order.push(entity.layer.clone());
                    Vec::new()
                })
                .push(fragment);
        }

        let mut contours = Vec::with_capacity(order.len());
        for layer in order {
            let fragments = by_layer.remove(&layer).unwrap_or_default();
            let raw_count = fragments.len();
            let merged = merge_fragments(
                fragments,
                self.config.join_tolerance,
                self.config.max_iterations,
            );
            self.logger.trace(&format!(
                "layer {}: {} fragments merged into {}",
                layer,
                raw_count,
                merged.len()
            ));
            contours.push(Contour {
                layer,
                fragments: merged,
            });
        }
        Ok(contours)
    }
}
