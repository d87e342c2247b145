use crate::interface::entity::{DrawingEntity, GeometryMode, Vertex};
use crate::prelude::{PipelineError, PipelineResult};
use std::path::Path;

const FLAG_CLOSED: i32 = 1;
const FLAG_SPLINE_FIT: i32 = 4;
const FLAG_POLYLINE_3D: i32 = 8;
const FLAG_POLYMESH: i32 = 16;
const FLAG_POLYFACE: i32 = 64;
const VERTEX_FLAG_SPLINE_FRAME: i32 = 16;

struct Record {
    kind: String,
    fields: Vec<(i32, String)>,
}

impl Record {
    fn text(&self, code: i32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| v.as_str())
    }

    fn number(&self, code: i32) -> PipelineResult<Option<f64>> {
        self.text(code)
            .map(|value| {
                value.parse::<f64>().map_err(|_| {
                    PipelineError::Drawing(format!(
                        "{}: group {} is not a number: `{}`",
                        self.kind, code, value
                    ))
                })
            })
            .transpose()
    }

    fn flags(&self) -> PipelineResult<i32> {
        Ok(self.number(70)?.map(|v| v as i32).unwrap_or(0))
    }

    fn layer(&self) -> String {
        self.text(8).unwrap_or("0").to_string()
    }
}

struct OpenPolyline {
    layer: String,
    flags: i32,
    vertices: Vec<Vertex>,
}

impl OpenPolyline {
    fn finish(self) -> DrawingEntity {
        let mode = if self.flags & FLAG_SPLINE_FIT != 0 {
            GeometryMode::PointSequence
        } else if self.flags & FLAG_POLYLINE_3D != 0 {
            GeometryMode::Unrecognized("polyline3d".into())
        } else if self.flags & FLAG_POLYMESH != 0 {
            GeometryMode::Unrecognized("polymesh".into())
        } else if self.flags & FLAG_POLYFACE != 0 {
            GeometryMode::Unrecognized("polyface".into())
        } else {
            GeometryMode::ArcVertices
        };
        DrawingEntity {
            layer: self.layer,
            mode,
            vertices: self.vertices,
            closed: self.flags & FLAG_CLOSED != 0,
        }
    }
}

pub struct DxfReader;

impl DxfReader {
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Vec<DrawingEntity>> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| PipelineError::io(path, source))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> PipelineResult<Vec<DrawingEntity>> {
        let pairs = group_pairs(content)?;
        let records = entity_records(&pairs)?;

        let mut entities = Vec::new();
        let mut open: Option<OpenPolyline> = None;
        for record in &records {
            match record.kind.as_str() {
                "POLYLINE" => {
                    if let Some(polyline) = open.take() {
                        entities.push(polyline.finish());
                    }
                    open = Some(OpenPolyline {
                        layer: record.layer(),
                        flags: record.flags()?,
                        vertices: Vec::new(),
                    });
                }
                "VERTEX" => {
                    let polyline = open.as_mut().ok_or_else(|| {
                        PipelineError::Drawing("VERTEX outside of a POLYLINE".into())
                    })?;
                    if record.flags()? & VERTEX_FLAG_SPLINE_FRAME != 0 {
                        continue;
                    }
                    polyline.vertices.push(Vertex {
                        location: [
                            record.number(10)?.unwrap_or(0.0),
                            record.number(20)?.unwrap_or(0.0),
                            record.number(30)?.unwrap_or(0.0),
                        ],
                        bulge: record.number(42)?.unwrap_or(0.0),
                    });
                }
                "SEQEND" => {
                    if let Some(polyline) = open.take() {
                        entities.push(polyline.finish());
                    }
                }
                other => {
                    if let Some(polyline) = open.take() {
                        entities.push(polyline.finish());
                    }
                    entities.push(DrawingEntity::new(
                        record.layer(),
                        GeometryMode::Unrecognized(other.to_lowercase()),
                        Vec::new(),
                    ));
                }
            }
        }
        if let Some(polyline) = open.take() {
            entities.push(polyline.finish());
        }
        Ok(entities)
    }
}

fn group_pairs(content: &str) -> PipelineResult<Vec<(i32, String)>> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() % 2 != 0 {
        // a trailing blank line after EOF is common
        if lines.last().map(|l| l.trim().is_empty()) != Some(true) {
            return Err(PipelineError::Drawing(
                "odd number of lines in group code stream".into(),
            ));
        }
    }
    lines
        .chunks_exact(2)
        .map(|pair| {
            let code = pair[0].trim().parse::<i32>().map_err(|_| {
                PipelineError::Drawing(format!("invalid group code `{}`", pair[0].trim()))
            })?;
            Ok((code, pair[1].trim().to_string()))
        })
        .collect()
}

fn entity_records(pairs: &[(i32, String)]) -> PipelineResult<Vec<Record>> {
    let start = pairs
        .windows(2)
        .position(|w| w[0].0 == 0 && w[0].1 == "SECTION" && w[1].0 == 2 && w[1].1 == "ENTITIES")
        .ok_or_else(|| PipelineError::Drawing("no ENTITIES section".into()))?;

    let mut records: Vec<Record> = Vec::new();
    for (code, value) in &pairs[start + 2..] {
        if *code == 0 {
            if value == "ENDSEC" {
                return Ok(records);
            }
            records.push(Record {
                kind: value.clone(),
                fields: Vec::new(),
            });
        } else if let Some(record) = records.last_mut() {
            record.fields.push((*code, value.clone()));
        }
    }
    Err(PipelineError::Drawing("unterminated ENTITIES section".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> String {
        format!("0\nSECTION\n2\nENTITIES\n{}0\nENDSEC\n0\nEOF\n", body)
    }

    const ARC_POLYLINE: &str = "0\nPOLYLINE\n8\nBOUNDARY\n66\n1\n70\n1\n\
        0\nVERTEX\n8\nBOUNDARY\n10\n0.0\n20\n40.0\n30\n0.0\n42\n1.0\n\
        0\nVERTEX\n8\nBOUNDARY\n10\n0.0\n20\n-40.0\n30\n0.0\n42\n1.0\n\
        0\nSEQEND\n8\nBOUNDARY\n";

    #[test]
    fn parses_closed_arc_polyline() {
        let entities = DxfReader::parse(&document(ARC_POLYLINE)).unwrap();
        assert_eq!(entities.len(), 1);
        let entity = &entities[0];
        assert_eq!(entity.layer, "BOUNDARY");
        assert_eq!(entity.mode, GeometryMode::ArcVertices);
        assert!(entity.closed);
        assert_eq!(entity.vertices.len(), 2);
        assert_eq!(entity.vertices[1].location, [0.0, -40.0, 0.0]);
        assert_eq!(entity.vertices[0].bulge, 1.0);
    }

    #[test]
    fn spline_fit_polyline_skips_frame_points() {
        let body = "0\nPOLYLINE\n8\nPHANTOM\n70\n4\n\
            0\nVERTEX\n8\nPHANTOM\n10\n1.0\n20\n2.0\n70\n8\n\
            0\nVERTEX\n8\nPHANTOM\n10\n9.0\n20\n9.0\n70\n16\n\
            0\nVERTEX\n8\nPHANTOM\n10\n3.0\n20\n4.0\n70\n8\n\
            0\nSEQEND\n";
        let entities = DxfReader::parse(&document(body)).unwrap();
        assert_eq!(entities[0].mode, GeometryMode::PointSequence);
        assert_eq!(entities[0].vertices.len(), 2);
        assert!(!entities[0].closed);
    }

    #[test]
    fn other_entities_are_unrecognized() {
        let body = "0\nLINE\n8\nWIRE\n10\n0\n20\n0\n11\n1\n21\n1\n";
        let entities = DxfReader::parse(&document(body)).unwrap();
        assert_eq!(
            entities[0].mode,
            GeometryMode::Unrecognized("line".into())
        );
        assert_eq!(entities[0].layer, "WIRE");
    }

    #[test]
    fn three_dimensional_polyline_is_unrecognized() {
        let body = "0\nPOLYLINE\n8\nA\n70\n8\n0\nSEQEND\n";
        let entities = DxfReader::parse(&document(body)).unwrap();
        assert_eq!(
            entities[0].mode,
            GeometryMode::Unrecognized("polyline3d".into())
        );
    }

    #[test]
    fn missing_entities_section_is_an_error() {
        let err = DxfReader::parse("0\nSECTION\n2\nHEADER\n0\nENDSEC\n0\nEOF\n").unwrap_err();
        assert!(matches!(err, PipelineError::Drawing(_)));
    }

    #[test]
    fn malformed_number_is_reported() {
        let body = "0\nPOLYLINE\n8\nA\n0\nVERTEX\n10\nabc\n20\n0\n0\nSEQEND\n";
        assert!(DxfReader::parse(&document(body)).is_err());
    }
}
