const POLYLINE_CLOSED: i32 = 1;
const POLYLINE_SPLINE_FIT: i32 = 4;
const VERTEX_SPLINE_FIT: i32 = 8;

/// Wraps entity snippets into a document with a single `ENTITIES` section.
pub fn document(entities: &[String]) -> String {
    let mut dxf = String::from("0\nSECTION\n2\nENTITIES\n");
    for entity in entities {
        dxf.push_str(entity);
    }
    dxf.push_str("0\nENDSEC\n0\nEOF\n");
    dxf
}

/// Polyline whose segments are arcs around the origin, `[x, y, bulge]` per
/// vertex.
pub fn arc_polyline(layer: &str, vertices: &[[f64; 3]], closed: bool) -> String {
    let flags = if closed { POLYLINE_CLOSED } else { 0 };
    let mut dxf = polyline_header(layer, flags);
    for &[x, y, bulge] in vertices {
        dxf.push_str(&format!(
            "0\nVERTEX\n8\n{}\n10\n{}\n20\n{}\n30\n0.0\n42\n{}\n",
            layer, x, y, bulge
        ));
    }
    dxf.push_str(&format!("0\nSEQEND\n8\n{}\n", layer));
    dxf
}

/// Spline-fit polyline through `[x, y]` points.
pub fn spline_polyline(layer: &str, points: &[[f64; 2]]) -> String {
    let mut dxf = polyline_header(layer, POLYLINE_SPLINE_FIT);
    for &[x, y] in points {
        dxf.push_str(&format!(
            "0\nVERTEX\n8\n{}\n10\n{}\n20\n{}\n30\n0.0\n70\n{}\n",
            layer, x, y, VERTEX_SPLINE_FIT
        ));
    }
    dxf.push_str(&format!("0\nSEQEND\n8\n{}\n", layer));
    dxf
}

fn polyline_header(layer: &str, flags: i32) -> String {
    format!("0\nPOLYLINE\n8\n{}\n66\n1\n70\n{}\n", layer, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarmapcore::interface::{DxfReader, GeometryMode};

    #[test]
    fn snippets_parse_back() {
        let dxf = document(&[
            arc_polyline("BODY", &[[0.0, 5.0, 1.0], [0.0, -5.0, 1.0]], true),
            spline_polyline("IMPLANT", &[[1.0, 2.0], [3.0, 4.0]]),
        ]);
        let entities = DxfReader::parse(&dxf).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].mode, GeometryMode::ArcVertices);
        assert!(entities[0].closed);
        assert_eq!(entities[1].mode, GeometryMode::PointSequence);
        assert_eq!(entities[1].vertices[1].location, [3.0, 4.0, 0.0]);
    }
}
