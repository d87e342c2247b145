pub struct PolygonFill;

impl PolygonFill {
    /// Covered pixels as `(row, column)` pairs in row-major order.
    pub fn pixels(vertices: &[[i32; 2]], width: usize, height: usize) -> Vec<(usize, usize)> {
        if vertices.is_empty() || width == 0 || height == 0 {
            return Vec::new();
        }
        let mut mask = vec![false; width * height];
        Self::fill_interior(vertices, width, height, &mut mask);
        Self::trace_outline(vertices, width, height, &mut mask);

        mask.iter()
            .enumerate()
            .filter(|(_, covered)| **covered)
            .map(|(idx, _)| (idx / width, idx % width))
            .collect()
    }

    fn fill_interior(vertices: &[[i32; 2]], width: usize, height: usize, mask: &mut [bool]) {
        if vertices.len() < 3 {
            return;
        }
        let row_min = vertices.iter().map(|v| v[1]).min().unwrap_or(0).max(0);
        let row_max = vertices
            .iter()
            .map(|v| v[1])
            .max()
            .unwrap_or(0)
            .min(height as i32 - 1);

        let mut crossings = Vec::with_capacity(vertices.len());
        for row in row_min..=row_max {
            crossings.clear();
            for (k, a) in vertices.iter().enumerate() {
                let b = &vertices[(k + 1) % vertices.len()];
                let (lo, hi) = (a[1].min(b[1]), a[1].max(b[1]));
                if a[1] == b[1] || row < lo || row >= hi {
                    continue;
                }
                let t = (row - a[1]) as f64 / (b[1] - a[1]) as f64;
                crossings.push(a[0] as f64 + t * (b[0] - a[0]) as f64);
            }
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                let first = span[0].ceil().max(0.0);
                let last = span[1].floor().min(width as f64 - 1.0);
                if first > last {
                    continue;
                }
                let offset = row as usize * width;
                for col in first as usize..=last as usize {
                    mask[offset + col] = true;
                }
            }
        }
    }

    fn trace_outline(vertices: &[[i32; 2]], width: usize, height: usize, mask: &mut [bool]) {
        let mut plot = |col: i32, row: i32| {
            if col >= 0 && row >= 0 && (col as usize) < width && (row as usize) < height {
                mask[row as usize * width + col as usize] = true;
            }
        };
        if vertices.len() == 1 {
            plot(vertices[0][0], vertices[0][1]);
            return;
        }
        for (k, a) in vertices.iter().enumerate() {
            let b = &vertices[(k + 1) % vertices.len()];
            bresenham(*a, *b, &mut plot);
        }
    }
}

fn bresenham(from: [i32; 2], to: [i32; 2], plot: &mut impl FnMut(i32, i32)) {
    let [mut x, mut y] = from;
    let dx = (to[0] - x).abs();
    let dy = -(to[1] - y).abs();
    let sx = if x < to[0] { 1 } else { -1 };
    let sy = if y < to[1] { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        plot(x, y);
        if x == to[0] && y == to[1] {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn covered(vertices: &[[i32; 2]], width: usize, height: usize) -> HashSet<(usize, usize)> {
        PolygonFill::pixels(vertices, width, height).into_iter().collect()
    }

    #[test]
    fn square_covers_interior_and_outline_only() {
        let pixels = covered(&[[2, 2], [6, 2], [6, 6], [2, 6]], 10, 10);
        assert_eq!(pixels.len(), 25);
        assert!(pixels.contains(&(4, 4)));
        assert!(pixels.contains(&(2, 6)));
        assert!(!pixels.contains(&(1, 4)));
        assert!(!pixels.contains(&(7, 7)));
    }

    #[test]
    fn triangle_interior_is_filled() {
        let pixels = covered(&[[0, 0], [20, 0], [0, 20]], 32, 32);
        for row in 1..18usize {
            for col in 1..(19 - row) {
                assert!(pixels.contains(&(row, col)), "missing ({}, {})", row, col);
            }
        }
        assert!(!pixels.contains(&(15, 15)));
    }

    #[test]
    fn polygon_is_clipped_to_raster() {
        let pixels = covered(&[[-5, -5], [50, -5], [50, 50], [-5, 50]], 8, 4);
        assert_eq!(pixels.len(), 32);
    }

    #[test]
    fn degenerate_polygons_trace_their_outline() {
        assert_eq!(covered(&[[3, 3]], 8, 8).len(), 1);
        let segment = covered(&[[0, 0], [4, 0]], 8, 8);
        assert_eq!(segment.len(), 5);
    }
}
