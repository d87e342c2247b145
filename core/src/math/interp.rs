use ndarray::ArrayView2;
use std::ops::{Add, Mul, Sub};

/// `n` evenly spaced values from `start` to `end`, both ends included exactly.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}

fn lerp<T>(a: T, b: T, t: f64) -> T
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
{
    a + (b - a) * t
}

/// Rectilinear sample grid described by its sorted, distinct axis coordinates.
///
/// Values sampled on the grid are laid out `[x index, z index]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularGrid {
    x: Vec<f64>,
    z: Vec<f64>,
}

impl RegularGrid {
    /// Builds the grid from scattered sample coordinates. Returns `None` when
    /// either axis has fewer than two distinct coordinates.
    pub fn from_coordinates(xs: &[f64], zs: &[f64]) -> Option<Self> {
        let x = unique_sorted(xs);
        let z = unique_sorted(zs);
        if x.len() < 2 || z.len() < 2 {
            return None;
        }
        Some(Self { x, z })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.x.len(), self.z.len())
    }

    /// Grid index of a sample coordinate that lies exactly on the grid.
    pub fn index_of(&self, x: f64, z: f64) -> Option<(usize, usize)> {
        let ix = exact_position(&self.x, x)?;
        let iz = exact_position(&self.z, z)?;
        Some((ix, iz))
    }

    /// Bilinear interpolation of `values` at `(x, z)`. Points outside the grid
    /// are clamped to its border.
    pub fn interpolate<T>(&self, values: &ArrayView2<T>, x: f64, z: f64) -> T
    where
        T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>,
    {
        let (ix, tx) = locate(&self.x, x);
        let (iz, tz) = locate(&self.z, z);
        let v0 = lerp(values[[ix, iz]], values[[ix + 1, iz]], tx);
        let v1 = lerp(values[[ix, iz + 1]], values[[ix + 1, iz + 1]], tx);
        lerp(v0, v1, tz)
    }
}

fn unique_sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
}

fn exact_position(axis: &[f64], value: f64) -> Option<usize> {
    let idx = axis.partition_point(|&a| a < value);
    (idx < axis.len() && axis[idx] == value).then_some(idx)
}

/// Lower cell index and fractional offset of `value` along `axis`.
fn locate(axis: &[f64], value: f64) -> (usize, f64) {
    let last_cell = axis.len() - 2;
    let value = value.clamp(axis[0], axis[axis.len() - 1]);
    let idx = axis
        .partition_point(|&a| a <= value)
        .saturating_sub(1)
        .min(last_cell);
    let t = (value - axis[idx]) / (axis[idx + 1] - axis[idx]);
    (idx, t)
}
