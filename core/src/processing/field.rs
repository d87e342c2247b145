use crate::interface::field_export::FieldExport;
use crate::math::interp::{linspace, RegularGrid};
use crate::prelude::{ImageConfig, PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use ndarray::{Array2, Array3, ArrayView2, Axis};
use num_complex::Complex64;
use std::path::PathBuf;

pub const COMPONENTS: usize = 3;

/// Interpolated complex field of every antenna on the shared target grid.
///
/// Indexed `[point, antenna, component]`, where point `p` sits at row
/// `p / width` (z axis) and column `p % width` (x axis).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexFieldPerAntenna {
    field: Array3<Complex64>,
    x: Vec<f64>,
    z: Vec<f64>,
}

impl ComplexFieldPerAntenna {
    pub fn new(field: Array3<Complex64>, x: Vec<f64>, z: Vec<f64>) -> PipelineResult<Self> {
        let (points, _, components) = field.dim();
        if x.len() < 2 || z.len() < 2 {
            return Err(PipelineError::Field(
                "target grid needs at least two columns and rows".into(),
            ));
        }
        if points != x.len() * z.len() || components != COMPONENTS {
            return Err(PipelineError::Field(format!(
                "field shape {:?} does not match a {}x{} grid",
                field.dim(),
                x.len(),
                z.len()
            )));
        }
        Ok(Self { field, x, z })
    }

    pub fn field(&self) -> &Array3<Complex64> {
        &self.field
    }

    pub fn antennas(&self) -> usize {
        self.field.dim().1
    }

    pub fn points(&self) -> usize {
        self.field.dim().0
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// `(height, width)` of the target grid.
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.z.len(), self.x.len())
    }

    /// Spacing between neighbouring target samples along x and z.
    pub fn mm_per_px(&self) -> [f64; 2] {
        [self.x[1] - self.x[0], self.z[1] - self.z[0]]
    }
}

/// Resamples per-antenna exports onto a uniform grid at the image resolution.
pub struct FieldInterpolator {
    image: ImageConfig,
    logger: LogManager,
}

impl FieldInterpolator {
    pub fn new(image: ImageConfig) -> Self {
        Self {
            image,
            logger: LogManager::new(),
        }
    }

    /// Loads and resamples the exports one at a time. Path order defines the
    /// antenna index.
    pub fn load(&self, paths: &[PathBuf]) -> PipelineResult<ComplexFieldPerAntenna> {
        let mut target: Option<(Vec<f64>, Vec<f64>)> = None;
        let mut field = Array3::zeros((self.points(), paths.len(), COMPONENTS));
        for (antenna, path) in paths.iter().enumerate() {
            let export = FieldExport::load(path)?;
            let (x, z) = target.get_or_insert_with(|| self.target_axes(&export));
            let resampled = self
                .resample(&export, x, z)
                .map_err(|err| PipelineError::Field(format!("{}: {}", path.display(), err)))?;
            field.index_axis_mut(Axis(1), antenna).assign(&resampled);
            self.logger
                .trace(&format!("antenna {} <- {}", antenna, path.display()));
        }
        let (x, z) = target.ok_or_else(|| PipelineError::Field("no field exports".into()))?;
        ComplexFieldPerAntenna::new(field, x, z)
    }

    pub fn interpolate(&self, exports: &[FieldExport]) -> PipelineResult<ComplexFieldPerAntenna> {
        let first = exports
            .first()
            .ok_or_else(|| PipelineError::Field("no field exports".into()))?;
        let (x, z) = self.target_axes(first);
        let mut field = Array3::zeros((self.points(), exports.len(), COMPONENTS));
        for (antenna, export) in exports.iter().enumerate() {
            let resampled = self
                .resample(export, &x, &z)
                .map_err(|err| PipelineError::Field(format!("antenna {}: {}", antenna, err)))?;
            field.index_axis_mut(Axis(1), antenna).assign(&resampled);
        }
        ComplexFieldPerAntenna::new(field, x, z)
    }

    fn points(&self) -> usize {
        self.image.width * self.image.height
    }

    /// Uniform target axes spanning the observed bounds of an export.
    fn target_axes(&self, export: &FieldExport) -> (Vec<f64>, Vec<f64>) {
        let bounds = |values: &[f64]| {
            values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        let (x_min, x_max) = bounds(&export.x);
        let (z_min, z_max) = bounds(&export.z);
        (
            linspace(x_min, x_max, self.image.width),
            linspace(z_min, z_max, self.image.height),
        )
    }

    /// Interpolates one export onto the target axes, `[point, component]`.
    fn resample(
        &self,
        export: &FieldExport,
        x: &[f64],
        z: &[f64],
    ) -> PipelineResult<Array2<Complex64>> {
        let (grid, native) = native_grid(export)?;
        for (name, source, target) in [("x", grid.x(), x), ("z", grid.z(), z)] {
            if !covers(source, target) {
                return Err(PipelineError::Field(format!(
                    "export spans {} {}..{} but the target grid needs {}..{}",
                    name,
                    source[0],
                    source[source.len() - 1],
                    target[0],
                    target[target.len() - 1]
                )));
            }
        }
        let width = x.len();
        let mut resampled = Array2::zeros((x.len() * z.len(), COMPONENTS));
        for component in 0..COMPONENTS {
            let values: ArrayView2<Complex64> = native.index_axis(Axis(2), component);
            for (point, sample) in resampled.column_mut(component).iter_mut().enumerate() {
                *sample = grid.interpolate(&values, x[point % width], z[point / width]);
            }
        }
        Ok(resampled)
    }
}

/// Whether the sorted `source` axis spans every value of the sorted `target`
/// axis, up to rounding.
fn covers(source: &[f64], target: &[f64]) -> bool {
    let (Some(&lo), Some(&hi)) = (source.first(), source.last()) else {
        return false;
    };
    let (Some(&first), Some(&last)) = (target.first(), target.last()) else {
        return true;
    };
    let tolerance = 1e-9 * (1.0 + (hi - lo).abs());
    first >= lo - tolerance && last <= hi + tolerance
}

/// Places every sample of an export on its native grid, `[x, z, component]`.
fn native_grid(export: &FieldExport) -> PipelineResult<(RegularGrid, Array3<Complex64>)> {
    let grid = RegularGrid::from_coordinates(&export.x, &export.z).ok_or_else(|| {
        PipelineError::Field("degenerate source grid: zero extent along x or z".into())
    })?;
    let (nx, nz) = grid.shape();
    let mut values = Array3::zeros((nx, nz, COMPONENTS));
    let mut seen = Array2::from_elem((nx, nz), false);
    for ((&x, &z), sample) in export.x.iter().zip(&export.z).zip(&export.field) {
        let (ix, iz) = grid.index_of(x, z).ok_or_else(|| {
            PipelineError::Field(format!("sample ({}, {}) is off the grid", x, z))
        })?;
        for (component, value) in sample.iter().enumerate() {
            values[[ix, iz, component]] = *value;
        }
        seen[[ix, iz]] = true;
    }
    let filled = seen.iter().filter(|&&s| s).count();
    if filled != nx * nz {
        return Err(PipelineError::Field(format!(
            "incomplete source grid: {} of {} points present",
            filled,
            nx * nz
        )));
    }
    Ok((grid, values))
}
