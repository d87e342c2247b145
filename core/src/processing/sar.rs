use crate::prelude::{PipelineError, PipelineResult, PropertyValues};
use crate::processing::msf::{MsfSample, MSF_DIR};
use crate::processing::raster::MaterialMaps;
use ndarray::{Array2, Zip};

pub const SAR_DIR: &str = "sar";

/// Guards the division by density and the logarithm of zero SAR.
pub const SAR_EPSILON: f64 = 1e-20;

pub fn sar_filename(index: usize) -> String {
    format!("{}/sar_{:04}.png", SAR_DIR, index)
}

/// SAR grid paired 1:1 with the MSF sample it was derived from.
#[derive(Debug, Clone)]
pub struct SarSample {
    pub index: usize,
    pub filename: String,
    pub grid: Array2<f64>,
}

/// Converts MSF grids into SAR grids with fixed conductivity and density maps.
pub struct SarDeriver {
    conductivity: Array2<f64>,
    density: Array2<f64>,
}

impl SarDeriver {
    /// Physical conductivity (S/m) and density (kg/m^3), `[row, column]`.
    pub fn new(conductivity: Array2<f64>, density: Array2<f64>) -> PipelineResult<Self> {
        if conductivity.dim() != density.dim() {
            return Err(PipelineError::InvalidInput(format!(
                "conductivity {:?} and density {:?} grids differ in shape",
                conductivity.dim(),
                density.dim()
            )));
        }
        Ok(Self {
            conductivity,
            density,
        })
    }

    /// Recovers physical values from rasterized maps drawn with `scalars`.
    pub fn from_maps(maps: &MaterialMaps, scalars: &PropertyValues) -> PipelineResult<Self> {
        Self::new(
            maps.conductivity.physical(scalars.conductivity),
            maps.density.physical(scalars.density),
        )
    }

    pub fn derive(&self, sample: &MsfSample) -> PipelineResult<SarSample> {
        if sample.grid.dim() != self.conductivity.dim() {
            return Err(PipelineError::InvalidInput(format!(
                "msf grid {:?} does not match material grid {:?}",
                sample.grid.dim(),
                self.conductivity.dim()
            )));
        }
        let grid = Zip::from(&sample.grid)
            .and(&self.conductivity)
            .and(&self.density)
            .map_collect(|&msf, &sigma, &rho| msf * sigma / (rho + SAR_EPSILON));
        Ok(SarSample {
            index: sample.index,
            filename: sample.filename.replacen(MSF_DIR, SAR_DIR, 2),
            grid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::msf::{msf_filename, Excitation};
    use ndarray::array;

    fn sample(grid: Array2<f64>) -> MsfSample {
        MsfSample {
            index: 12,
            filename: msf_filename(12),
            excitation: Excitation::new(vec![0.0], vec![1.0]).unwrap(),
            grid,
        }
    }

    #[test]
    fn sar_scales_msf_by_conductivity_over_density() {
        let deriver = SarDeriver::new(array![[0.5, 1.0]], array![[1000.0, 2.0]]).unwrap();
        let sar = deriver.derive(&sample(array![[4.0, 3.0]])).unwrap();
        assert!((sar.grid[[0, 0]] - 0.002).abs() < 1e-15);
        assert!((sar.grid[[0, 1]] - 1.5).abs() < 1e-12);
        assert_eq!(sar.index, 12);
        assert_eq!(sar.filename, sar_filename(12));
    }

    #[test]
    fn zero_density_stays_finite() {
        let deriver = SarDeriver::new(array![[0.5]], array![[0.0]]).unwrap();
        let sar = deriver.derive(&sample(array![[2.0]])).unwrap();
        assert!(sar.grid[[0, 0]].is_finite());
        assert_eq!(sar.grid[[0, 0]], 2.0 * 0.5 / SAR_EPSILON);
    }

    #[test]
    fn zero_conductivity_gives_zero_sar() {
        let deriver = SarDeriver::new(array![[0.0]], array![[0.0]]).unwrap();
        let sar = deriver.derive(&sample(array![[7.0]])).unwrap();
        assert_eq!(sar.grid[[0, 0]], 0.0);
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        assert!(SarDeriver::new(array![[1.0, 2.0]], array![[1.0]]).is_err());
        let deriver = SarDeriver::new(array![[1.0]], array![[1.0]]).unwrap();
        assert!(deriver.derive(&sample(array![[1.0, 1.0]])).is_err());
    }
}
