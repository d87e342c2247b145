use crate::interface::manifest::ConfigurationRecord;
use crate::prelude::{ExcitationConfig, PipelineError, PipelineResult};
use crate::processing::field::{ComplexFieldPerAntenna, COMPONENTS};
use crate::telemetry::log::LogManager;
use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rand::Rng;

pub const MSF_DIR: &str = "msf";

/// Project-relative image name of MSF sample `index`.
pub fn msf_filename(index: usize) -> String {
    format!("{}/msf_{:04}.png", MSF_DIR, index)
}

/// Per-antenna phases (radians) and amplitudes of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Excitation {
    phases: Vec<f64>,
    amplitudes: Vec<f64>,
}

impl Excitation {
    pub fn new(phases: Vec<f64>, amplitudes: Vec<f64>) -> PipelineResult<Self> {
        if phases.is_empty() || phases.len() != amplitudes.len() {
            return Err(PipelineError::InvalidInput(format!(
                "excitation needs one phase and amplitude per antenna, got {} and {}",
                phases.len(),
                amplitudes.len()
            )));
        }
        Ok(Self { phases, amplitudes })
    }

    /// Draws a fresh excitation. Antenna 0 is the phase reference and always
    /// gets phase 0.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, antennas: usize, config: &ExcitationConfig) -> Self {
        let [phase_low, phase_high] = config.phase_limit;
        let [amp_low, amp_high] = config.amplitude_limit;
        let phases = (0..antennas)
            .map(|idx| {
                if idx == 0 {
                    0.0
                } else {
                    rng.gen_range(phase_low..phase_high)
                }
            })
            .collect();
        let amplitudes = (0..antennas)
            .map(|_| rng.gen_range(amp_low..=amp_high))
            .collect();
        Self { phases, amplitudes }
    }

    pub fn phases(&self) -> &[f64] {
        &self.phases
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn antennas(&self) -> usize {
        self.phases.len()
    }

    /// Rotates `value` by the antenna's phase and scales it by its amplitude.
    fn apply(&self, antenna: usize, value: Complex64) -> Complex64 {
        let (sin, cos) = self.phases[antenna].sin_cos();
        let shifted = Complex64::new(
            value.re * cos - value.im * sin,
            value.im * cos + value.re * sin,
        );
        shifted * self.amplitudes[antenna]
    }
}

/// One generated MSF grid, `[row, column]`, in linear units.
#[derive(Debug, Clone)]
pub struct MsfSample {
    pub index: usize,
    pub filename: String,
    pub excitation: Excitation,
    pub grid: Array2<f64>,
}

impl MsfSample {
    pub fn record(&self) -> ConfigurationRecord {
        ConfigurationRecord {
            index: self.index,
            filename: self.filename.clone(),
            phases: self.excitation.phases.clone(),
            amplitudes: self.excitation.amplitudes.clone(),
        }
    }
}

/// Draws excitations and evaluates their MSF over one project's field.
///
/// Iterating the engine yields the configured number of samples.
pub struct MsfEngine<'a, R: Rng> {
    field: &'a ComplexFieldPerAntenna,
    config: ExcitationConfig,
    rng: R,
    next_index: usize,
    logger: LogManager,
}

impl<'a, R: Rng> MsfEngine<'a, R> {
    pub fn new(
        field: &'a ComplexFieldPerAntenna,
        config: ExcitationConfig,
        rng: R,
    ) -> PipelineResult<Self> {
        if field.antennas() == 0 {
            return Err(PipelineError::Field("field has no antennas".into()));
        }
        Ok(Self {
            field,
            config,
            rng,
            next_index: 0,
            logger: LogManager::new(),
        })
    }

    /// Coherent sum of the excited antenna fields, `[point, component]`.
    pub fn superpose(&self, excitation: &Excitation) -> PipelineResult<Array2<Complex64>> {
        if excitation.antennas() != self.field.antennas() {
            return Err(PipelineError::InvalidInput(format!(
                "excitation for {} antennas applied to {} antennas",
                excitation.antennas(),
                self.field.antennas()
            )));
        }
        let mut total = Array2::zeros((self.field.points(), COMPONENTS));
        for (antenna, antenna_field) in self.field.field().axis_iter(Axis(1)).enumerate() {
            total.zip_mut_with(&antenna_field, |sum, &value| {
                *sum += excitation.apply(antenna, value);
            });
        }
        Ok(total)
    }

    /// MSF grid of `excitation`, `[row, column]`.
    pub fn evaluate(&self, excitation: &Excitation) -> PipelineResult<Array2<f64>> {
        let total = self.superpose(excitation)?;
        let msf: Vec<f64> = total
            .axis_iter(Axis(0))
            .map(|components| 0.5 * components.iter().map(|c| c.norm_sqr()).sum::<f64>())
            .collect();
        let (height, width) = self.field.grid_shape();
        Array2::from_shape_vec((height, width), msf)
            .map_err(|err| PipelineError::Field(format!("msf grid shape: {}", err)))
    }

    /// Draws a new excitation and evaluates it as sample `index`.
    pub fn generate(&mut self, index: usize) -> PipelineResult<MsfSample> {
        let excitation = Excitation::draw(&mut self.rng, self.field.antennas(), &self.config);
        let grid = self.evaluate(&excitation)?;
        self.logger
            .trace(&format!("msf sample {} phases {:?}", index, excitation.phases()));
        Ok(MsfSample {
            index,
            filename: msf_filename(index),
            excitation,
            grid,
        })
    }
}

impl<'a, R: Rng> Iterator for MsfEngine<'a, R> {
    type Item = PipelineResult<MsfSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.config.samples {
            return None;
        }
        let index = self.next_index;
        self.next_index += 1;
        Some(self.generate(index))
    }
}
