use crate::interface::manifest::{DatasetTable, Manifest};
use crate::interface::raster_io::{ensure_dir, write_gray};
use crate::math::stats::StatsHelper;
use crate::prelude::{DecibelRange, PipelineResult};
use crate::processing::msf::{MsfSample, MSF_DIR};
use crate::processing::sar::{SarSample, SAR_DIR, SAR_EPSILON};
use crate::telemetry::log::LogManager;
use ndarray::Array2;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "configuration.json";
pub const DATASET_FILE: &str = "dataset.csv";

/// Decibel extremes of one grid before clipping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecibelStats {
    /// Smallest finite value over strictly positive linear inputs.
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Some unclipped value lies above the range maximum.
    pub exceeded: bool,
}

#[derive(Debug, Clone)]
pub struct EncodedGrid {
    pub pixels: Array2<u8>,
    pub stats: DecibelStats,
}

/// Maps linear values to 8-bit pixels through a clipped decibel window.
#[derive(Debug, Clone, Copy)]
pub struct DecibelEncoder {
    range: DecibelRange,
    floor: f64,
}

impl DecibelEncoder {
    pub fn new(range: DecibelRange, floor: f64) -> Self {
        Self { range, floor }
    }

    /// Plain `10 log10(msf)`; zero maps to -inf and clips to the minimum.
    pub fn msf(range: DecibelRange) -> Self {
        Self::new(range, 0.0)
    }

    pub fn sar(range: DecibelRange) -> Self {
        Self::new(range, SAR_EPSILON)
    }

    pub fn range(&self) -> DecibelRange {
        self.range
    }

    pub fn to_db(&self, linear: f64) -> f64 {
        10.0 * (linear + self.floor).log10()
    }

    pub fn encode_value(&self, db: f64) -> u8 {
        let DecibelRange { db_min, db_max } = self.range;
        let clipped = db.max(db_min).min(db_max);
        (255.0 * (clipped - db_min) / (db_max - db_min)) as u8
    }

    pub fn encode(&self, grid: &Array2<f64>) -> EncodedGrid {
        let db = grid.mapv(|v| self.to_db(v));
        let positive = grid
            .iter()
            .zip(db.iter())
            .filter(|(linear, _)| **linear > 0.0)
            .map(|(_, &value)| value);
        let min = StatsHelper::finite_range(positive).map(|(lo, _)| lo);
        let max = StatsHelper::finite_range(db.iter().copied()).map(|(_, hi)| hi);
        EncodedGrid {
            pixels: db.mapv(|v| self.encode_value(v)),
            stats: DecibelStats {
                min,
                max,
                exceeded: max.map_or(false, |hi| hi > self.range.db_max),
            },
        }
    }
}

/// Running decibel extremes across the samples of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeTracker {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exceeded: usize,
}

impl RangeTracker {
    pub fn record(&mut self, stats: &DecibelStats) {
        if let Some(lo) = stats.min {
            self.min = Some(self.min.map_or(lo, |m| m.min(lo)));
        }
        if let Some(hi) = stats.max {
            self.max = Some(self.max.map_or(hi, |m| m.max(hi)));
        }
        if stats.exceeded {
            self.exceeded += 1;
        }
    }
}

/// Observed ranges after writing one sample pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub msf: RangeTracker,
    pub sar: RangeTracker,
}

/// Writes MSF/SAR images of one project and keeps their manifests and the
/// dataset table in step.
pub struct SampleEncoder {
    project_dir: PathBuf,
    msf: DecibelEncoder,
    sar: DecibelEncoder,
    msf_range: RangeTracker,
    sar_range: RangeTracker,
    manifest: Manifest,
    dataset: DatasetTable,
    logger: LogManager,
}

impl SampleEncoder {
    pub fn new<P: AsRef<Path>>(
        project_dir: P,
        msf: DecibelRange,
        sar: DecibelRange,
        dataset: DatasetTable,
    ) -> PipelineResult<Self> {
        let project_dir = project_dir.as_ref().to_path_buf();
        ensure_dir(project_dir.join(MSF_DIR))?;
        ensure_dir(project_dir.join(SAR_DIR))?;
        Ok(Self {
            project_dir,
            msf: DecibelEncoder::msf(msf),
            sar: DecibelEncoder::sar(sar),
            msf_range: RangeTracker::default(),
            sar_range: RangeTracker::default(),
            manifest: Manifest::default(),
            dataset,
            logger: LogManager::new(),
        })
    }

    pub fn write(&mut self, msf: &MsfSample, sar: &SarSample) -> PipelineResult<SampleStats> {
        let encoded_msf = self.msf.encode(&msf.grid);
        let encoded_sar = self.sar.encode(&sar.grid);
        self.check_range("msf", msf.index, &self.msf, &encoded_msf.stats);
        self.check_range("sar", sar.index, &self.sar, &encoded_sar.stats);

        write_gray(self.project_dir.join(&msf.filename), &encoded_msf.pixels)?;
        write_gray(self.project_dir.join(&sar.filename), &encoded_sar.pixels)?;

        let record = msf.record();
        self.dataset.append(&record)?;
        self.manifest.push(record);
        self.msf_range.record(&encoded_msf.stats);
        self.sar_range.record(&encoded_sar.stats);
        Ok(self.stats())
    }

    fn check_range(&self, kind: &str, index: usize, encoder: &DecibelEncoder, stats: &DecibelStats) {
        if let (true, Some(max)) = (stats.exceeded, stats.max) {
            self.logger.warn(&format!(
                "{} sample {} peaks at {:.2} dB, above the {:.2} dB range maximum",
                kind,
                index,
                max,
                encoder.range().db_max
            ));
        }
    }

    pub fn stats(&self) -> SampleStats {
        SampleStats {
            msf: self.msf_range,
            sar: self.sar_range,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Writes both manifests and the dataset table.
    pub fn finish(self) -> PipelineResult<SampleStats> {
        let msf_manifest = self.project_dir.join(MSF_DIR).join(MANIFEST_FILE);
        self.manifest.save(&msf_manifest)?;
        self.manifest
            .with_renamed_files(MSF_DIR, SAR_DIR)
            .save(self.project_dir.join(SAR_DIR).join(MANIFEST_FILE))?;
        self.dataset.save(self.project_dir.join(DATASET_FILE))?;
        self.logger.record(&format!(
            "wrote {} samples to {}",
            self.manifest.len(),
            self.project_dir.display()
        ));
        Ok(self.stats())
    }
}
