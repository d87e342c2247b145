use crate::generator::project::{DRAWING_FILE, MATERIALS_FILE};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use sarmapcore::interface::{DatasetTable, DxfReader, FieldExport, MaterialTable};
use sarmapcore::prelude::PipelineConfig;
use sarmapcore::processing::{
    ContourReconstructor, FieldInterpolator, MaterialRasterizer, MsfEngine, SampleEncoder,
    SarDeriver,
};
use std::path::Path;

const PROGRESS_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOutcome {
    Processed { samples: usize },
    /// The primary field export is missing.
    Skipped,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    pipeline: PipelineConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        let pipeline = config.to_pipeline_config();
        pipeline.validate().context("validating workflow config")?;
        Ok(Self { config, pipeline })
    }

    pub fn process(&self, project: &Path) -> anyhow::Result<ProjectOutcome> {
        if !project.join(&self.config.primary_export).exists() {
            info!("{}: no simulation results present", project.display());
            return Ok(ProjectOutcome::Skipped);
        }
        let with_project = || format!("in project {}", project.display());

        let materials = MaterialTable::load(project.join(MATERIALS_FILE))
            .context("loading materials")
            .with_context(with_project)?;
        let entities = DxfReader::load(project.join(DRAWING_FILE))
            .context("reading drawing")
            .with_context(with_project)?;
        let contours = ContourReconstructor::new(self.pipeline.contour)
            .reconstruct(&entities)
            .context("reconstructing contours")
            .with_context(with_project)?;

        let exports = FieldExport::discover(project, &self.config.export_prefix)
            .with_context(with_project)?;
        let field = FieldInterpolator::new(self.pipeline.image)
            .load(&exports)
            .context("interpolating field exports")
            .with_context(with_project)?;
        info!(
            "{}: {} antennas, {:?} mm per pixel",
            project.display(),
            field.antennas(),
            field.mm_per_px()
        );

        let maps = MaterialRasterizer::new(self.pipeline.image, self.pipeline.maps)
            .rasterize(&contours, &materials, field.mm_per_px())
            .context("rasterizing materials")
            .with_context(with_project)?;
        let map_names = maps.save(project).with_context(with_project)?;
        let deriver = SarDeriver::from_maps(&maps, &self.pipeline.maps.scalars)
            .context("recovering conductivity and density")
            .with_context(with_project)?;

        let excitation = self.pipeline.excitation;
        let rng = match excitation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine = MsfEngine::new(&field, excitation, rng).with_context(with_project)?;
        let mut encoder = SampleEncoder::new(
            project,
            self.pipeline.msf,
            self.pipeline.sar,
            DatasetTable::new(field.antennas(), map_names),
        )
        .with_context(with_project)?;

        info!("generating MSF maps ({})", excitation.samples);
        let mut progress = Progress::new(excitation.samples, PROGRESS_STEP);
        for (done, sample) in engine.enumerate() {
            let msf = sample.with_context(with_project)?;
            let sar = deriver.derive(&msf).with_context(with_project)?;
            encoder.write(&msf, &sar).with_context(with_project)?;
            if let Some(pct) = progress.advance(done + 1) {
                info!("{}%", pct);
            }
        }

        let stats = encoder.finish().with_context(with_project)?;
        info!(
            "{}: msf dB range {:?}..{:?} ({} over range), sar dB range {:?}..{:?} ({} over range)",
            project.display(),
            stats.msf.min,
            stats.msf.max,
            stats.msf.exceeded,
            stats.sar.min,
            stats.sar.max,
            stats.sar.exceeded
        );
        Ok(ProjectOutcome::Processed {
            samples: excitation.samples,
        })
    }
}

/// Reports completion in fixed percentage steps.
struct Progress {
    total: usize,
    step: usize,
    next: usize,
}

impl Progress {
    fn new(total: usize, step: usize) -> Self {
        Self {
            total,
            step: step.max(1),
            next: step.max(1),
        }
    }

    /// Percentage mark reached after `done` items, if a new one was crossed.
    fn advance(&mut self, done: usize) -> Option<usize> {
        let pct = if self.total == 0 {
            100
        } else {
            done * 100 / self.total
        };
        if pct < self.next {
            return None;
        }
        let reached = pct - pct % self.step;
        self.next = reached + self.step;
        Some(reached)
    }
}
