//! Post-processing core that turns EM simulation exports into image datasets.
//!
//! A project's drawing is reconstructed into closed material contours and
//! rasterized into property maps, while the per-antenna field exports are
//! resampled onto the same grid and combined under random excitations into
//! MSF and SAR images.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use prelude::{PipelineConfig, PipelineError, PipelineResult};
