use anyhow::Context;
use sarmapcore::prelude::{
    ContourConfig, DecibelRange, ExcitationConfig, ImageConfig, MapConfig, PipelineConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Directory holding the `project*` folders.
    pub root: PathBuf,
    /// Export whose presence marks a project as simulated.
    pub primary_export: String,
    pub export_prefix: String,
    pub image: ImageConfig,
    pub contour: ContourConfig,
    pub maps: MapConfig,
    pub excitation: ExcitationConfig,
    #[serde(deserialize_with = "DecibelRange::deserialize_msf")]
    pub msf: DecibelRange,
    #[serde(deserialize_with = "DecibelRange::deserialize_sar")]
    pub sar: DecibelRange,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            root: PathBuf::from("generated_projects"),
            primary_export: "e-field 11.csv".into(),
            export_prefix: "e-field".into(),
            image: pipeline.image,
            contour: pipeline.contour,
            maps: pipeline.maps,
            excitation: pipeline.excitation,
            msf: pipeline.msf,
            sar: pipeline.sar,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(root: PathBuf, samples: Option<usize>, seed: Option<u64>) -> Self {
        let mut config = Self {
            root,
            ..Default::default()
        };
        config.apply_overrides(None, samples, seed);
        config
    }

    /// Command-line values take precedence over the YAML file.
    pub fn apply_overrides(&mut self, root: Option<PathBuf>, samples: Option<usize>, seed: Option<u64>) {
        if let Some(root) = root {
            self.root = root;
        }
        if let Some(samples) = samples {
            self.excitation.samples = samples;
        }
        if seed.is_some() {
            self.excitation.seed = seed;
        }
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            image: self.image,
            contour: self.contour,
            maps: self.maps,
            excitation: self.excitation,
            msf: self.msf,
            sar: self.sar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_pipeline_config() {
        let cfg = WorkflowConfig::from_args(PathBuf::from("/data"), Some(12), Some(5));
        let pipeline = cfg.to_pipeline_config();
        assert_eq!(pipeline.excitation.samples, 12);
        assert_eq!(pipeline.excitation.seed, Some(5));
        assert_eq!(pipeline.msf, DecibelRange::MSF_DEFAULT);
        assert_eq!(cfg.primary_export, "e-field 11.csv");
    }

    #[test]
    fn config_load_reads_yaml_with_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"root: /data/projects\nimage:\n  width: 32\nexcitation:\n  samples: 10\nsar:\n  db_min: -30.0\n  db_max: 30.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.root, PathBuf::from("/data/projects"));
        assert_eq!(cfg.image.width, 32);
        assert_eq!(cfg.image.height, 64);
        assert_eq!(cfg.excitation.samples, 10);
        assert_eq!(cfg.sar.db_max, 30.0);
        assert_eq!(cfg.msf, DecibelRange::MSF_DEFAULT);
        assert_eq!(cfg.contour.arc_points, 1000);
    }

    #[test]
    fn overrides_replace_yaml_values() {
        let mut cfg = WorkflowConfig::default();
        cfg.excitation.seed = Some(1);
        cfg.apply_overrides(Some(PathBuf::from("elsewhere")), None, None);
        assert_eq!(cfg.root, PathBuf::from("elsewhere"));
        assert_eq!(cfg.excitation.seed, Some(1));
        assert_eq!(cfg.excitation.samples, 3200);
    }

    #[test]
    fn partial_decibel_range_in_yaml_is_completed() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"msf:\n  db_max: 70\n").unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.msf.db_min, -20.0);
        assert_eq!(cfg.msf.db_max, 70.0);
        assert_eq!(cfg.sar, DecibelRange::SAR_DEFAULT);
    }
}
