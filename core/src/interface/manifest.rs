use crate::prelude::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

/// Traceability entry of one generated sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub index: usize,
    pub filename: String,
    pub phases: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

/// Append-only list of configuration records, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub records: Vec<ConfigurationRecord>,
}

impl Manifest {
    pub fn push(&mut self, record: ConfigurationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Same records with `from` replaced by `to` in every filename.
    pub fn with_renamed_files(&self, from: &str, to: &str) -> Manifest {
        Manifest {
            records: self
                .records
                .iter()
                .map(|record| ConfigurationRecord {
                    filename: record.filename.replace(from, to),
                    ..record.clone()
                })
                .collect(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json).map_err(|source| PipelineError::io(path, source))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| PipelineError::io(path, source))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Filenames of the rasterized material maps of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFilenames {
    pub model: String,
    pub permittivity: String,
    pub conductivity: String,
    pub density: String,
}

/// Combined `;`-delimited table joining material maps, normalized excitation
/// inputs and output images per sample.
#[derive(Debug, Clone)]
pub struct DatasetTable {
    antennas: usize,
    maps: MapFilenames,
    csv: String,
}

impl DatasetTable {
    pub fn new(antennas: usize, maps: MapFilenames) -> Self {
        let mut csv = String::from("idx;input_permittivity;input_conductivity;input_density;");
        for idx in 0..antennas {
            csv.push_str(&format!("input_phase_{:02};input_amplitude_{:02};", idx, idx));
        }
        csv.push_str("output_img\n");
        Self {
            antennas,
            maps,
            csv,
        }
    }

    pub fn append(&mut self, record: &ConfigurationRecord) -> PipelineResult<()> {
        if record.phases.len() != self.antennas || record.amplitudes.len() != self.antennas {
            return Err(PipelineError::InvalidInput(format!(
                "record {} has {} phases for {} antennas",
                record.index,
                record.phases.len(),
                self.antennas
            )));
        }
        self.csv.push_str(&format!(
            "{:07};{};{};{};",
            record.index, self.maps.permittivity, self.maps.conductivity, self.maps.density
        ));
        for (phase, amplitude) in record.phases.iter().zip(&record.amplitudes) {
            self.csv.push_str(&format!("{:.16};{:.16};", phase / (2.0 * PI), amplitude));
        }
        self.csv.push_str(&format!("{}\n", record.filename));
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.csv
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.csv).map_err(|source| PipelineError::io(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize) -> ConfigurationRecord {
        ConfigurationRecord {
            index,
            filename: format!("msf/msf_{:04}.png", index),
            phases: vec![0.0, PI],
            amplitudes: vec![1.0, 0.25],
        }
    }

    fn maps() -> MapFilenames {
        MapFilenames {
            model: "maps/model.png".into(),
            permittivity: "maps/permittivity.png".into(),
            conductivity: "maps/conductivity.png".into(),
            density: "maps/density.png".into(),
        }
    }

    #[test]
    fn renamed_manifest_keeps_excitations_in_order() {
        let mut manifest = Manifest::default();
        manifest.push(record(0));
        manifest.push(record(1));
        let sar = manifest.with_renamed_files("msf", "sar");
        assert_eq!(sar.records[1].filename, "sar/sar_0001.png");
        assert_eq!(sar.records[1].phases, manifest.records[1].phases);
        assert_eq!(manifest.records[1].filename, "msf/msf_0001.png");
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configuration.json");
        let mut manifest = Manifest::default();
        manifest.push(record(3));
        manifest.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with('['));
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn dataset_rows_normalize_phases() {
        let mut table = DatasetTable::new(2, maps());
        table.append(&record(7)).unwrap();
        let lines: Vec<&str> = table.as_str().lines().collect();
        assert_eq!(
            lines[0],
            "idx;input_permittivity;input_conductivity;input_density;\
             input_phase_00;input_amplitude_00;input_phase_01;input_amplitude_01;output_img"
        );
        assert!(lines[1].starts_with("0000007;maps/permittivity.png;"));
        assert!(lines[1].contains(";0.5000000000000000;0.2500000000000000;"));
        assert!(lines[1].ends_with(";msf/msf_0007.png"));
    }

    #[test]
    fn dataset_rejects_wrong_antenna_count() {
        let mut table = DatasetTable::new(3, maps());
        assert!(table.append(&record(0)).is_err());
    }
}
