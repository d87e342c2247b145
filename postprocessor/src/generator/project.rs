use crate::generator::template::{arc_polyline, document, spline_polyline};
use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sarmapcore::interface::field_export::{FIELD_COLUMNS, X_COLUMN, Z_COLUMN};
use sarmapcore::interface::Material;
use sarmapcore::math::linspace;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use std::path::Path;

pub const MATERIALS_FILE: &str = "materials.json";
pub const DRAWING_FILE: &str = "model2d.dxf";

/// Configuration for generating a synthetic simulated project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticProjectConfig {
    /// Antennas on a ring around the phantom, at most nine.
    pub antennas: usize,
    /// Native samples per axis of each field export.
    pub grid_points: usize,
    /// Half-width of the exported square domain in mm.
    pub extent: f64,
    pub wavelength: f64,
    pub body_radius: f64,
    pub implant_half_side: f64,
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticProjectConfig {
    fn default() -> Self {
        Self {
            antennas: 4,
            grid_points: 41,
            extent: 20.0,
            wavelength: 30.0,
            body_radius: 12.0,
            implant_half_side: 4.0,
            noise: 0.01,
            seed: 0,
        }
    }
}

/// Export name of antenna `antenna`, counted from 0.
pub fn export_name(antenna: usize) -> String {
    format!("e-field 1{}.csv", antenna + 1)
}

/// Writes `materials.json`, `model2d.dxf` and one field export per antenna
/// into `dir`.
pub fn generate_project(dir: &Path, config: &SyntheticProjectConfig) -> anyhow::Result<()> {
    ensure!(
        (1..=9).contains(&config.antennas),
        "synthetic projects support 1 to 9 antennas, got {}",
        config.antennas
    );
    ensure!(config.grid_points >= 2, "need at least two grid points per axis");
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let materials = serde_json::to_string_pretty(&materials())?;
    fs::write(dir.join(MATERIALS_FILE), materials)
        .with_context(|| format!("writing materials to {}", dir.display()))?;
    fs::write(dir.join(DRAWING_FILE), drawing(config))
        .with_context(|| format!("writing drawing to {}", dir.display()))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    for antenna in 0..config.antennas {
        let path = dir.join(export_name(antenna));
        fs::write(&path, field_export(config, antenna, &mut rng))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn materials() -> Vec<Material> {
    vec![
        Material {
            object_name: "Body".into(),
            red: 0.9,
            green: 0.6,
            blue: 0.5,
            permittivity: 52.0,
            conductivity: 0.9,
            density: 1050.0,
        },
        Material {
            object_name: "Implant".into(),
            red: 0.3,
            green: 0.3,
            blue: 0.3,
            permittivity: 12.0,
            conductivity: 0.05,
            density: 1900.0,
        },
    ]
}

/// A circular body drawn as two half-turn arcs and a square implant drawn as
/// four loose, partly reversed segments.
fn drawing(config: &SyntheticProjectConfig) -> String {
    let r = config.body_radius;
    let h = config.implant_half_side;
    document(&[
        arc_polyline("BODY", &[[0.0, r, 1.0], [0.0, -r, 1.0]], true),
        spline_polyline("IMPLANT", &[[h, h], [-h, h]]),
        spline_polyline("IMPLANT", &[[-h, -h], [h, -h]]),
        spline_polyline("IMPLANT", &[[-h, -h], [-h, h]]),
        spline_polyline("IMPLANT", &[[h, -h], [h, h]]),
    ])
}

/// Cylindrical wave from an antenna on a ring outside the domain.
fn field_export(config: &SyntheticProjectConfig, antenna: usize, rng: &mut StdRng) -> String {
    let angle = 2.0 * PI * antenna as f64 / config.antennas as f64;
    let ring = 1.5 * config.extent;
    let source = [ring * angle.cos(), ring * angle.sin()];
    let k = 2.0 * PI / config.wavelength;

    let mut csv = format!("{};y [mm];{}", X_COLUMN, Z_COLUMN);
    for [re, im] in FIELD_COLUMNS {
        csv.push_str(&format!(";{};{}", re, im));
    }
    csv.push('\n');

    let axis = linspace(-config.extent, config.extent, config.grid_points);
    for &x in &axis {
        for &z in &axis {
            let r = ((x - source[0]).powi(2) + (z - source[1]).powi(2)).sqrt();
            let magnitude = 10.0 / (1.0 + r).sqrt();
            let (sin, cos) = (-k * r).sin_cos();
            let mut jitter = || {
                if config.noise > 0.0 {
                    rng.gen_range(-config.noise..config.noise)
                } else {
                    0.0
                }
            };
            let ez = [magnitude * cos + jitter(), magnitude * sin + jitter()];
            let ex = [0.2 * ez[0], 0.2 * ez[1]];
            csv.push_str(&format!(
                "{};0;{};{:e};{:e};0;0;{:e};{:e}\n",
                x, z, ex[0], ex[1], ez[0], ez[1]
            ));
        }
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarmapcore::interface::{DxfReader, FieldExport, MaterialTable};

    fn small() -> SyntheticProjectConfig {
        SyntheticProjectConfig {
            antennas: 2,
            grid_points: 5,
            ..Default::default()
        }
    }

    #[test]
    fn generated_project_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        generate_project(dir.path(), &small()).unwrap();

        let materials = MaterialTable::load(dir.path().join(MATERIALS_FILE)).unwrap();
        assert!(materials.resolve("IMPLANT").is_ok());
        let entities = DxfReader::load(dir.path().join(DRAWING_FILE)).unwrap();
        assert_eq!(entities.len(), 5);

        let paths = FieldExport::discover(dir.path(), "e-field").unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("e-field 11.csv"));
        let export = FieldExport::load(&paths[1]).unwrap();
        assert_eq!(export.len(), 25);
    }

    #[test]
    fn generation_is_seeded() {
        let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        generate_project(a.path(), &small()).unwrap();
        generate_project(b.path(), &small()).unwrap();
        let read = |dir: &Path| fs::read_to_string(dir.join(export_name(1))).unwrap();
        assert_eq!(read(a.path()), read(b.path()));
    }

    #[test]
    fn antenna_count_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyntheticProjectConfig {
            antennas: 10,
            ..Default::default()
        };
        assert!(generate_project(dir.path(), &config).is_err());
    }
}
