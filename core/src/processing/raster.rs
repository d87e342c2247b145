use crate::interface::manifest::MapFilenames;
use crate::interface::materials::MaterialTable;
use crate::interface::raster_io::{ensure_dir, write_gray, write_rgb};
use crate::math::polygon::PolygonFill;
use crate::prelude::{ImageConfig, MapConfig, PipelineError, PipelineResult};
use crate::processing::contour::{Contour, LineFragment};
use crate::telemetry::log::LogManager;
use ndarray::{Array2, Array3};
use std::collections::HashSet;
use std::path::Path;

pub const MAPS_DIR: &str = "maps";

/// Property grid on the 0-255 map scale, `[row, column]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGrid {
    values: Array2<f64>,
}

impl MaterialGrid {
    fn filled(height: usize, width: usize, value: f64) -> Self {
        Self {
            values: Array2::from_elem((height, width), value),
        }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Quantized 8-bit map, saturating outside 0-255.
    pub fn to_pixels(&self) -> Array2<u8> {
        self.values.mapv(quantize)
    }

    /// Physical property values, undoing the `255 * scalar` map scaling.
    pub fn physical(&self, scalar: f64) -> Array2<f64> {
        self.values.mapv(|v| v / (255.0 * scalar))
    }
}

fn quantize(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// The four rasterized maps of a project.
#[derive(Debug, Clone)]
pub struct MaterialMaps {
    /// Display colors, `[row, column, rgb]`.
    pub model: Array3<f64>,
    pub permittivity: MaterialGrid,
    pub conductivity: MaterialGrid,
    pub density: MaterialGrid,
}

impl MaterialMaps {
    /// Writes the maps as PNG files below `<project_dir>/maps` and returns
    /// their project-relative names.
    pub fn save<P: AsRef<Path>>(&self, project_dir: P) -> PipelineResult<MapFilenames> {
        let project_dir = project_dir.as_ref();
        ensure_dir(project_dir.join(MAPS_DIR))?;
        let filenames = MapFilenames {
            model: format!("{}/model.png", MAPS_DIR),
            permittivity: format!("{}/permittivity.png", MAPS_DIR),
            conductivity: format!("{}/conductivity.png", MAPS_DIR),
            density: format!("{}/density.png", MAPS_DIR),
        };
        write_rgb(project_dir.join(&filenames.model), &self.model.mapv(quantize))?;
        write_gray(
            project_dir.join(&filenames.permittivity),
            &self.permittivity.to_pixels(),
        )?;
        write_gray(
            project_dir.join(&filenames.conductivity),
            &self.conductivity.to_pixels(),
        )?;
        write_gray(project_dir.join(&filenames.density), &self.density.to_pixels())?;
        Ok(filenames)
    }
}

/// Fills reconstructed contours into per-property grids.
pub struct MaterialRasterizer {
    image: ImageConfig,
    maps: MapConfig,
    logger: LogManager,
}

impl MaterialRasterizer {
    pub fn new(image: ImageConfig, maps: MapConfig) -> Self {
        Self {
            image,
            maps,
            logger: LogManager::new(),
        }
    }

    /// Pixel polygon of a fragment: scaled by `mm_per_px`, origin moved to the
    /// image center, truncated to integers, repeated points removed.
    pub fn to_pixels(&self, fragment: &LineFragment, mm_per_px: [f64; 2]) -> Vec<[i32; 2]> {
        let center = [self.image.width as f64 / 2.0, self.image.height as f64 / 2.0];
        let mut seen = HashSet::new();
        fragment
            .points()
            .iter()
            .map(|p| {
                [
                    (p[0] / mm_per_px[0] + center[0]) as i32,
                    (p[1] / mm_per_px[1] + center[1]) as i32,
                ]
            })
            .filter(|pixel| seen.insert(*pixel))
            .collect()
    }

    /// Draws every contour with its layer's material. Later layers overwrite
    /// earlier ones where they overlap.
    pub fn rasterize(
        &self,
        contours: &[Contour],
        materials: &MaterialTable,
        mm_per_px: [f64; 2],
    ) -> PipelineResult<MaterialMaps> {
        if mm_per_px.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(PipelineError::InvalidInput(format!(
                "pixel spacing {:?} must be positive",
                mm_per_px
            )));
        }
        let (width, height) = (self.image.width, self.image.height);
        let background = self.maps.background;
        let scalars = self.maps.scalars;

        let mut model = Array3::zeros((height, width, 3));
        for (channel, &value) in self.maps.background_color.iter().enumerate() {
            model
                .index_axis_mut(ndarray::Axis(2), channel)
                .fill(value as f64);
        }
        let mut maps = MaterialMaps {
            model,
            permittivity: MaterialGrid::filled(height, width, background.permittivity),
            conductivity: MaterialGrid::filled(height, width, background.conductivity),
            density: MaterialGrid::filled(height, width, background.density),
        };

        for contour in contours {
            let material = materials.resolve(&contour.layer)?;
            let color = material.color();
            let permittivity = 255.0 * material.permittivity * scalars.permittivity;
            let conductivity = 255.0 * material.conductivity * scalars.conductivity;
            let density = 255.0 * material.density * scalars.density;

            let mut covered = 0usize;
            for fragment in &contour.fragments {
                let polygon = self.to_pixels(fragment, mm_per_px);
                for (row, col) in PolygonFill::pixels(&polygon, width, height) {
                    for (channel, &value) in color.iter().enumerate() {
                        maps.model[[row, col, channel]] = value;
                    }
                    maps.permittivity.values[[row, col]] = permittivity;
                    maps.conductivity.values[[row, col]] = conductivity;
                    maps.density.values[[row, col]] = density;
                    covered += 1;
                }
            }
            self.logger.trace(&format!(
                "layer {} -> material {} ({} pixels)",
                contour.layer, material.object_name, covered
            ));
        }
        Ok(maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::materials::Material;
    use crate::prelude::PropertyValues;

    fn material(name: &str, permittivity: f64) -> Material {
        Material {
            object_name: name.into(),
            red: 1.0,
            green: 0.0,
            blue: 0.5,
            permittivity,
            conductivity: 0.5,
            density: 1080.0,
        }
    }

    fn square(layer: &str, half_side: f64) -> Contour {
        let h = half_side;
        let points = vec![[-h, -h], [h, -h], [h, h], [-h, h], [-h, -h]];
        Contour {
            layer: layer.into(),
            fragments: vec![LineFragment::new(points).unwrap()],
        }
    }

    fn rasterizer() -> MaterialRasterizer {
        MaterialRasterizer::new(ImageConfig::default(), MapConfig::default())
    }

    #[test]
    fn pixels_are_centered_and_deduplicated() {
        let fragment =
            LineFragment::new(vec![[0.0, 0.0], [0.1, 0.1], [1.0, -1.0], [0.0, 0.0]]).unwrap();
        let pixels = rasterizer().to_pixels(&fragment, [0.5, 0.5]);
        assert_eq!(pixels, vec![[32, 32], [34, 30]]);
    }

    #[test]
    fn square_contour_scales_permittivity() {
        let materials = MaterialTable::new(vec![material("tissue", 80.0)]).unwrap();
        let maps = rasterizer()
            .rasterize(&[square("TISSUE", 5.0)], &materials, [0.5, 0.5])
            .unwrap();
        let permittivity = maps.permittivity.to_pixels();
        // the square spans pixels 22..=42 on both axes
        for row in 23..42 {
            for col in 23..42 {
                assert_eq!(permittivity[[row, col]], 255);
            }
        }
        for &(row, col) in &[(0, 0), (20, 32), (32, 44), (63, 63), (44, 44)] {
            assert_eq!(permittivity[[row, col]], 80);
        }
        assert_eq!(maps.model[[32, 32, 0]], 255.0);
        assert_eq!(maps.model[[0, 0, 2]], 250.0);
    }

    #[test]
    fn physical_values_are_recovered() {
        let materials = MaterialTable::new(vec![material("tissue", 80.0)]).unwrap();
        let config = MapConfig::default();
        let maps = rasterizer()
            .rasterize(&[square("tissue", 5.0)], &materials, [0.5, 0.5])
            .unwrap();
        let conductivity = maps.conductivity.physical(config.scalars.conductivity);
        let density = maps.density.physical(config.scalars.density);
        assert!((conductivity[[32, 32]] - 0.5).abs() < 1e-12);
        assert!((density[[32, 32]] - 1080.0).abs() < 1e-9);
        assert_eq!(density[[0, 0]], 0.0);
    }

    #[test]
    fn later_layers_win_on_overlap() {
        let materials =
            MaterialTable::new(vec![material("outer", 40.0), material("inner", 20.0)]).unwrap();
        let contours = [square("outer", 10.0), square("inner", 4.0)];
        let maps = rasterizer()
            .rasterize(&contours, &materials, [0.5, 0.5])
            .unwrap();
        let values = maps.permittivity.values();
        assert!((values[[32, 32]] - 63.75).abs() < 1e-9);
        assert!((values[[32, 15]] - 127.5).abs() < 1e-9);
    }

    #[test]
    fn custom_backgrounds_are_used_outside_contours() {
        let maps_config = MapConfig {
            background_color: [0, 0, 0],
            background: PropertyValues {
                permittivity: 1.0,
                conductivity: 2.0,
                density: 3.0,
            },
            ..Default::default()
        };
        let rasterizer = MaterialRasterizer::new(
            ImageConfig {
                width: 16,
                height: 8,
            },
            maps_config,
        );
        let maps = rasterizer
            .rasterize(&[], &MaterialTable::default(), [1.0, 1.0])
            .unwrap();
        assert_eq!(maps.permittivity.values().dim(), (8, 16));
        assert!(maps.density.values().iter().all(|&v| v == 3.0));
        assert!(maps.conductivity.to_pixels().iter().all(|&v| v == 2));
    }

    #[test]
    fn missing_material_is_fatal() {
        let materials = MaterialTable::new(vec![material("tissue", 80.0)]).unwrap();
        let err = rasterizer()
            .rasterize(&[square("bone", 5.0)], &materials, [0.5, 0.5])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Material(_)));
    }

    #[test]
    fn save_writes_four_maps() {
        let dir = tempfile::tempdir().unwrap();
        let materials = MaterialTable::new(vec![material("tissue", 80.0)]).unwrap();
        let maps = rasterizer()
            .rasterize(&[square("tissue", 5.0)], &materials, [0.5, 0.5])
            .unwrap();
        let names = maps.save(dir.path()).unwrap();
        assert_eq!(names.density, "maps/density.png");
        for name in [&names.model, &names.permittivity, &names.conductivity, &names.density] {
            assert!(dir.path().join(name).is_file());
        }
    }
}
