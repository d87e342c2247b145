use crate::prelude::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Named object of the drawing together with its electromagnetic properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub object_name: String,
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub permittivity: f64,
    pub conductivity: f64,
    pub density: f64,
}

impl Material {
    /// Display color on the 0-255 scale.
    pub fn color(&self) -> [f64; 3] {
        [255.0 * self.red, 255.0 * self.green, 255.0 * self.blue]
    }
}

/// Materials of one project, looked up by case-insensitive object name.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    materials: Vec<Material>,
    by_name: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl MaterialTable {
    pub fn new(materials: Vec<Material>) -> PipelineResult<Self> {
        let mut by_name = HashMap::new();
        let mut duplicates = Vec::new();
        for (idx, material) in materials.iter().enumerate() {
            for value in [
                material.red,
                material.green,
                material.blue,
                material.permittivity,
                material.conductivity,
                material.density,
            ] {
                if !(value >= 0.0) {
                    return Err(PipelineError::Material(format!(
                        "`{}` has a negative or undefined property",
                        material.object_name
                    )));
                }
            }
            let key = material.object_name.to_uppercase();
            if by_name.insert(key.clone(), idx).is_some() {
                duplicates.push(key);
            }
        }
        Ok(Self {
            materials,
            by_name,
            duplicates,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| PipelineError::io(path, source))?;
        let materials: Vec<Material> = serde_json::from_str(&contents)?;
        Self::new(materials)
    }

    /// Resolves a drawing layer to exactly one material.
    pub fn resolve(&self, layer: &str) -> PipelineResult<&Material> {
        let key = layer.to_uppercase();
        if self.duplicates.contains(&key) {
            return Err(PipelineError::Material(format!(
                "layer `{}` matches more than one material",
                layer
            )));
        }
        self.by_name
            .get(&key)
            .map(|&idx| &self.materials[idx])
            .ok_or_else(|| PipelineError::Material(format!("no material for layer `{}`", layer)))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
