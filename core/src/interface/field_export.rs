use crate::prelude::{PipelineError, PipelineResult};
use num_complex::Complex64;
use std::path::{Path, PathBuf};

pub const X_COLUMN: &str = "#x [mm]";
pub const Z_COLUMN: &str = "z [mm]";
/// `[component][real, imaginary]` column names of the exported field.
pub const FIELD_COLUMNS: [[&str; 2]; 3] = [
    ["ExRe [V/m]", "ExIm [V/m]"],
    ["EyRe [V/m]", "EyIm [V/m]"],
    ["EzRe [V/m]", "EzIm [V/m]"],
];
pub const DELIMITER: char = ';';

/// Complex field samples of one antenna on its native grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExport {
    pub x: Vec<f64>,
    pub z: Vec<f64>,
    /// `[Ex, Ey, Ez]` per sample.
    pub field: Vec<[Complex64; 3]>,
}

impl FieldExport {
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| PipelineError::io(path, source))?;
        Self::parse(&content)
            .map_err(|err| PipelineError::Field(format!("{}: {}", path.display(), err)))
    }

    pub fn parse(content: &str) -> PipelineResult<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());
        let (_, header) = lines
            .next()
            .ok_or_else(|| PipelineError::Field("empty export".into()))?;
        let names: Vec<&str> = header.split(DELIMITER).map(str::trim).collect();
        let column = |name: &str| {
            names
                .iter()
                .position(|n| *n == name)
                .ok_or_else(|| PipelineError::Field(format!("missing column `{}`", name)))
        };

        let x_col = column(X_COLUMN)?;
        let z_col = column(Z_COLUMN)?;
        let mut field_cols = [[0usize; 2]; 3];
        for (dim, labels) in FIELD_COLUMNS.iter().enumerate() {
            for (part, label) in labels.iter().enumerate() {
                field_cols[dim][part] = column(*label)?;
            }
        }

        let mut export = FieldExport {
            x: Vec::new(),
            z: Vec::new(),
            field: Vec::new(),
        };
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
            let value = |col: usize| -> PipelineResult<f64> {
                let cell = cells.get(col).ok_or_else(|| {
                    PipelineError::Field(format!("line {}: too few columns", line_no + 1))
                })?;
                cell.parse::<f64>().map_err(|_| {
                    PipelineError::Field(format!(
                        "line {}: `{}` is not a number",
                        line_no + 1,
                        cell
                    ))
                })
            };
            export.x.push(value(x_col)?);
            export.z.push(value(z_col)?);
            let mut sample = [Complex64::new(0.0, 0.0); 3];
            for (dim, cols) in field_cols.iter().enumerate() {
                sample[dim] = Complex64::new(value(cols[0])?, value(cols[1])?);
            }
            export.field.push(sample);
        }

        if export.field.is_empty() {
            return Err(PipelineError::Field("export has no samples".into()));
        }
        Ok(export)
    }

    pub fn len(&self) -> usize {
        self.field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    /// Field exports of a project directory, sorted by file name. The order
    /// defines the antenna indices.
    pub fn discover<P: AsRef<Path>>(dir: P, prefix: &str) -> PipelineResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| PipelineError::io(dir, source))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| PipelineError::io(dir, source))?.path();
            let matches = path.is_file()
                && path.extension().map(|e| e == "csv").unwrap_or(false)
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(prefix))
                    .unwrap_or(false);
            if matches {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}
