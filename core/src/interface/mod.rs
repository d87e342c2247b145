pub mod dxf;
pub mod entity;
pub mod field_export;
pub mod manifest;
pub mod materials;
pub mod raster_io;

pub use dxf::DxfReader;
pub use entity::{DrawingEntity, GeometryMode, Vertex};
pub use field_export::FieldExport;
pub use manifest::{ConfigurationRecord, DatasetTable, MapFilenames, Manifest};
pub use materials::{Material, MaterialTable};
