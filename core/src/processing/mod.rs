pub mod contour;
pub mod encoder;
pub mod field;
pub mod msf;
pub mod raster;
pub mod sar;

pub use contour::{Contour, ContourReconstructor, LineFragment};
pub use encoder::{DecibelEncoder, RangeTracker, SampleEncoder, SampleStats};
pub use field::{ComplexFieldPerAntenna, FieldInterpolator};
pub use msf::{Excitation, MsfEngine, MsfSample};
pub use raster::{MaterialMaps, MaterialRasterizer};
pub use sar::{SarDeriver, SarSample};
