pub mod interp;
pub mod polygon;
pub mod stats;

pub use interp::{linspace, RegularGrid};
pub use polygon::PolygonFill;
pub use stats::StatsHelper;
