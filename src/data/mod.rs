//! In-memory data model: profiles, surfaces and regions of interest.
pub mod grid;
pub mod profile;
pub mod roi;
pub mod surface;

pub use self::grid::Grid;
pub use self::profile::Profile;
pub use self::roi::Roi;
pub use self::surface::Surface;
