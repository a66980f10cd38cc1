//! JSON run configurations for the command-line tools.
pub mod morph;

pub use self::morph::load_config;
