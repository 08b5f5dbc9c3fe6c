//! Query building: identifiers quoted by the dialect, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
