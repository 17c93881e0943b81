//! SQL builder: identifiers are constants, request values go in as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
