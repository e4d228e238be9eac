pub mod classification;
pub mod constructors;
pub mod types;

pub use constructors::*;
pub use types::{Error, Inner, Kind, Result};

// Type alias for call sites that read better with the longer name
pub type HttpError = Error;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
