//! Data models

pub mod upload;
pub mod threshold;
pub mod status;

pub use upload::*;
pub use threshold::*;
pub use status::*;
