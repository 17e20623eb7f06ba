pub mod auxiliary;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod model;
pub mod orchestrator;
pub mod registry;

pub use auxiliary::*;
pub use error::*;
pub use layout::*;
pub use manifest::*;
pub use model::*;
pub use orchestrator::*;
pub use registry::*;
