pub mod composer;
pub mod error;
pub mod source;
pub mod task;

pub use composer::*;
pub use error::*;
pub use source::*;
pub use task::*;
