pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod shape;
pub mod spec;
pub mod tensor;

pub use artifact::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use optimizer::*;
pub use shape::*;
pub use spec::*;
pub use tensor::*;
