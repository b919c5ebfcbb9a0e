pub mod error;
pub mod types;
pub mod value;

pub use error::{MapperError, Result};
pub use types::{Class, ClassId, Object};
pub use value::{Scalar, Value};
