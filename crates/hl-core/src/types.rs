//! Action payload and order request types.

pub mod order;
pub mod value;

pub use order::*;
pub use value::{FieldMap, Value};
