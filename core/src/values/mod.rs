pub mod function;
pub mod number;
mod value;

pub use function::{Argument, Callable};
pub use number::{format_number, parse_number};
pub use value::{Object, Value};
