mod error;
mod schema;
mod tuple;
mod value;

pub use error::{TupleError, TupleResult};
pub use schema::{TdItem, TupleDesc};
pub use tuple::Tuple;
pub use value::{CmpOp, Field, Type, MAX_STRING_LEN};
