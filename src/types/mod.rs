mod error;
mod request;
mod response;

pub use error::ErrorKind;
pub use request::{Addresses, RequestDescriptor};
pub use response::ResponseResult;

/// The spillway `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
