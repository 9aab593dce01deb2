//! API response types and pagination utilities

pub mod pagination;
pub mod response;

pub use pagination::{PageRequest, Paginated};
pub use response::{Created, DataResponse, NoContent};
