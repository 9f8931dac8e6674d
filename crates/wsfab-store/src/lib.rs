//! `MessageStore` (C13): a versioned, framed binary file format for a
//! captured incoming/response `HttpMessage` pair, with seek-to-response.
//! Wire layout grounded in `examples/original_source/BaseLibrary/
//! StoreMessage.{h,cpp}`.

pub mod error;
pub mod field;
pub mod store;

pub use error::StoreError;
pub use field::{FieldTag, END_MARKER, HTTP_FILE_VERSION, STORE_HTTP_RESPONSE_OFFSET};
pub use store::MessageStore;
