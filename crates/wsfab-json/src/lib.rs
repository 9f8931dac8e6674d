//! JSON value model, recursive-descent parser/printer, and the JSON
//! message envelope (C8).

pub mod error;
pub mod message;
pub mod parser;
pub mod printer;
pub mod value;

pub use error::JsonError;
pub use message::JsonMessage;
pub use parser::{parse_bytes, parse_str};
pub use printer::print_string;
pub use value::{Json, JsonPair};
