//! The XML document model, streaming parser, and XSD-facet restrictions
//! (C5/C6/C7).

pub mod error;
pub mod model;
pub mod parser;
pub mod printer;
pub mod restriction;

pub use error::{XmlErrorKind, XmlErrorState};
pub use model::{
    Attribute, Cardinality, NodeId, Ordering, WhitespaceMode, XdtKind, XmlDataType, XmlElementData,
    XmlMessage,
};
pub use parser::{parse, parse_with_mode};
pub use printer::{print_bytes, print_string};
pub use restriction::{check_datatype, XmlRestriction, XmlRestrictions};
