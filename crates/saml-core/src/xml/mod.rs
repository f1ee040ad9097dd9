//! XML I/O primitives: streaming pull reader, owned document model and
//! Exclusive C14N serialization.

pub mod c14n;
pub mod dom;
pub mod reader;

pub use c14n::canonicalize;
pub use dom::{Document, Element, Node, QName};
pub use reader::{StartTag, XmlReader};
