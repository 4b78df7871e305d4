//! Reading and writing Kolab v3 XML documents.
//!
//! Notes are stored as `<note>` documents, tags as `<configuration>`
//! documents holding a relation. Parsing is streaming and order-insensitive:
//! whatever element order a producer chose, the last occurrence of a field
//! wins. Serialization always emits the canonical field order, so writing is
//! deterministic and `write(parse(write(x))) == write(x)`.

pub mod escape;
pub mod note;
pub mod relation;
pub mod timestamp;

/// Media type of the XML part inside a Kolab message.
pub const KOLAB_XML_MEDIA_TYPE: &str = "application/vnd.kolab+xml";

/// Filename of the XML part inside a Kolab message.
pub const KOLAB_XML_FILE_NAME: &str = "kolab.xml";

/// `X-Kolab-Type` header value of note messages.
pub const NOTE_KOLAB_TYPE: &str = "application/x-vnd.kolab.note";

/// `X-Kolab-Type` header value of relation (tag) messages.
pub const RELATION_KOLAB_TYPE: &str = "application/x-vnd.kolab.configuration.relation";

/// Version attribute written on every document.
pub const FORMAT_VERSION: &str = "3.0";

/// XML namespace of Kolab documents.
pub const XMLNS: &str = "http://kolab.org";
