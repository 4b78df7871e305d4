use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
use std::result;

pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while synchronizing with the store.
#[derive(Debug)]
pub enum Error {
    /// An `io::Error` that occurred while reading or writing message data.
    Io(IoError),
    /// A transport or protocol error raised by the IMAP session.
    Imap(imap::Error),
    /// A fetched message could not be decoded as an RFC822 document.
    Mail(mailparse::MailParseError),
    /// A Kolab XML document could not be parsed.
    Parse(ParseError),
    /// An extension command returned an unusable or non-OK response.
    Protocol(String),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl From<imap::Error> for Error {
    fn from(err: imap::Error) -> Error {
        Error::Imap(err)
    }
}

impl From<mailparse::MailParseError> for Error {
    fn from(err: mailparse::MailParseError) -> Error {
        Error::Mail(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => fmt::Display::fmt(e, f),
            Error::Imap(e) => fmt::Display::fmt(e, f),
            Error::Mail(e) => fmt::Display::fmt(e, f),
            Error::Parse(e) => fmt::Display::fmt(e, f),
            Error::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Imap(e) => Some(e),
            Error::Mail(e) => Some(e),
            Error::Parse(e) => Some(e),
            Error::Protocol(_) => None,
        }
    }
}

/// An error raised while parsing a Kolab XML document.
#[derive(Debug)]
pub enum ParseError {
    /// The document is not well-formed XML.
    Xml(quick_xml::Error),
    /// A date element did not match the `YYYY-MM-DDTHH:MM:SSZ` profile.
    Timestamp(String),
    /// A mandatory element was absent.
    MissingField(&'static str),
    /// An element carried a value outside its allowed domain.
    InvalidValue {
        field: &'static str,
        value: String,
    },
    /// A configuration document whose type/relationType pair does not
    /// describe a tag relation.
    NotARelation,
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> ParseError {
        ParseError::Xml(err)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Xml(e) => write!(f, "malformed document: {}", e),
            ParseError::Timestamp(value) => write!(f, "invalid timestamp: {:?}", value),
            ParseError::MissingField(field) => write!(f, "missing mandatory element: {}", field),
            ParseError::InvalidValue { field, value } => {
                write!(f, "invalid value for {}: {:?}", field, value)
            }
            ParseError::NotARelation => f.write_str("document is not a tag relation"),
        }
    }
}

impl StdError for ParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ParseError::Xml(e) => Some(e),
            _ => None,
        }
    }
}
