/// A binary attachment of a note.
///
/// The id doubles as the MIME `Content-ID` of the message part that carries
/// the payload; two attachments are the same attachment iff their ids match.
#[derive(Debug, Clone)]
pub struct Attachment {
    id: String,
    file_name: String,
    mime_type: String,
    data: Vec<u8>,
}

impl Attachment {
    /// A new attachment without payload data.
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Attachment {
            id: id.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

impl PartialEq for Attachment {
    fn eq(&self, other: &Attachment) -> bool {
        self.id == other.id
    }
}

impl Eq for Attachment {}
