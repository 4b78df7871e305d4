//! The `<note>` document format.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{escape, timestamp, FORMAT_VERSION, XMLNS};
use crate::error::ParseError;
use crate::types::{
    Attachment, AuditInformation, Classification, Color, Identification, Note, Tag,
};

/// Parse a note document.
///
/// Element order does not matter; when an element repeats, the last
/// occurrence wins. Unknown elements are ignored.
pub fn parse(xml: &str) -> Result<Note, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = NoteFields::default();
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                text.clear();
                if e.name().as_ref() == b"attachment" {
                    fields.attachment = Some(AttachmentFields::default());
                }
            }
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                fields.set(&name, &text)?;
                text.clear();
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                fields.set(&name, "")?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    fields.build()
}

#[derive(Default)]
struct AttachmentFields {
    mime_type: Option<String>,
    label: Option<String>,
    id: Option<String>,
}

#[derive(Default)]
struct NoteFields {
    uid: Option<String>,
    product_id: Option<String>,
    creation_date: Option<chrono::DateTime<chrono::Utc>>,
    last_modification_date: Option<chrono::DateTime<chrono::Utc>>,
    classification: Option<Classification>,
    summary: Option<String>,
    description: Option<String>,
    color: Option<Color>,
    categories: Vec<Tag>,
    attachments: Vec<Attachment>,
    attachment: Option<AttachmentFields>,
}

impl NoteFields {
    fn set(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        if let Some(attachment) = self.attachment.as_mut() {
            match name {
                "fmttype" => attachment.mime_type = Some(value.to_string()),
                "x-label" => attachment.label = Some(value.to_string()),
                "uri" => {
                    let id = value.strip_prefix("cid:").unwrap_or(value);
                    attachment.id = Some(id.to_string());
                }
                "attachment" => {
                    let fields = match self.attachment.take() {
                        Some(f) => f,
                        None => return Ok(()),
                    };
                    let id = fields.id.ok_or(ParseError::MissingField("uri"))?;
                    self.attachments.push(Attachment::new(
                        id,
                        fields.label.unwrap_or_default(),
                        fields.mime_type.unwrap_or_default(),
                    ));
                }
                _ => {}
            }
            return Ok(());
        }
        match name {
            "uid" => self.uid = Some(value.to_string()),
            "prodid" => self.product_id = Some(value.to_string()),
            "creation-date" => self.creation_date = Some(timestamp::parse(value)?),
            "last-modification-date" => {
                self.last_modification_date = Some(timestamp::parse(value)?)
            }
            "classification" => {
                self.classification = Some(Classification::parse(value).ok_or_else(|| {
                    ParseError::InvalidValue {
                        field: "classification",
                        value: value.to_string(),
                    }
                })?)
            }
            "summary" => self.summary = Some(value.to_string()),
            "description" => {
                self.description = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "color" => self.color = Color::from_hex(value),
            "categories" => {
                // some producers prefix the list like an iCalendar property
                let value = value.strip_prefix("CATEGORIES:").unwrap_or(value);
                self.categories = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(Tag::new)
                    .collect();
            }
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> Result<Note, ParseError> {
        let uid = self.uid.ok_or(ParseError::MissingField("uid"))?;
        let product_id = self.product_id.ok_or(ParseError::MissingField("prodid"))?;
        let creation = self
            .creation_date
            .ok_or(ParseError::MissingField("creation-date"))?;
        let modification = self
            .last_modification_date
            .ok_or(ParseError::MissingField("last-modification-date"))?;

        let mut note = Note::new(
            Identification::new(uid, product_id),
            AuditInformation::new(creation, modification),
            self.classification.unwrap_or_default(),
            self.summary.unwrap_or_default(),
        );
        note.set_description(self.description);
        note.set_color(self.color);
        for tag in self.categories {
            note.add_category(tag);
        }
        for attachment in self.attachments {
            note.add_attachment(attachment);
        }
        Ok(note)
    }
}

/// Serialize a note to its document form.
///
/// Fields are written in canonical order; empty optional fields become
/// self-closed elements. Attachment payloads are not part of the document,
/// only their descriptors are.
pub fn write(note: &Note) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<note xmlns=\"{}\" version=\"{}\">\n",
        XMLNS, FORMAT_VERSION
    ));
    element(&mut xml, "uid", note.identification().uid());
    element(&mut xml, "prodid", note.identification().product_id());
    element(
        &mut xml,
        "creation-date",
        &timestamp::format(&note.audit_information().creation_date()),
    );
    element(
        &mut xml,
        "last-modification-date",
        &timestamp::format(&note.audit_information().last_modification_date()),
    );
    element(&mut xml, "classification", note.classification().as_str());
    element(&mut xml, "summary", note.summary());
    match note.description() {
        Some(desc) => raw_element(&mut xml, "description", &escape::description(desc)),
        None => empty_element(&mut xml, "description"),
    }
    match note.color() {
        Some(color) => element(&mut xml, "color", color.hex_code()),
        None => empty_element(&mut xml, "color"),
    }
    let categories: Vec<&str> = note.categories().iter().map(Tag::name).collect();
    if !categories.is_empty() {
        element(&mut xml, "categories", &categories.join(","));
    }
    for attachment in note.attachments() {
        xml.push_str("<attachment>\n");
        element(&mut xml, "fmttype", attachment.mime_type());
        element(&mut xml, "x-label", attachment.file_name());
        raw_element(
            &mut xml,
            "uri",
            &format!("cid:{}", escape::text(attachment.id())),
        );
        xml.push_str("</attachment>\n");
    }
    xml.push_str("</note>\n");
    xml
}

pub(super) fn element(xml: &mut String, name: &str, value: &str) {
    if value.is_empty() {
        empty_element(xml, name);
    } else {
        raw_element(xml, name, &escape::text(value));
    }
}

pub(super) fn raw_element(xml: &mut String, name: &str, escaped: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(escaped);
    xml.push_str("</");
    xml.push_str(name);
    xml.push_str(">\n");
}

pub(super) fn empty_element(xml: &mut String, name: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push_str("/>\n");
}
