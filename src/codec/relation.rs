//! The `<configuration>` document format for tag relations.
//!
//! Tags are stored as relation documents whose members are the uids of the
//! tagged notes. A configuration document only describes a tag when its
//! `type` is `relation` and its `relationType` is `tag` (both compared
//! ignoring case); anything else is rejected with
//! [`ParseError::NotARelation`] so callers can skip foreign configuration
//! objects without failing the whole folder.

use std::collections::BTreeSet;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::note::{element, empty_element, raw_element};
use super::{escape, timestamp, FORMAT_VERSION, XMLNS};
use crate::error::ParseError;
use crate::types::{AuditInformation, Color, Identification, Tag, TagDetails};

const MEMBER_URN_PREFIX: &str = "urn:uuid:";

/// Parse a relation document into a tag record.
pub fn parse(xml: &str) -> Result<TagDetails, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = RelationFields::default();
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(_) => text.clear(),
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
struct RelationFields {
    uid: Option<String>,
    product_id: Option<String>,
    creation_date: Option<chrono::DateTime<chrono::Utc>>,
    last_modification_date: Option<chrono::DateTime<chrono::Utc>>,
    object_type: Option<String>,
    relation_type: Option<String>,
    name: Option<String>,
    color: Option<Color>,
    priority: i32,
    members: BTreeSet<String>,
}

impl RelationFields {
    fn set(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        match name {
            "uid" => self.uid = Some(value.to_string()),
            "prodid" => self.product_id = Some(value.to_string()),
            "creation-date" => self.creation_date = Some(timestamp::parse(value)?),
            "last-modification-date" => {
                self.last_modification_date = Some(timestamp::parse(value)?)
            }
            "type" => self.object_type = Some(value.to_string()),
            "relationType" => self.relation_type = Some(value.to_string()),
            "name" => self.name = Some(value.to_string()),
            "color" => self.color = Color::from_hex(value),
            "priority" => {
                let value = value.trim();
                self.priority = if value.is_empty() {
                    0
                } else {
                    value.parse().map_err(|_| ParseError::InvalidValue {
                        field: "priority",
                        value: value.to_string(),
                    })?
                };
            }
            "member" => {
                let member = value.strip_prefix(MEMBER_URN_PREFIX).unwrap_or(value);
                self.members.insert(member.to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> Result<TagDetails, ParseError> {
        let is_tag_relation = self
            .object_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("relation"))
            && self
                .relation_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("tag"));
        if !is_tag_relation {
            return Err(ParseError::NotARelation);
        }

        let uid = self.uid.ok_or(ParseError::MissingField("uid"))?;
        let product_id = self.product_id.ok_or(ParseError::MissingField("prodid"))?;
        let creation = self
            .creation_date
            .ok_or(ParseError::MissingField("creation-date"))?;
        let modification = self
            .last_modification_date
            .ok_or(ParseError::MissingField("last-modification-date"))?;

        let mut tag = Tag::new(self.name.unwrap_or_default());
        tag.set_priority(self.priority);
        tag.set_color(self.color);
        Ok(TagDetails::new(
            Identification::new(uid, product_id),
            AuditInformation::new(creation, modification),
            tag,
            self.members,
        ))
    }
}

/// Serialize a tag record to its relation document form.
pub fn write(details: &TagDetails) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<configuration xmlns=\"{}\" version=\"{}\">\n",
        XMLNS, FORMAT_VERSION
    ));
    element(&mut xml, "uid", details.identification().uid());
    element(&mut xml, "prodid", details.identification().product_id());
    element(
        &mut xml,
        "creation-date",
        &timestamp::format(&details.audit_information().creation_date()),
    );
    element(
        &mut xml,
        "last-modification-date",
        &timestamp::format(&details.audit_information().last_modification_date()),
    );
    element(&mut xml, "type", "relation");
    element(&mut xml, "name", details.tag().name());
    element(&mut xml, "relationType", "tag");
    match details.tag().color() {
        Some(color) => element(&mut xml, "color", color.hex_code()),
        None => empty_element(&mut xml, "color"),
    }
    element(&mut xml, "priority", &details.tag().priority().to_string());
    for member in details.members() {
        raw_element(
            &mut xml,
            "member",
            &format!("{}{}", MEMBER_URN_PREFIX, escape::text(member)),
        );
    }
    xml.push_str("</configuration>\n");
    xml
}
