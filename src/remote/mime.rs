//! Building and decoding the MIME messages that carry Kolab objects.
//!
//! A Kolab message is a `multipart/mixed` with a human-readable text part,
//! the XML document as an attachment named `kolab.xml`, and one additional
//! attachment part per note attachment, linked by `Content-ID`. The entity
//! uid goes into the subject; `X-Kolab-Type` declares what the XML is.

use chrono::{TimeZone, Utc};
use mail_builder::headers::raw::Raw;
use mail_builder::mime::MimePart;
use mail_builder::MessageBuilder;
use mailparse::{dateparse, parse_mail, ParsedMail};

use super::{MessageDraft, MessagePart, RemoteMessage};
use crate::codec::{KOLAB_XML_FILE_NAME, KOLAB_XML_MEDIA_TYPE};
use crate::error::{Error, Result};

/// Header carrying the Kolab object type.
pub const KOLAB_TYPE_HEADER: &str = "X-Kolab-Type";

/// Header carrying the Kolab format version.
pub const KOLAB_MIME_VERSION_HEADER: &str = "X-Kolab-Mime-Version";

/// The Kolab format version this crate writes.
pub const KOLAB_MIME_VERSION: &str = "3.0";

/// The user agent advertised on appended messages.
pub const USER_AGENT: &str = "kolab-note-sync";

/// The explanatory text part added to every Kolab message.
pub const KOLAB_TEXT: &str = "This is a Kolab Groupware object.\n\
To view this object you will need an email client that can understand the Kolab Groupware format.\n\
For a list of such email clients please visit\n\
http://www.kolab.org/";

/// Render a draft into RFC822 bytes ready for `APPEND`.
pub fn render(draft: &MessageDraft) -> Result<Vec<u8>> {
    let mut parts = vec![
        MimePart::new("text/plain; charset=utf-8", KOLAB_TEXT),
        MimePart::new(KOLAB_XML_MEDIA_TYPE, draft.xml.as_str()).attachment(KOLAB_XML_FILE_NAME),
    ];
    for attachment in &draft.attachments {
        parts.push(
            MimePart::new(attachment.mime_type(), attachment.data())
                .attachment(attachment.file_name())
                .cid(attachment.id()),
        );
    }
    MessageBuilder::new()
        .from(draft.user.as_str())
        .to(draft.user.as_str())
        .subject(draft.subject.as_str())
        .header("Date", Raw::new(draft.date.to_rfc2822()))
        .header(KOLAB_TYPE_HEADER, Raw::new(draft.kolab_type.as_str()))
        .header(KOLAB_MIME_VERSION_HEADER, Raw::new(KOLAB_MIME_VERSION))
        .header("User-Agent", Raw::new(USER_AGENT))
        .body(MimePart::new("multipart/mixed", parts))
        .write_to_vec()
        .map_err(Error::Io)
}

/// Decode fetched RFC822 bytes down to their leaf parts.
pub fn parse_message(raw: &[u8]) -> Result<RemoteMessage> {
    let mail = parse_mail(raw)?;
    let subject = header(&mail, "Subject").unwrap_or_default();
    let kolab_type = header(&mail, KOLAB_TYPE_HEADER);
    let sent = header(&mail, "Date")
        .and_then(|d| dateparse(&d).ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    let mut parts = Vec::new();
    collect_parts(&mail, &mut parts)?;
    Ok(RemoteMessage {
        subject,
        sent,
        kolab_type,
        parts,
    })
}

fn header(mail: &ParsedMail<'_>, name: &str) -> Option<String> {
    use mailparse::MailHeaderMap;
    mail.headers.get_first_value(name)
}

fn collect_parts(mail: &ParsedMail<'_>, out: &mut Vec<MessagePart>) -> Result<()> {
    if mail.ctype.mimetype.starts_with("multipart/") || !mail.subparts.is_empty() {
        for part in &mail.subparts {
            collect_parts(part, out)?;
        }
        return Ok(());
    }
    let content_id = header(mail, "Content-ID")
        .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').to_string());
    let file_name = mail
        .get_content_disposition()
        .params
        .get("filename")
        .cloned()
        .or_else(|| mail.ctype.params.get("name").cloned());
    let mut body = mail.get_body_raw()?;
    // for identity transfer encodings the raw body keeps the line break that
    // precedes the MIME boundary; drop it so part bodies are byte-exact
    let decoded = matches!(
        header(mail, "Content-Transfer-Encoding")
            .map(|e| e.trim().to_ascii_lowercase())
            .as_deref(),
        Some("base64") | Some("quoted-printable")
    );
    if !decoded {
        if body.ends_with(b"\r\n") {
            body.truncate(body.len() - 2);
        } else if body.ends_with(b"\n") {
            body.truncate(body.len() - 1);
        }
    }
    out.push(MessagePart {
        content_type: mail.ctype.mimetype.clone(),
        content_id,
        file_name,
        body,
    });
    Ok(())
}
