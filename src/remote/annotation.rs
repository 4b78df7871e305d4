//! The `/vendor/kolab/folder-type` ANNOTATEMORE commands.
//!
//! Kolab servers classify folders with the pre-RFC `GETANNOTATION` and
//! `SETANNOTATION` commands rather than RFC 5464 METADATA. Both take the
//! folder name, the annotation entry, and for the setter a parenthesized
//! attribute list carrying the shared and private values.

use lazy_static::lazy_static;
use regex::Regex;

use super::FolderType;

/// The annotation entry carrying the folder type.
pub const FOLDER_TYPE_ENTRY: &str = "/vendor/kolab/folder-type";

/// Quote a string for use inside a raw IMAP command.
pub(crate) fn quote(value: &str) -> String {
    format!(
        "\"{}\"",
        value.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// The command fetching all folder-type annotation values of a folder.
pub fn get_command(folder: &str) -> String {
    format!(
        "GETANNOTATION {} {} \"*\"",
        quote(folder),
        quote(FOLDER_TYPE_ENTRY)
    )
}

/// The command annotating a folder with the given type.
pub fn set_command(folder: &str, folder_type: FolderType) -> String {
    format!(
        "SETANNOTATION {} {} (\"value.shared\" {} \"value.priv\" {})",
        quote(folder),
        quote(FOLDER_TYPE_ENTRY),
        quote(folder_type.annotation_value()),
        quote(folder_type.default_annotation_value()),
    )
}

lazy_static! {
    /// Matches one attribute value inside an ANNOTATION response line.
    static ref ANNOTATION_VALUE: Regex =
        Regex::new(r#""value\.(?:shared|priv)"\s+"([^"]*)""#).unwrap();
}

/// Extract the folder type from a raw `GETANNOTATION` response.
///
/// Returns `None` when the folder carries no (or an unrelated) annotation.
pub fn parse_folder_type(response: &str) -> Option<FolderType> {
    for captures in ANNOTATION_VALUE.captures_iter(response) {
        let value = &captures[1];
        if value.contains("note") {
            return Some(FolderType::Note);
        }
        if value.contains("configuration") {
            return Some(FolderType::Configuration);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_quote_their_arguments() {
        assert_eq!(
            get_command("My \"own\" notes"),
            "GETANNOTATION \"My \\\"own\\\" notes\" \"/vendor/kolab/folder-type\" \"*\""
        );
        assert_eq!(
            set_command("Notes", FolderType::Note),
            "SETANNOTATION \"Notes\" \"/vendor/kolab/folder-type\" \
             (\"value.shared\" \"note\" \"value.priv\" \"note.default\")"
        );
        assert_eq!(
            set_command("Configuration", FolderType::Configuration),
            "SETANNOTATION \"Configuration\" \"/vendor/kolab/folder-type\" \
             (\"value.shared\" \"configuration\" \"value.priv\" \"configuration.default\")"
        );
    }

    #[test]
    fn recognizes_note_folders() {
        let response = "* ANNOTATION \"Notes\" \"/vendor/kolab/folder-type\" \
                        (\"value.shared\" \"note\" \"value.priv\" \"note.default\")\n";
        assert_eq!(parse_folder_type(response), Some(FolderType::Note));
    }

    #[test]
    fn recognizes_configuration_folders() {
        let response = "* ANNOTATION \"Configuration\" \"/vendor/kolab/folder-type\" \
                        (\"value.shared\" \"configuration\")\n";
        assert_eq!(parse_folder_type(response), Some(FolderType::Configuration));
    }

    #[test]
    fn unannotated_folders_have_no_type() {
        assert_eq!(parse_folder_type(""), None);
        let response = "* ANNOTATION \"INBOX\" \"/vendor/kolab/folder-type\" \
                        (\"value.shared\" \"mail\")\n";
        assert_eq!(parse_folder_type(response), None);
    }
}
