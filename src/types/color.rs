use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// The well-known colors and their canonical hex codes.
const NAMED: &[(&str, &str)] = &[
    ("white", "#FFFFFF"),
    ("silver", "#C0C0C0"),
    ("gray", "#808080"),
    ("black", "#000000"),
    ("red", "#FF0000"),
    ("maroon", "#800000"),
    ("yellow", "#FFFF00"),
    ("olive", "#808000"),
    ("lime", "#00FF00"),
    ("green", "#008000"),
    ("cyan", "#00FFFF"),
    ("teal", "#008080"),
    ("blue", "#0000FF"),
    ("navy", "#000080"),
    ("magenta", "#FF00FF"),
    ("brown", "#8B4513"),
    ("gold", "#FFD700"),
    ("purple", "#800080"),
    ("orange", "#FFA500"),
];

lazy_static! {
    static ref BY_HEX: HashMap<String, (&'static str, &'static str)> = {
        let mut m = HashMap::new();
        for &(name, hex) in NAMED {
            m.insert(hex.to_ascii_lowercase(), (name, hex));
            // tolerate codes written without the leading '#'
            m.insert(hex[1..].to_ascii_lowercase(), (name, hex));
        }
        m
    };
    static ref BY_NAME: HashMap<&'static str, &'static str> = NAMED.iter().copied().collect();
}

/// An RGB color, kept as its hex representation.
///
/// Codes matching one of the well-known colors are canonicalized on parse, so
/// `Color::from_hex("#ffffff")` compares equal to [`Color::named`]`("white")`.
/// Comparison is case-insensitive either way.
#[derive(Debug, Clone)]
pub struct Color {
    hex: String,
    name: Option<&'static str>,
}

impl Color {
    /// Parse a hex code, resolving it against the well-known colors.
    ///
    /// Blank input means "no color" and yields `None`.
    pub fn from_hex(code: &str) -> Option<Color> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        match BY_HEX.get(&code.to_ascii_lowercase()) {
            Some(&(name, hex)) => Some(Color {
                hex: hex.to_string(),
                name: Some(name),
            }),
            None => Some(Color {
                hex: code.to_string(),
                name: None,
            }),
        }
    }

    /// Look up a well-known color by name ("white", "teal", ...).
    pub fn named(name: &str) -> Option<Color> {
        let hex = BY_NAME.get(name.to_ascii_lowercase().as_str())?;
        Color::from_hex(hex)
    }

    pub fn hex_code(&self) -> &str {
        &self.hex
    }

    /// The well-known name of this color, if it has one.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        self.hex.eq_ignore_ascii_case(&other.hex)
    }
}

impl Eq for Color {}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_no_color() {
        assert_eq!(Color::from_hex(""), None);
        assert_eq!(Color::from_hex("   "), None);
    }

    #[test]
    fn resolves_named_colors_case_insensitively() {
        let c = Color::from_hex("#ffffff").unwrap();
        assert_eq!(c.hex_code(), "#FFFFFF");
        assert_eq!(c.name(), Some("white"));
        assert_eq!(c, Color::named("white").unwrap());

        let c = Color::from_hex("ffa500").unwrap();
        assert_eq!(c.name(), Some("orange"));
    }

    #[test]
    fn keeps_arbitrary_codes() {
        let c = Color::from_hex("#123ABC").unwrap();
        assert_eq!(c.hex_code(), "#123ABC");
        assert_eq!(c.name(), None);
        assert_eq!(c, Color::from_hex("#123abc").unwrap());
    }
}
