//! Content-line parsing and classification.
//!
//! Only the head of a line is interpreted: group, name, raw parameters and
//! raw value. Values are never unescaped here.

use std::borrow::Cow;

/// `PRODID` value prefix written by Apple's exporter.
const APPLE_PRODID_PREFIX: &str = "-//Apple Inc.//";

/// Parameter names normalized to upper case on these properties.
const TYPED_PROPERTIES: [&str; 4] = ["TEL", "EMAIL", "ADR", "URL"];

/// What a logical vCard line is, as far as conversion is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `BEGIN:VCARD`
    Begin,
    /// `END:VCARD`
    End,
    /// `VERSION`
    Version,
    /// `FN`
    FormattedName,
    /// `N`
    Name,
    /// `ORG`
    Organization,
    /// `PHOTO`
    Photo,
    /// `KIND`
    Kind,
    /// `X-*` properties (grouped or not) and Apple's `PRODID`.
    AppleExtension,
    /// Anything else, including lines that do not parse.
    Other,
}

impl PropertyKind {
    /// Classify a logical line by its property name.
    #[must_use]
    pub fn classify(line: Option<&ContentLine<'_>>) -> Self {
        let Some(line) = line else {
            return Self::Other;
        };

        if line.is_apple_extension() {
            return Self::AppleExtension;
        }

        match line.name.to_ascii_uppercase().as_str() {
            "BEGIN" if line.value.trim().eq_ignore_ascii_case("VCARD") => Self::Begin,
            "END" if line.value.trim().eq_ignore_ascii_case("VCARD") => Self::End,
            "VERSION" => Self::Version,
            "FN" => Self::FormattedName,
            "N" => Self::Name,
            "ORG" => Self::Organization,
            "PHOTO" => Self::Photo,
            "KIND" => Self::Kind,
            _ => Self::Other,
        }
    }
}

/// The head of a `[GROUP.]NAME[;PARAM=...]:VALUE` line.
///
/// `params` keeps its leading `;` so that rendering is lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine<'a> {
    pub group: Option<&'a str>,
    pub name: &'a str,
    pub params: &'a str,
    pub value: &'a str,
}

impl<'a> ContentLine<'a> {
    /// Split a line at its first unquoted colon.
    ///
    /// Returns `None` for lines without a colon (blank lines, stray text).
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut in_quotes = false;
        let mut name_end = None;
        let mut colon = None;

        for (i, c) in line.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ';' if !in_quotes && name_end.is_none() => name_end = Some(i),
                ':' if !in_quotes => {
                    colon = Some(i);
                    break;
                }
                _ => {}
            }
        }

        let colon = colon?;
        let name_end = name_end.unwrap_or(colon);
        let head = &line[..name_end];
        if head.trim().is_empty() {
            return None;
        }

        let (group, name) = match head.rsplit_once('.') {
            Some((group, name)) => (Some(group), name),
            None => (None, head),
        };

        Some(Self {
            group,
            name,
            params: &line[name_end..colon],
            value: &line[colon + 1..],
        })
    }

    /// Whether the line is an Apple-only property.
    #[must_use]
    pub fn is_apple_extension(&self) -> bool {
        let name = self.name.as_bytes();
        if name.len() >= 2 && name[..2].eq_ignore_ascii_case(b"X-") {
            return true;
        }
        self.name.eq_ignore_ascii_case("PRODID") && self.value.starts_with(APPLE_PRODID_PREFIX)
    }

    /// Whether the group is one of Apple's `itemN` custom-label groups.
    #[must_use]
    pub fn has_apple_group(&self) -> bool {
        self.group.is_some_and(is_apple_item_group)
    }

    /// Whether `TYPE` parameters on this property get their case normalized.
    #[must_use]
    pub fn takes_type_params(&self) -> bool {
        TYPED_PROPERTIES
            .iter()
            .any(|p| self.name.eq_ignore_ascii_case(p))
    }

    /// Render the line back to text with replaced parts.
    #[must_use]
    pub fn render(&self, group: Option<&str>, params: &str, value: &str) -> String {
        let mut out =
            String::with_capacity(self.name.len() + params.len() + value.len() + 16);
        if let Some(group) = group {
            out.push_str(group);
            out.push('.');
        }
        out.push_str(self.name);
        out.push_str(params);
        out.push(':');
        out.push_str(value);
        out
    }
}

/// `item1`, `ITEM12`, ...
fn is_apple_item_group(group: &str) -> bool {
    let bytes = group.as_bytes();
    bytes.len() > 4
        && bytes[..4].eq_ignore_ascii_case(b"item")
        && bytes[4..].iter().all(u8::is_ascii_digit)
}

/// Rewrite lowercase `type=` parameter names to `TYPE=`.
///
/// `params` is the raw parameter section including its leading `;`.
#[must_use]
pub fn normalize_type_params(params: &str) -> Cow<'_, str> {
    let parts = split_unquoted(params, ';');
    if !parts.iter().any(|p| is_lowercase_type(p)) {
        return Cow::Borrowed(params);
    }

    let rewritten = parts
        .iter()
        .map(|p| {
            if is_lowercase_type(p) {
                Cow::Owned(format!("TYPE={}", &p[5..]))
            } else {
                Cow::Borrowed(*p)
            }
        })
        .collect::<Vec<_>>();
    Cow::Owned(rewritten.join(";"))
}

fn is_lowercase_type(param: &str) -> bool {
    param
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("type="))
        && !param.starts_with("TYPE=")
}

/// Split on `sep` outside double quotes.
fn split_unquoted(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Split a structured value (`N`, `ORG`) into its `;`-separated components.
///
/// Backslash-escaped separators stay inside their component.
#[must_use]
pub fn split_components(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ';' {
            parts.push(&value[start..i]);
            start = i + 1;
        }
    }
    parts.push(&value[start..]);
    parts
}
