//! Splitting a vCard document into records.
//!
//! Every physical line keeps its own terminator so the converter can emit
//! untouched lines byte for byte.

use std::borrow::Cow;

use super::property::{ContentLine, PropertyKind};

/// One physical line and the terminator that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalLine<'a> {
    pub text: &'a str,
    /// `"\r\n"`, `"\n"`, or `""` for the last line of unterminated input.
    pub terminator: &'a str,
}

impl<'a> PhysicalLine<'a> {
    fn split(raw: &'a str) -> Self {
        if let Some(text) = raw.strip_suffix("\r\n") {
            Self { text, terminator: &raw[text.len()..] }
        } else if let Some(text) = raw.strip_suffix('\n') {
            Self { text, terminator: &raw[text.len()..] }
        } else {
            Self { text: raw, terminator: "" }
        }
    }

    pub(super) fn is_continuation(&self) -> bool {
        self.text.starts_with(' ') || self.text.starts_with('\t')
    }
}

/// A property line together with its folded continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine<'a> {
    /// The first physical line followed by any continuation lines.
    pub physical: Vec<PhysicalLine<'a>>,
    pub kind: PropertyKind,
}

impl<'a> LogicalLine<'a> {
    fn new(head: PhysicalLine<'a>) -> Self {
        let kind = PropertyKind::classify(ContentLine::parse(head.text).as_ref());
        Self { physical: vec![head], kind }
    }

    /// The first physical line.
    #[must_use]
    pub fn head(&self) -> &PhysicalLine<'a> {
        &self.physical[0]
    }

    /// Whether the property was folded over several physical lines.
    #[must_use]
    pub fn is_folded(&self) -> bool {
        self.physical.len() > 1
    }

    /// The line with folding removed.
    #[must_use]
    pub fn unfolded(&self) -> Cow<'a, str> {
        if !self.is_folded() {
            return Cow::Borrowed(self.physical[0].text);
        }
        let mut text = self.physical[0].text.to_string();
        for line in &self.physical[1..] {
            text.push_str(&line.text[1..]);
        }
        Cow::Owned(text)
    }

    /// Terminator of the last physical line.
    #[must_use]
    pub fn terminator(&self) -> &'a str {
        self.physical
            .last()
            .map_or("", |line| line.terminator)
    }
}

/// One `BEGIN:VCARD` ... `END:VCARD` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    /// Starts with the `BEGIN:VCARD` line; ends with `END:VCARD` when closed.
    pub lines: Vec<LogicalLine<'a>>,
    /// False when the record ran into the next `BEGIN:VCARD` or end of input.
    pub closed: bool,
}

/// Part of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Record(Record<'a>),
    /// Text outside any record, kept verbatim.
    Interstitial(Vec<PhysicalLine<'a>>),
}

/// A parsed vCard document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    pub segments: Vec<Segment<'a>>,
    /// Terminator used for inserted lines when nothing better is at hand.
    pub default_terminator: &'a str,
}

impl<'a> Document<'a> {
    /// Split `input` into records and interstitial text.
    ///
    /// Never fails: anything that is not inside a record is kept as
    /// interstitial text, and a record missing `END:VCARD` is closed
    /// implicitly by the next `BEGIN:VCARD` or end of input.
    #[must_use]
    pub fn parse(input: &'a str) -> Self {
        let mut segments = Vec::new();
        let mut interstitial: Vec<PhysicalLine<'a>> = Vec::new();
        let mut current: Option<Record<'a>> = None;
        let mut default_terminator = "";

        for raw in input.split_inclusive('\n') {
            let line = PhysicalLine::split(raw);
            if default_terminator.is_empty() {
                default_terminator = line.terminator;
            }

            if let Some(record) = current.as_mut() {
                if line.is_continuation() {
                    if let Some(last) = record.lines.last_mut() {
                        last.physical.push(line);
                    }
                    continue;
                }

                let logical = LogicalLine::new(line);
                match logical.kind {
                    PropertyKind::Begin => {
                        if let Some(open) = current.take() {
                            segments.push(Segment::Record(open));
                        }
                        current = Some(Record { lines: vec![logical], closed: false });
                    }
                    PropertyKind::End => {
                        record.lines.push(logical);
                        record.closed = true;
                        if let Some(done) = current.take() {
                            segments.push(Segment::Record(done));
                        }
                    }
                    _ => record.lines.push(logical),
                }
                continue;
            }

            if !line.is_continuation() {
                let logical = LogicalLine::new(line);
                if logical.kind == PropertyKind::Begin {
                    if !interstitial.is_empty() {
                        segments.push(Segment::Interstitial(std::mem::take(&mut interstitial)));
                    }
                    current = Some(Record { lines: vec![logical], closed: false });
                    continue;
                }
            }
            interstitial.push(line);
        }

        if let Some(open) = current {
            segments.push(Segment::Record(open));
        }
        if !interstitial.is_empty() {
            segments.push(Segment::Interstitial(interstitial));
        }

        Self {
            segments,
            default_terminator: if default_terminator.is_empty() {
                "\n"
            } else {
                default_terminator
            },
        }
    }

    /// Iterate over the records only.
    pub fn records(&self) -> impl Iterator<Item = &Record<'a>> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Record(record) => Some(record),
            Segment::Interstitial(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let doc = Document::parse("");
        assert!(doc.segments.is_empty());
        assert_eq!(doc.default_terminator, "\n");
    }

    #[test]
    fn test_splits_records_and_preserves_terminators() {
        let input = "BEGIN:VCARD\r\nVERSION:3.0\r\nEND:VCARD\r\n\r\nBEGIN:VCARD\nEND:VCARD";
        let doc = Document::parse(input);

        assert_eq!(doc.default_terminator, "\r\n");
        assert_eq!(doc.segments.len(), 3);

        let records: Vec<_> = doc.records().collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.closed));
        assert_eq!(records[0].lines.len(), 3);
        assert_eq!(records[0].lines[1].kind, PropertyKind::Version);
        assert_eq!(records[0].lines[1].terminator(), "\r\n");
        assert_eq!(records[1].lines[0].terminator(), "\n");
        assert_eq!(records[1].lines[1].terminator(), "");

        match &doc.segments[1] {
            Segment::Interstitial(lines) => {
                assert_eq!(lines, &[PhysicalLine { text: "", terminator: "\r\n" }]);
            }
            Segment::Record(_) => panic!("expected blank interstitial line"),
        }
    }

    #[test]
    fn test_continuation_lines_attach_to_previous_property() {
        let input = "BEGIN:VCARD\nPHOTO;ENCODING=b:AAAA\n BBBB\n\tCCCC\nTEL:1\nEND:VCARD\n";
        let doc = Document::parse(input);
        let record = doc.records().next().unwrap();

        assert_eq!(record.lines.len(), 4);
        let photo = &record.lines[1];
        assert_eq!(photo.kind, PropertyKind::Photo);
        assert!(photo.is_folded());
        assert_eq!(photo.unfolded(), "PHOTO;ENCODING=b:AAAABBBBCCCC");
        assert_eq!(record.lines[2].kind, PropertyKind::Other);
    }

    #[test]
    fn test_missing_end_closed_by_next_begin() {
        let input = "BEGIN:VCARD\nFN:A\nBEGIN:VCARD\nFN:B\nEND:VCARD\n";
        let doc = Document::parse(input);
        let records: Vec<_> = doc.records().collect();

        assert_eq!(records.len(), 2);
        assert!(!records[0].closed);
        assert_eq!(records[0].lines.len(), 2);
        assert!(records[1].closed);
    }

    #[test]
    fn test_missing_end_at_end_of_input() {
        let doc = Document::parse("BEGIN:VCARD\nVERSION:3.0\n");
        let records: Vec<_> = doc.records().collect();
        assert_eq!(records.len(), 1);
        assert!(!records[0].closed);
    }

    #[test]
    fn test_text_outside_records_is_interstitial() {
        let doc = Document::parse("garbage\nEND:VCARD\n");
        assert_eq!(doc.records().count(), 0);
        assert_eq!(doc.segments.len(), 1);
    }
}
