//! Record-by-record rewriting of vCard 3.0 into vCard 4.0.

use std::borrow::Cow;

use serde::Serialize;

use super::document::{Document, LogicalLine, PhysicalLine, Record, Segment};
use super::options::ConversionOptions;
use super::property::{normalize_type_params, split_components, ContentLine, PropertyKind};

/// Minimum number of components in a 4.0 `N` value.
const NAME_COMPONENTS: usize = 5;

/// What a conversion did, for the caller's summary and logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub records: usize,
    /// 1-based indices of records that had no `END:VCARD`.
    pub malformed_records: Vec<usize>,
    pub organizations: usize,
    pub derived_formatted_names: usize,
    pub apple_lines_removed: usize,
    pub photos_removed: usize,
    pub formatted_names_removed: usize,
}

/// Converted text plus its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub output: String,
    pub report: ConversionReport,
}

/// Convert a vCard 3.0 document to vCard 4.0.
///
/// Best effort: unknown properties pass through untouched and a record
/// without `END:VCARD` is converted but left unclosed.
#[must_use]
pub fn convert(input: &str, options: &ConversionOptions) -> String {
    convert_with_report(input, options).output
}

/// Like [`convert`], also returning what was changed.
#[must_use]
#[tracing::instrument(skip_all, fields(input_len = input.len()))]
pub fn convert_with_report(input: &str, options: &ConversionOptions) -> Conversion {
    let document = Document::parse(input);
    let mut output = String::with_capacity(input.len());
    let mut report = ConversionReport::default();

    for segment in &document.segments {
        match segment {
            Segment::Interstitial(lines) => {
                emit_interstitial(lines, &mut output, &mut report);
            }
            Segment::Record(record) => {
                report.records += 1;
                if !record.closed {
                    report.malformed_records.push(report.records);
                }

                let converter =
                    RecordConverter::new(record, options, document.default_terminator);
                for line in converter.run(&mut report) {
                    output.push_str(&line.text);
                    output.push_str(line.terminator);
                }
            }
        }
    }

    tracing::debug!(
        records = report.records,
        malformed = report.malformed_records.len(),
        organizations = report.organizations,
        apple_lines_removed = report.apple_lines_removed,
        "Converted vCard document"
    );

    Conversion { output, report }
}

/// Copy text between records, minus stray Apple lines and their
/// continuation lines.
fn emit_interstitial(lines: &[PhysicalLine<'_>], output: &mut String, report: &mut ConversionReport) {
    let mut dropping = false;
    for line in lines {
        if line.is_continuation() {
            if dropping {
                continue;
            }
        } else {
            dropping = ContentLine::parse(line.text).is_some_and(|c| c.is_apple_extension());
            if dropping {
                report.apple_lines_removed += 1;
                continue;
            }
        }
        output.push_str(line.text);
        output.push_str(line.terminator);
    }
}

/// Facts gathered from a record before any line is emitted.
#[derive(Debug, Default)]
struct RecordFacts {
    has_version: bool,
    has_kind: bool,
    has_name: bool,
    has_formatted_name: bool,
    has_nonblank_formatted_name: bool,
    is_organization: bool,
    organization_name: Option<String>,
}

impl RecordFacts {
    fn gather(record: &Record<'_>, options: &ConversionOptions) -> Self {
        let mut facts = Self::default();
        let mut name_is_empty = true;
        let mut has_org = false;
        let mut shown_as_company = false;

        for line in &record.lines {
            let text = line.unfolded();
            let content = ContentLine::parse(&text);
            let value = content.as_ref().map_or("", |c| c.value);

            match line.kind {
                PropertyKind::Version => facts.has_version = true,
                PropertyKind::Kind => facts.has_kind = true,
                PropertyKind::Name if !facts.has_name => {
                    facts.has_name = true;
                    name_is_empty = split_components(value).iter().all(|c| c.trim().is_empty());
                }
                PropertyKind::FormattedName => {
                    facts.has_formatted_name = true;
                    if !value.trim().is_empty() {
                        facts.has_nonblank_formatted_name = true;
                    }
                }
                PropertyKind::Organization if !has_org => {
                    has_org = true;
                    facts.organization_name = organization_display_name(value);
                }
                PropertyKind::AppleExtension => {
                    if content.as_ref().is_some_and(|c| {
                        c.name.eq_ignore_ascii_case("X-ABShowAs")
                            && c.value.trim().eq_ignore_ascii_case("COMPANY")
                    }) {
                        shown_as_company = true;
                    }
                }
                _ => {}
            }
        }

        facts.is_organization = options
            .organization_detection
            .is_organization(name_is_empty && has_org, shown_as_company);
        facts
    }
}

/// The first `ORG` component, or its first non-empty one.
fn organization_display_name(value: &str) -> Option<String> {
    let components = split_components(value);
    components
        .first()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .or_else(|| components.iter().map(|c| c.trim()).find(|c| !c.is_empty()))
        .map(str::to_string)
}

/// Trim trailing empty components, then pad to five.
fn normalize_name_value(value: &str) -> Cow<'_, str> {
    let mut parts = split_components(value);
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts.resize(parts.len().max(NAME_COMPONENTS), "");
    let normalized = parts.join(";");
    if normalized == value {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(normalized)
    }
}

struct OutputLine<'a> {
    text: Cow<'a, str>,
    terminator: &'a str,
}

/// Rewrites one record.
struct RecordConverter<'r, 'a> {
    record: &'r Record<'a>,
    options: &'r ConversionOptions,
    facts: RecordFacts,
    lines: Vec<OutputLine<'a>>,
    default_terminator: &'a str,
    version_seen: bool,
    formatted_name_pending: bool,
}

impl<'r, 'a> RecordConverter<'r, 'a> {
    fn new(
        record: &'r Record<'a>,
        options: &'r ConversionOptions,
        default_terminator: &'a str,
    ) -> Self {
        let facts = RecordFacts::gather(record, options);
        let formatted_name_pending = facts.is_organization
            && !options.remove_formatted_name
            && !facts.has_nonblank_formatted_name
            && facts.organization_name.is_some();

        Self {
            record,
            options,
            facts,
            lines: Vec::with_capacity(record.lines.len() + 2),
            default_terminator,
            version_seen: false,
            formatted_name_pending,
        }
    }

    fn run(mut self, report: &mut ConversionReport) -> Vec<OutputLine<'a>> {
        if self.facts.is_organization {
            report.organizations += 1;
        }

        let record = self.record;
        for line in &record.lines {
            match line.kind {
                PropertyKind::Begin => {
                    self.keep(line);
                    if !self.facts.has_version {
                        self.insert("VERSION:4.0".to_string());
                        self.after_version(report);
                    }
                }
                PropertyKind::Version => {
                    self.replace(line, "VERSION:4.0".to_string());
                    self.after_version(report);
                }
                PropertyKind::AppleExtension => report.apple_lines_removed += 1,
                PropertyKind::Photo if self.options.remove_photos => report.photos_removed += 1,
                PropertyKind::FormattedName if self.options.remove_formatted_name => {
                    report.formatted_names_removed += 1;
                }
                PropertyKind::FormattedName => self.formatted_name(line, report),
                PropertyKind::Name => {
                    self.property(line, true);
                    if self.formatted_name_pending && !self.facts.has_formatted_name {
                        self.insert_formatted_name(report);
                    }
                }
                PropertyKind::End => self.keep(line),
                PropertyKind::Organization
                | PropertyKind::Photo
                | PropertyKind::Kind
                | PropertyKind::Other => self.property(line, false),
            }
        }

        tracing::trace!(
            lines = self.lines.len(),
            organization = self.facts.is_organization,
            closed = record.closed,
            "Converted record"
        );

        self.lines
    }

    /// Lines that follow the (possibly inserted) `VERSION` line.
    fn after_version(&mut self, report: &mut ConversionReport) {
        if self.version_seen {
            return;
        }
        self.version_seen = true;

        if self.facts.is_organization && self.options.mark_organizations && !self.facts.has_kind
        {
            self.insert("KIND:org".to_string());
        }
        if self.formatted_name_pending
            && !self.facts.has_formatted_name
            && !self.facts.has_name
        {
            self.insert_formatted_name(report);
        }
    }

    fn formatted_name(&mut self, line: &LogicalLine<'a>, report: &mut ConversionReport) {
        if !self.formatted_name_pending {
            self.property(line, false);
            return;
        }

        let text = line.unfolded();
        let Some(content) = ContentLine::parse(&text) else {
            self.keep(line);
            return;
        };
        if !content.value.trim().is_empty() {
            self.property(line, false);
            return;
        }

        let derived = self.facts.organization_name.as_deref().unwrap_or_default();
        let rendered = content.render(self.group_for(&content), content.params, derived);
        self.replace(line, rendered);
        self.formatted_name_pending = false;
        report.derived_formatted_names += 1;
    }

    fn insert_formatted_name(&mut self, report: &mut ConversionReport) {
        if let Some(name) = self.facts.organization_name.clone() {
            self.insert(format!("FN:{name}"));
            self.formatted_name_pending = false;
            report.derived_formatted_names += 1;
        }
    }

    /// Emit a property, stripping Apple's `itemN.` group and normalizing
    /// parameter case. `N` values are padded when `is_name` is set.
    ///
    /// Only the first physical line is rewritten; continuation lines are
    /// copied as they are.
    fn property(&mut self, line: &LogicalLine<'a>, is_name: bool) {
        let head = line.head().text;
        let Some(content) = ContentLine::parse(head) else {
            self.keep(line);
            return;
        };

        let group = self.group_for(&content);
        let params = if self.options.normalize_parameters && content.takes_type_params() {
            normalize_type_params(content.params)
        } else {
            Cow::Borrowed(content.params)
        };
        let value = if is_name && !line.is_folded() {
            normalize_name_value(content.value)
        } else {
            Cow::Borrowed(content.value)
        };

        let unchanged = group == content.group
            && matches!(params, Cow::Borrowed(_))
            && matches!(value, Cow::Borrowed(_));
        if unchanged {
            self.keep(line);
        } else {
            let rendered = content.render(group, &params, &value);
            self.replace_head(line, rendered);
        }
    }

    fn group_for<'c>(&self, content: &ContentLine<'c>) -> Option<&'c str> {
        if content.has_apple_group() {
            None
        } else {
            content.group
        }
    }

    fn keep(&mut self, line: &LogicalLine<'a>) {
        self.lines.extend(line.physical.iter().map(|p| OutputLine {
            text: Cow::Borrowed(p.text),
            terminator: p.terminator,
        }));
    }

    fn replace_head(&mut self, line: &LogicalLine<'a>, head: String) {
        self.lines.push(OutputLine {
            text: Cow::Owned(head),
            terminator: line.head().terminator,
        });
        self.lines.extend(line.physical[1..].iter().map(|p| OutputLine {
            text: Cow::Borrowed(p.text),
            terminator: p.terminator,
        }));
    }

    fn replace(&mut self, line: &LogicalLine<'a>, text: String) {
        self.lines.push(OutputLine {
            text: Cow::Owned(text),
            terminator: line.terminator(),
        });
    }

    /// Append a new line after the last emitted one, borrowing its terminator.
    fn insert(&mut self, text: String) {
        let terminator = match self.lines.last_mut() {
            Some(last) if last.terminator.is_empty() => {
                last.terminator = self.default_terminator;
                ""
            }
            Some(last) => last.terminator,
            None => self.default_terminator,
        };
        self.lines.push(OutputLine {
            text: Cow::Owned(text),
            terminator,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcard::OrganizationDetection;

    fn opts() -> ConversionOptions {
        ConversionOptions::default()
    }

    fn normalized() -> ConversionOptions {
        ConversionOptions {
            normalize_parameters: true,
            ..opts()
        }
    }

    #[test]
    fn test_empty_input() {
        let conversion = convert_with_report("", &opts());
        assert_eq!(conversion.output, "");
        assert_eq!(conversion.report, ConversionReport::default());
    }

    #[test]
    fn test_version_rewritten_in_place() {
        let out = convert("BEGIN:VCARD\nVERSION:3.0\nFN:Jane\nEND:VCARD\n", &opts());
        assert_eq!(out, "BEGIN:VCARD\nVERSION:4.0\nFN:Jane\nEND:VCARD\n");
    }

    #[test]
    fn test_version_inserted_after_begin() {
        let out = convert("BEGIN:VCARD\r\nFN:Jane\r\nEND:VCARD\r\n", &opts());
        assert_eq!(out, "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Jane\r\nEND:VCARD\r\n");
    }

    #[test]
    fn test_apple_lines_dropped_with_continuations() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nX-ABUID:1234\n 5678\nitem1.X-ABLabel:Custom\n\
                     PRODID:-//Apple Inc.//macOS 14.0//EN\nFN:Jane\nEND:VCARD\n";
        let conversion = convert_with_report(input, &opts());
        assert_eq!(
            conversion.output,
            "BEGIN:VCARD\nVERSION:4.0\nFN:Jane\nEND:VCARD\n"
        );
        assert_eq!(conversion.report.apple_lines_removed, 3);
    }

    #[test]
    fn test_apple_item_group_stripped_from_standard_properties() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nitem1.EMAIL;type=INTERNET:jane@example.com\n\
                     item1.X-ABLabel:School\nitem2.URL:https://example.com\nEND:VCARD\n";
        let out = convert(input, &normalized());
        assert_eq!(
            out,
            "BEGIN:VCARD\nVERSION:4.0\nEMAIL;TYPE=INTERNET:jane@example.com\n\
             URL:https://example.com\nEND:VCARD\n"
        );

        let out = convert(input, &opts());
        assert!(out.contains("\nEMAIL;type=INTERNET:jane@example.com\n"));
        assert!(!out.contains("item1."));
    }

    #[test]
    fn test_other_groups_kept() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nwork.TEL;TYPE=CELL:1\nEND:VCARD\n";
        assert!(convert(input, &opts()).contains("\nwork.TEL;TYPE=CELL:1\n"));
    }

    #[test]
    fn test_parameter_case_normalization_is_opt_in() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nTEL;type=CELL;type=pref:1\nNOTE;type=x:y\nEND:VCARD\n";

        let rewritten = convert(input, &normalized());
        assert!(rewritten.contains("\nTEL;TYPE=CELL;TYPE=pref:1\n"));
        assert!(rewritten.contains("\nNOTE;type=x:y\n"));

        let untouched = convert(input, &opts());
        assert!(untouched.contains("\nTEL;type=CELL;type=pref:1\n"));
        assert!(untouched.contains("\nNOTE;type=x:y\n"));
    }

    #[test]
    fn test_name_padded_to_five_components() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:Doe;John\nEND:VCARD\n";
        assert!(convert(input, &opts()).contains("\nN:Doe;John;;;\n"));

        let input = "BEGIN:VCARD\nVERSION:3.0\nN:Doe;John;Q;Dr.;Jr.;\nEND:VCARD\n";
        assert!(convert(input, &opts()).contains("\nN:Doe;John;Q;Dr.;Jr.\n"));

        let input = "BEGIN:VCARD\nVERSION:3.0\nN:;;;;\nEND:VCARD\n";
        assert!(convert(input, &opts()).contains("\nN:;;;;\n"));
    }

    #[test]
    fn test_organization_name_inserted_after_n() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:;;;;\nORG:Acme Corp;Sales\nEND:VCARD\n";
        let conversion = convert_with_report(input, &opts());
        assert_eq!(
            conversion.output,
            "BEGIN:VCARD\nVERSION:4.0\nN:;;;;\nFN:Acme Corp\nORG:Acme Corp;Sales\nEND:VCARD\n"
        );
        assert_eq!(conversion.report.organizations, 1);
        assert_eq!(conversion.report.derived_formatted_names, 1);
    }

    #[test]
    fn test_blank_formatted_name_filled_in_place() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nFN:\nN:;;;;\nORG:;Widgets Ltd\nEND:VCARD\n";
        let out = convert(input, &opts());
        assert_eq!(
            out,
            "BEGIN:VCARD\nVERSION:4.0\nFN:Widgets Ltd\nN:;;;;\nORG:;Widgets Ltd\nEND:VCARD\n"
        );
    }

    #[test]
    fn test_existing_formatted_name_kept_for_organizations() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:;;;;\nFN:ACME\nORG:Acme Corp\nEND:VCARD\n";
        let conversion = convert_with_report(input, &opts());
        assert!(conversion.output.contains("\nFN:ACME\n"));
        assert!(!conversion.output.contains("FN:Acme Corp"));
        assert_eq!(conversion.report.derived_formatted_names, 0);
    }

    #[test]
    fn test_organization_without_n_gets_name_after_version() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nORG:Acme Corp\nEND:VCARD\n";
        let out = convert(input, &opts());
        assert_eq!(
            out,
            "BEGIN:VCARD\nVERSION:4.0\nFN:Acme Corp\nORG:Acme Corp\nEND:VCARD\n"
        );
    }

    #[test]
    fn test_show_as_company_marker() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:Doe;John;;;\nORG:Doe Consulting\n\
                     X-ABShowAs:COMPANY\nEND:VCARD\n";

        let auto = convert_with_report(input, &opts());
        assert_eq!(auto.report.organizations, 1);
        assert!(auto.output.contains("\nFN:Doe Consulting\n"));

        let options = ConversionOptions {
            organization_detection: OrganizationDetection::EmptyName,
            ..opts()
        };
        let empty_name = convert_with_report(input, &options);
        assert_eq!(empty_name.report.organizations, 0);
        assert!(!empty_name.output.contains("FN:"));
    }

    #[test]
    fn test_never_detects_organizations() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:;;;;\nORG:Acme Corp\nEND:VCARD\n";
        let options = ConversionOptions {
            organization_detection: OrganizationDetection::Never,
            ..opts()
        };
        assert!(!convert(input, &options).contains("FN:"));
    }

    #[test]
    fn test_kind_org_marker() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:;;;;\nORG:Acme Corp\nEND:VCARD\n";
        let options = ConversionOptions { mark_organizations: true, ..opts() };
        let out = convert(input, &options);
        assert_eq!(
            out,
            "BEGIN:VCARD\nVERSION:4.0\nKIND:org\nN:;;;;\nFN:Acme Corp\nORG:Acme Corp\nEND:VCARD\n"
        );
        assert_eq!(convert(&out, &options), out);
    }

    #[test]
    fn test_person_is_not_marked() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane;;;\nORG:Acme Corp\nEND:VCARD\n";
        let options = ConversionOptions { mark_organizations: true, ..opts() };
        let out = convert(input, &options);
        assert!(!out.contains("KIND:org"));
        assert!(!out.contains("FN:"));
    }

    #[test]
    fn test_remove_formatted_name_wins_over_derivation() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nFN:\nN:;;;;\nORG:Acme Corp\nEND:VCARD\n";
        let options = ConversionOptions { remove_formatted_name: true, ..opts() };
        let conversion = convert_with_report(input, &options);
        assert!(!conversion.output.contains("FN"));
        assert_eq!(conversion.report.formatted_names_removed, 1);
        assert_eq!(conversion.report.derived_formatted_names, 0);
    }

    #[test]
    fn test_folded_photo_removed() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nPHOTO;ENCODING=b;TYPE=JPEG:/9j/4AAQ\n SkZJRgABAQ\n \
                     AAAQABAAD\nTEL:1\nEND:VCARD\n";
        let options = ConversionOptions { remove_photos: true, ..opts() };
        let conversion = convert_with_report(input, &options);
        assert_eq!(
            conversion.output,
            "BEGIN:VCARD\nVERSION:4.0\nTEL:1\nEND:VCARD\n"
        );
        assert_eq!(conversion.report.photos_removed, 1);
    }

    #[test]
    fn test_photo_kept_by_default() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nPHOTO;ENCODING=b;TYPE=JPEG:/9j/\n AAAA\nEND:VCARD\n";
        let out = convert(input, &opts());
        assert!(out.contains("PHOTO;ENCODING=b;TYPE=JPEG:/9j/\n AAAA\n"));
    }

    #[test]
    fn test_malformed_record_converted_but_left_open() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nX-ABUID:1\nFN:A\nBEGIN:VCARD\nVERSION:3.0\nFN:B\nEND:VCARD\n";
        let conversion = convert_with_report(input, &opts());
        assert_eq!(
            conversion.output,
            "BEGIN:VCARD\nVERSION:4.0\nFN:A\nBEGIN:VCARD\nVERSION:4.0\nFN:B\nEND:VCARD\n"
        );
        assert_eq!(conversion.report.records, 2);
        assert_eq!(conversion.report.malformed_records, vec![1]);
    }

    #[test]
    fn test_insert_after_unterminated_last_line() {
        let conversion = convert_with_report("x\r\nBEGIN:VCARD", &opts());
        assert_eq!(conversion.output, "x\r\nBEGIN:VCARD\r\nVERSION:4.0");
    }

    #[test]
    fn test_interstitial_text_preserved() {
        let input = "BEGIN:VCARD\nVERSION:3.0\nEND:VCARD\n\n\nBEGIN:VCARD\nVERSION:3.0\nEND:VCARD\n";
        let out = convert(input, &opts());
        assert_eq!(out, input.replace("3.0", "4.0"));
    }

    #[test]
    fn test_apple_lines_outside_records_dropped() {
        let input = "X-ABLabel:stray\n 1234\nitem1.X-ABADR:us\nnote\nBEGIN:VCARD\nVERSION:3.0\nEND:VCARD\n\
                     X-ABUID:tail\n";
        let conversion = convert_with_report(input, &opts());
        assert_eq!(
            conversion.output,
            "note\nBEGIN:VCARD\nVERSION:4.0\nEND:VCARD\n"
        );
        assert_eq!(conversion.report.apple_lines_removed, 3);
    }

    #[test]
    fn test_normalize_name_value() {
        assert_eq!(normalize_name_value("Doe"), "Doe;;;;");
        assert_eq!(normalize_name_value(""), ";;;;");
        assert!(matches!(normalize_name_value(";;;;"), Cow::Borrowed(_)));
        assert_eq!(normalize_name_value("A\\;B;C"), "A\\;B;C;;;");
    }

    #[test]
    fn test_organization_display_name() {
        assert_eq!(organization_display_name("Acme Corp;;"), Some("Acme Corp".to_string()));
        assert_eq!(organization_display_name(" ;R&D"), Some("R&D".to_string()));
        assert_eq!(organization_display_name(";;"), None);
    }
}
