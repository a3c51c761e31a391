//! Structural parser for model output.
//!
//! Splits raw text into [`BriefSection`]s keyed against an ordered heading
//! table. Content before the first heading is discarded; everything after a
//! heading, blank lines included, belongs to that heading until the next one.

use crate::brief::sections::{BriefSection, SectionConfig, DEFAULT_SECTIONS};

/// Heading matching policy: the trimmed, upper-cased line contains a
/// configured title as a substring. First title in table order wins.
///
/// Substring matching tolerates decoration the model adds around headings
/// ("**DECISION BEING MADE:**", "1. Tradeoffs").
pub fn match_heading<'a>(line: &str, sections: &'a [SectionConfig]) -> Option<&'a SectionConfig> {
    let normalized = line.trim().to_uppercase();
    if normalized.is_empty() {
        return None;
    }
    sections.iter().find(|s| normalized.contains(s.title))
}

/// Parse against the default heading table.
pub fn parse_brief(text: &str) -> Vec<BriefSection> {
    parse_brief_with(text, DEFAULT_SECTIONS)
}

/// Parse against a caller-supplied heading table.
///
/// Output order is the order headings appear in `text`. Repeated headings
/// produce separate sections. No heading anywhere yields an empty vector.
pub fn parse_brief_with(text: &str, sections: &[SectionConfig]) -> Vec<BriefSection> {
    let mut parsed = Vec::new();
    let mut active: Option<BriefSection> = None;

    // Lines keep their terminators so section content reproduces the source,
    // CRLF included. Only a final unterminated line gains a '\n'.
    for line in text.split_inclusive('\n') {
        if let Some(config) = match_heading(line, sections) {
            // Empty sections are kept: the model emitted a heading with no body.
            if let Some(done) = active.replace(BriefSection::open(config)) {
                parsed.push(done);
            }
        } else if let Some(section) = active.as_mut() {
            section.content.push_str(line);
            if !line.ends_with('\n') {
                section.content.push('\n');
            }
        }
    }

    if let Some(done) = active {
        parsed.push(done);
    }

    parsed
}

/// Required headings absent from `text` (case-insensitive containment).
pub fn missing_required<'a, I>(text: &str, required: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let upper = text.to_uppercase();
    required
        .into_iter()
        .filter(|heading| !upper.contains(&heading.to_uppercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::sections::required_headings;

    const TWO: &[SectionConfig] = &[
        SectionConfig {
            title: "DECISION BEING MADE",
            id: "decision",
            icon: "",
            color: "",
        },
        SectionConfig {
            title: "OPTIONS CONSIDERED",
            id: "options",
            icon: "",
            color: "",
        },
    ];

    #[test]
    fn test_two_sections_keep_blank_line() {
        let parsed = parse_brief_with("DECISION BEING MADE\nfoo\n\nOPTIONS CONSIDERED\nbar\n", TWO);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, "decision");
        assert_eq!(parsed[0].content, "foo\n\n");
        assert_eq!(parsed[1].id, "options");
        assert_eq!(parsed[1].content, "bar\n");
    }

    #[test]
    fn test_no_heading_is_empty() {
        assert!(parse_brief("Just some prose.\nNothing structured here.\n").is_empty());
        assert!(parse_brief("").is_empty());
    }

    #[test]
    fn test_repeated_heading_not_merged() {
        let parsed = parse_brief_with("OPTIONS CONSIDERED\na\nOPTIONS CONSIDERED\nb\n", TWO);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].title, parsed[1].title);
        assert_eq!(parsed[0].content, "a\n");
        assert_eq!(parsed[1].content, "b\n");
    }

    #[test]
    fn test_input_order_not_table_order() {
        let parsed = parse_brief_with("OPTIONS CONSIDERED\nx\nDECISION BEING MADE\ny\n", TWO);
        let ids: Vec<_> = parsed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["options", "decision"]);
    }

    #[test]
    fn test_preamble_dropped_and_empty_section_kept() {
        let parsed = parse_brief_with(
            "Here is your brief:\n\nDECISION BEING MADE\nOPTIONS CONSIDERED\n- one\n",
            TWO,
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].content, "");
        assert_eq!(parsed[1].content, "- one\n");
    }

    #[test]
    fn test_decorated_heading_matches() {
        assert_eq!(match_heading("  **Decision being made:**  ", TWO).map(|s| s.id), Some("decision"));
        assert_eq!(match_heading("1. options considered", TWO).map(|s| s.id), Some("options"));
        assert_eq!(match_heading("   ", TWO), None);
        assert_eq!(match_heading("the decision", TWO), None);
    }

    #[test]
    fn test_first_in_table_wins() {
        let overlapping = [
            SectionConfig {
                title: "RISK",
                id: "risk",
                icon: "",
                color: "",
            },
            SectionConfig {
                title: "RISKS & WATCHOUTS",
                id: "risks",
                icon: "",
                color: "",
            },
        ];
        assert_eq!(match_heading("RISKS & WATCHOUTS", &overlapping).map(|s| s.id), Some("risk"));
    }

    #[test]
    fn test_content_keeps_raw_line() {
        let parsed = parse_brief_with("DECISION BEING MADE\n   indented  \r\nnext\n", TWO);
        assert_eq!(parsed[0].content, "   indented  \r\nnext\n");
    }

    #[test]
    fn test_crlf_layout_preserved() {
        let parsed = parse_brief("DECISION BEING MADE\r\nfoo\r\n\r\nbar\r\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].content, "foo\r\n\r\nbar\r\n");
    }

    #[test]
    fn test_unterminated_last_line() {
        let parsed = parse_brief_with("DECISION BEING MADE\nfoo\n\nbar", TWO);
        assert_eq!(parsed[0].content, "foo\n\nbar\n");
    }

    #[test]
    fn test_full_brief_with_default_table() {
        let text = "DECISION BEING MADE\nShip v2?\nOPTIONS CONSIDERED\n1\nTRADEOFFS\n2\n\
                    RECOMMENDED DECISION\n3\nDECISION OWNER\n4\nRISKS & WATCHOUTS\n5\nNEXT 3 ACTIONS\n6\n";
        let parsed = parse_brief(text);
        let ids: Vec<_> = parsed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            ["decision", "options", "tradeoffs", "recommendation", "owner", "risks", "actions"]
        );
        assert_eq!(parsed[5].icon, "⚠️");
        assert!(missing_required(text, required_headings()).is_empty());
    }

    #[test]
    fn test_missing_required() {
        let missing = missing_required("decision being made\nTradeoffs\n", required_headings());
        assert!(!missing.contains(&"DECISION BEING MADE"));
        assert!(!missing.contains(&"TRADEOFFS"));
        assert!(missing.contains(&"NEXT 3 ACTIONS"));
        assert_eq!(missing.len(), 5);
    }
}
