//! RSS 2.0 serialization.
//!
//! Items are written in the order given. Optional fields that are absent
//! (`Author::Unknown`, no publish date) are omitted entirely so that the
//! reader's absence checks hold after a reload.

use crate::error::FeedError;
use crate::models::{ArticleRecord, FeedMeta};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// Serialize `records` under a channel described by `meta`.
///
/// `built_at` becomes `<lastBuildDate>`; it is the only part of the output
/// that changes between two serializations of the same records.
pub fn serialize_feed(
    meta: &FeedMeta,
    records: &[ArticleRecord],
    built_at: DateTime<Utc>,
) -> Result<Vec<u8>, FeedError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &meta.title)?;
    write_text_element(&mut writer, "link", &meta.link)?;
    write_text_element(&mut writer, "description", &meta.description)?;
    write_text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;

    for record in records {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", record.title())?;
        write_text_element(&mut writer, "link", record.link())?;
        write_text_element(&mut writer, "description", record.summary())?;
        if let Some(author) = record.author().name() {
            write_text_element(&mut writer, "author", author)?;
        }
        if let Some(published) = record.published_at() {
            write_text_element(&mut writer, "pubDate", &published.to_rfc2822())?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<(), FeedError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    let clean = strip_invalid_xml_chars(text);
    w.write_event(Event::Text(BytesText::new(&clean)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab/LF/CR, U+FFFE, U+FFFF).
fn strip_invalid_xml_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, KST};
    use chrono::TimeZone;

    fn meta() -> FeedMeta {
        FeedMeta {
            title: "셜록 Archives".to_string(),
            link: "https://www.neosherlock.com/archives".to_string(),
            description: "네오셜록 아카이브 RSS 피드".to_string(),
        }
    }

    fn records() -> Vec<ArticleRecord> {
        vec![
            ArticleRecord::new(
                "Tom & Jerry <live>",
                Author::Known("김기자".to_string()),
                Some(KST.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()),
                "<p>body</p>",
                "https://www.neosherlock.com/archives/1",
            )
            .unwrap(),
            ArticleRecord::new(
                "No byline",
                Author::Unknown,
                None,
                "plain",
                "https://www.neosherlock.com/archives/2",
            )
            .unwrap(),
        ]
    }

    fn built_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_channel_header() {
        let xml = String::from_utf8(serialize_feed(&meta(), &records(), built_at()).unwrap()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains(r#"<rss version="2.0">"#));
        assert!(xml.contains("<title>셜록 Archives</title>"));
        assert!(xml.contains("<lastBuildDate>Sat, 16 Mar 2024 12:00:00 +0000</lastBuildDate>"));
    }

    #[test]
    fn test_item_fields_are_escaped_and_dated() {
        let xml = String::from_utf8(serialize_feed(&meta(), &records(), built_at()).unwrap()).unwrap();
        assert!(xml.contains("<title>Tom &amp; Jerry &lt;live&gt;</title>"));
        assert!(xml.contains("<description>&lt;p&gt;body&lt;/p&gt;</description>"));
        assert!(xml.contains("<author>김기자</author>"));
        assert!(xml.contains("<pubDate>Fri, 15 Mar 2024 00:00:00 +0900</pubDate>"));
    }

    #[test]
    fn test_absent_optional_fields_are_omitted() {
        let only_unknown = vec![records().remove(1)];
        let xml = String::from_utf8(serialize_feed(&meta(), &only_unknown, built_at()).unwrap()).unwrap();
        assert!(!xml.contains("<author>"));
        assert!(!xml.contains("<pubDate>"));
        assert_eq!(xml.matches("<item>").count(), 1);
    }

    #[test]
    fn test_output_differs_only_in_build_date() {
        let first = serialize_feed(&meta(), &records(), built_at()).unwrap();
        let again = serialize_feed(&meta(), &records(), built_at()).unwrap();
        assert_eq!(first, again);

        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let third = String::from_utf8(serialize_feed(&meta(), &records(), later).unwrap()).unwrap();
        let first = String::from_utf8(first).unwrap();
        let strip = |s: &str| {
            s.lines()
                .filter(|line| !line.contains("<lastBuildDate>"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_ne!(first, third);
        assert_eq!(strip(&first), strip(&third));
    }

    #[test]
    fn test_control_characters_are_stripped() {
        assert_eq!(strip_invalid_xml_chars("a\u{0}b\u{8}c\td\n"), "abc\td\n");
    }
}
