//! Metrics page scraping
//!
//! The metrics endpoint renders HTML for humans. Each `<p>` is checked
//! for one of six labels and the first number in that paragraph is taken.
//! This is a text heuristic, not an HTML parser.
//!
//! A paragraph ends only at `</p>`, the next `<p>` or the end of the
//! document. Closing an enclosing block (`<div><p>x</div>...`) does not end
//! it, so text after the block is still read as part of the paragraph.
//! Named entities are limited to `&amp;`, `&lt;`, `&gt;`, `&quot;` and
//! `&nbsp;`; decimal and hex character references are decoded.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::ProbeError;
use crate::models::{MetricField, MetricsSnapshot, TokenKind};

fn open_p() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<p(?:\s[^>]*)?>").expect("valid regex"))
}

fn close_p() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</p\s*>").expect("valid regex"))
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn char_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#(?:[xX]([0-9a-fA-F]+)|([0-9]+));").expect("valid regex"))
}

fn integer_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").expect("valid regex"))
}

fn decimal_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9.]+").expect("valid regex"))
}

/// Text content of every paragraph, in document order.
///
/// A paragraph ends at its closing tag, at the next `<p>`, or at the end
/// of the document.
pub fn paragraphs(html: &str) -> Vec<String> {
    let opens: Vec<_> = open_p().find_iter(html).collect();

    opens
        .iter()
        .enumerate()
        .map(|(i, open)| {
            let start = open.end();
            let next_open = opens.get(i + 1).map(|m| m.start()).unwrap_or(html.len());
            let close = close_p()
                .find_at(html, start)
                .map(|m| m.start())
                .unwrap_or(html.len());
            text_content(&html[start..close.min(next_open)])
        })
        .collect()
}

fn text_content(fragment: &str) -> String {
    decode_entities(&any_tag().replace_all(fragment, ""))
}

/// `&amp;` goes last so `&amp;lt;` stays `&lt;`
fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");

    char_reference()
        .replace_all(&named, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse().ok(),
                (None, None) => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .replace("&amp;", "&")
}

/// First number-like token anywhere in `text`
fn first_token(text: &str, kind: TokenKind) -> Option<&str> {
    let re = match kind {
        TokenKind::Integer => integer_token(),
        TokenKind::Decimal => decimal_token(),
    };
    re.find(text).map(|m| m.as_str())
}

/// Build a snapshot from the metrics page.
///
/// Labels are tried in priority order and only the first match per
/// paragraph counts. A later paragraph overwrites an earlier value for the
/// same field. A matched label without any number fails the whole scrape.
pub fn scrape_metrics(html: &str) -> Result<MetricsSnapshot, ProbeError> {
    let mut snapshot = MetricsSnapshot::default();

    for text in paragraphs(html) {
        let Some(field) = MetricField::all()
            .into_iter()
            .find(|f| text.contains(f.label()))
        else {
            continue;
        };

        let token = first_token(&text, field.token_kind()).ok_or_else(|| {
            ProbeError::Parse(format!("no numeric value in paragraph '{}'", text.trim()))
        })?;
        snapshot.set(field, token);
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_PAGE: &str = "<html><body><h1>Server Metrics</h1>\n\
        <p><strong>Total Requests:</strong> 1520</p>\n\
        <p><strong>Cache Hits:</strong> 1200</p>\n\
        <p><strong>Cache Misses:</strong> 320</p>\n\
        <p><strong>Cache Hit Rate:</strong> 78.95%</p>\n\
        <p><strong>Average Response Time:</strong> 1.37 ms</p>\n\
        <p><strong>Cache Size:</strong> 42 entries</p>\n\
        <p><em>Auto-refresh every 5 seconds</em></p>\n\
        </body></html>";

    #[test]
    fn test_paragraphs() {
        let texts = paragraphs("<p>one</p><P class=\"x\">two <b>bold</b></P><pre>no</pre>");
        assert_eq!(texts, vec!["one".to_string(), "two bold".to_string()]);
    }

    #[test]
    fn test_unclosed_paragraphs() {
        let texts = paragraphs("<p>first<p>second");
        assert_eq!(texts, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_entities_decoded() {
        let texts = paragraphs("<p>a &amp; b &lt;c&gt;</p>");
        assert_eq!(texts[0], "a & b <c>");
    }

    #[test]
    fn test_character_references_decoded() {
        let texts = paragraphs("<p>it&#39;s&#x3A; 5 &amp;#58;</p>");
        assert_eq!(texts[0], "it's: 5 &#58;");

        let snapshot = scrape_metrics("<p>Cache Hits&#58; 9</p><p>Cache Size&#x3a; 4</p>").unwrap();
        assert_eq!(snapshot.get(MetricField::CacheHits), Some("9"));
        assert_eq!(snapshot.get(MetricField::CacheSize), Some("4"));
    }

    #[test]
    fn test_invalid_character_reference_kept() {
        let texts = paragraphs("<p>&#xD800; &#99999999999;</p>");
        assert_eq!(texts[0], "&#xD800; &#99999999999;");
    }

    #[test]
    fn test_paragraph_runs_past_enclosing_block() {
        let html = "<div><p>x</div><span>Cache Hits: 9</span>";
        assert_eq!(paragraphs(html), vec!["xCache Hits: 9".to_string()]);

        let snapshot = scrape_metrics(html).unwrap();
        assert_eq!(snapshot.get(MetricField::CacheHits), Some("9"));
    }

    #[test]
    fn test_full_server_page() {
        let snapshot = scrape_metrics(SERVER_PAGE).unwrap();

        assert_eq!(snapshot.get(MetricField::TotalRequests), Some("1520"));
        assert_eq!(snapshot.get(MetricField::CacheHits), Some("1200"));
        assert_eq!(snapshot.get(MetricField::CacheMisses), Some("320"));
        assert_eq!(snapshot.get(MetricField::CacheHitRate), Some("78.95"));
        assert_eq!(snapshot.get(MetricField::AvgResponseTime), Some("1.37"));
        assert_eq!(snapshot.get(MetricField::CacheSize), Some("42"));
    }

    #[test]
    fn test_single_label() {
        let snapshot = scrape_metrics("<p>Total Requests: 42</p>").unwrap();

        assert_eq!(snapshot.get(MetricField::TotalRequests), Some("42"));
        for field in &MetricField::all()[1..] {
            assert_eq!(snapshot.display(*field), "0");
        }
    }

    #[test]
    fn test_first_numeric_token_wins() {
        let snapshot = scrape_metrics("<p>Total Requests: 42 (up 7 since 10:15)</p>").unwrap();
        assert_eq!(snapshot.get(MetricField::TotalRequests), Some("42"));

        // The token is taken from the whole paragraph, not after the label
        let snapshot = scrape_metrics("<p>Node 3 Cache Size: 12</p>").unwrap();
        assert_eq!(snapshot.get(MetricField::CacheSize), Some("3"));
    }

    #[test]
    fn test_label_priority_order() {
        let snapshot = scrape_metrics("<p>Cache Misses: 5 Total Requests: 9</p>").unwrap();
        assert_eq!(snapshot.get(MetricField::TotalRequests), Some("5"));
        assert_eq!(snapshot.get(MetricField::CacheMisses), None);
    }

    #[test]
    fn test_later_paragraph_overwrites() {
        let snapshot =
            scrape_metrics("<p>Cache Hits: 1</p><p>Cache Hits: 2</p>").unwrap();
        assert_eq!(snapshot.get(MetricField::CacheHits), Some("2"));
    }

    #[test]
    fn test_integer_label_truncates_decimal() {
        let snapshot = scrape_metrics("<p>Cache Size: 12.5</p>").unwrap();
        assert_eq!(snapshot.get(MetricField::CacheSize), Some("12"));
    }

    #[test]
    fn test_label_without_number_is_parse_error() {
        let err = scrape_metrics("<p>Cache Hit Rate: n/a</p>").unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }

    #[test]
    fn test_no_paragraphs() {
        let snapshot = scrape_metrics("Total Requests: 5").unwrap();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }
}
