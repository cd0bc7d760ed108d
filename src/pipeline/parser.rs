use anyhow::{Context, Result};
use regex::Regex;

use crate::model::ParsedVerseRecord;

/// Best-effort grammar for `<book><chapter>:<verse> [<note>...] <body>` lines.
/// Anything that does not match is not a verse line.
pub struct VerseLineParser {
    line_regex: Regex,
}

impl VerseLineParser {
    pub fn new() -> Result<Self> {
        let line_regex = Regex::new(
            r"^(?P<book>\p{Hangul}+)(?P<chapter>\d+):(?P<verse>\d+)(?:(?:\s*<[^<>]*>)+\s*|\s+|$)(?P<body>.*)$",
        )
        .context("failed to compile verse line regex")?;

        Ok(Self { line_regex })
    }

    pub fn parse(&self, line: &str) -> Option<ParsedVerseRecord> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let captures = self.line_regex.captures(line)?;
        let chapter = parse_positive(captures.name("chapter")?.as_str())?;
        let verse = parse_positive(captures.name("verse")?.as_str())?;
        // Empty bodies are accepted as-is.
        let text = captures
            .name("body")
            .map(|m| m.as_str().trim())
            .unwrap_or_default()
            .to_string();

        Some(ParsedVerseRecord {
            chapter,
            verse,
            text,
        })
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|value| *value > 0)
}
