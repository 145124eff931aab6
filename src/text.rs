use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct TextCleaner {
    markup_pattern: Regex,
    non_letter_pattern: Regex,
    whitespace_pattern: Regex,
}

impl TextCleaner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            markup_pattern: Regex::new(r"<.*?>").context("failed to compile markup regex")?,
            non_letter_pattern: Regex::new(r"[^a-z\s]")
                .context("failed to compile non-letter regex")?,
            whitespace_pattern: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
        })
    }

    /// Lowercases, strips markup and everything outside `a-z` and whitespace,
    /// then collapses runs of whitespace.
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_markup = self.markup_pattern.replace_all(&lowered, "");
        let letters_only = self.non_letter_pattern.replace_all(&without_markup, "");
        self.whitespace_pattern
            .replace_all(&letters_only, " ")
            .trim()
            .to_string()
    }
}

/// Calendar date of a published timestamp, or `None` when no known layout
/// matches.
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.date());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_markup_punctuation_and_digits() {
        let cleaner = TextCleaner::new().expect("cleaner");
        let cleaned = cleaner.clean("<p>Sea levels ROSE 3mm</p>,\n\tsays  <b>NASA</b>!");
        assert_eq!(cleaned, "sea levels rose mm says nasa");
    }

    #[test]
    fn clean_of_blank_text_is_empty() {
        let cleaner = TextCleaner::new().expect("cleaner");
        assert_eq!(cleaner.clean("  <br/> 2015 !! "), "");
    }

    #[test]
    fn parse_published_date_accepts_known_layouts() {
        let expected = NaiveDate::from_ymd_opt(2015, 12, 12).expect("valid date");
        assert_eq!(parse_published_date("2015-12-12"), Some(expected));
        assert_eq!(parse_published_date("2015-12-12 18:30:00"), Some(expected));
        assert_eq!(parse_published_date("2015-12-12T18:30:00"), Some(expected));
        assert_eq!(
            parse_published_date("2015-12-12T18:30:00+01:00"),
            Some(expected)
        );
    }

    #[test]
    fn parse_published_date_rejects_garbage() {
        assert_eq!(parse_published_date(""), None);
        assert_eq!(parse_published_date("last tuesday"), None);
        assert_eq!(parse_published_date("2015-13-40"), None);
    }
}
