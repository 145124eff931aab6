use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde_json::Value;

use crate::model::IngestCounts;
use crate::reference::RegionTable;
use crate::sentiment::SentimentScorer;
use crate::store::StoredArticle;
use crate::text::{TextCleaner, parse_published_date};
use crate::topics::{NOISE_TOPIC, TopicAssigner};
use crate::util::sha256_text;

/// An article exactly as decoded from one feed line, tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RawArticle {
    pub(super) source: String,
    pub(super) headline: Option<String>,
    pub(super) body: Option<String>,
    pub(super) date_published: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct SourceRead {
    pub(super) articles: Vec<RawArticle>,
    pub(super) lines_read: usize,
    pub(super) lines_undecodable: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct CleanArticle {
    pub(super) article_id: String,
    pub(super) source: String,
    pub(super) country: String,
    pub(super) region: String,
    pub(super) headline: String,
    pub(super) cleaned_body: String,
    pub(super) date_published: NaiveDate,
}

pub(super) fn read_source_file(path: &Path, source: &str) -> Result<SourceRead> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut out = SourceRead::default();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.lines_read += 1;

        match decode_line(trimmed, source) {
            Some(article) => out.articles.push(article),
            None => out.lines_undecodable += 1,
        }
    }

    Ok(out)
}

fn decode_line(line: &str, source: &str) -> Option<RawArticle> {
    let value = serde_json::from_str::<Value>(line).ok()?;
    let object = value.as_object()?;

    Some(RawArticle {
        source: source.to_string(),
        headline: string_field(object.get("headline")),
        body: string_field(object.get("body")),
        date_published: match object.get("date_published") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        },
    })
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(ToOwned::to_owned)
}

/// Drops incomplete, undated, duplicate and short articles, cleaning text
/// and attaching country and region on the way.
pub(super) fn preprocess(
    raw: Vec<RawArticle>,
    cleaner: &TextCleaner,
    regions: &RegionTable,
    min_body_chars: usize,
    counts: &mut IngestCounts,
) -> Vec<CleanArticle> {
    let mut seen_bodies = HashSet::<String>::new();
    let mut out = Vec::<CleanArticle>::new();

    for article in raw {
        let (Some(headline), Some(body), Some(date_raw)) =
            (article.headline, article.body, article.date_published)
        else {
            counts.rows_missing_fields += 1;
            continue;
        };

        let cleaned_body = cleaner.clean(&body);
        let cleaned_headline = cleaner.clean(&headline);

        let Some(date_published) = parse_published_date(&date_raw) else {
            counts.rows_invalid_date += 1;
            continue;
        };

        let article_id = sha256_text(&cleaned_body);
        if !seen_bodies.insert(article_id.clone()) {
            counts.rows_duplicate_body += 1;
            continue;
        }

        if cleaned_body.chars().count() <= min_body_chars {
            counts.rows_short_body += 1;
            continue;
        }

        let (country, region) = regions.locate(&article.source);
        out.push(CleanArticle {
            article_id,
            source: article.source,
            country,
            region,
            headline: cleaned_headline,
            cleaned_body,
            date_published,
        });
    }

    out
}

pub(super) fn annotate(
    articles: Vec<CleanArticle>,
    scorer: &dyn SentimentScorer,
    topics: &dyn TopicAssigner,
    counts: &mut IngestCounts,
) -> Vec<StoredArticle> {
    let annotated = articles
        .into_par_iter()
        .map(|article| StoredArticle {
            sentiment: scorer.polarity(&article.cleaned_body),
            topic: topics.assign(&article.cleaned_body),
            article_id: article.article_id,
            source: article.source,
            country: article.country,
            region: article.region,
            headline: article.headline,
            cleaned_body: article.cleaned_body,
            date_published: article.date_published,
        })
        .collect::<Vec<StoredArticle>>();

    counts.noise_topic_articles = annotated
        .iter()
        .filter(|article| article.topic == NOISE_TOPIC)
        .count();
    annotated
}
