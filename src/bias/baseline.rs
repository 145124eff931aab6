use std::collections::HashMap;

use chrono::Datelike;

use super::{Article, BiasRecord};

type BaselineKey<'a> = (&'a str, i64, i32, u32);

fn baseline_key(article: &Article) -> BaselineKey<'_> {
    (
        article.region.as_str(),
        article.topic,
        article.date_published.year(),
        article.date_published.month(),
    )
}

/// Mean sentiment of each article's (region, topic, month) peer group,
/// returned in the same order as `articles`.
///
/// A group with a single member gets that member's own sentiment, so its
/// bias is always zero.
pub fn assign_baselines(articles: &[Article]) -> Vec<f64> {
    let mut groups = HashMap::<BaselineKey<'_>, (f64, usize)>::new();
    for article in articles {
        let entry = groups.entry(baseline_key(article)).or_insert((0.0, 0));
        entry.0 += article.sentiment;
        entry.1 += 1;
    }

    articles
        .iter()
        .map(|article| {
            groups
                .get(&baseline_key(article))
                .map(|(total, count)| total / *count as f64)
                .unwrap_or(f64::NAN)
        })
        .collect()
}

/// Bias records for every article with a defined baseline, plus the number
/// of articles dropped because their baseline or bias was not finite.
pub fn score_bias(articles: &[Article], baselines: &[f64]) -> (Vec<BiasRecord>, usize) {
    let mut records = Vec::with_capacity(articles.len());
    let mut dropped = articles.len().saturating_sub(baselines.len());

    for (article, baseline) in articles.iter().zip(baselines.iter().copied()) {
        let bias = article.sentiment - baseline;
        if !baseline.is_finite() || !bias.is_finite() {
            dropped += 1;
            continue;
        }

        records.push(BiasRecord {
            source: article.source.clone(),
            date_published: article.date_published,
            sentiment: article.sentiment,
            baseline,
            bias,
        });
    }

    (records, dropped)
}
