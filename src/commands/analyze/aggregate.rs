use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::bias::Article;
use crate::topics::{TopicName, TopicNames};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct MonthlySentiment {
    pub(super) month: String,
    pub(super) mean_sentiment: f64,
    pub(super) articles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct GroupSentiment {
    pub(super) key: String,
    pub(super) mean_sentiment: f64,
    pub(super) articles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct RegionTopicCount {
    pub(super) region: String,
    pub(super) topic: i64,
    pub(super) topic_name: String,
    pub(super) articles: usize,
}

/// Data behind the sentiment and topic charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct Aggregates {
    pub(super) sentiment_by_month: Vec<MonthlySentiment>,
    pub(super) sentiment_by_region: Vec<GroupSentiment>,
    pub(super) sentiment_by_source: Vec<GroupSentiment>,
    pub(super) topics_by_region: Vec<RegionTopicCount>,
}

#[derive(Default)]
struct Running {
    total: f64,
    count: usize,
}

impl Running {
    fn push(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.total / self.count as f64
    }
}

pub(super) fn aggregate(articles: &[Article], names: &TopicNames) -> Aggregates {
    let mut by_month = BTreeMap::<(i32, u32), Running>::new();
    let mut by_region = BTreeMap::<&str, Running>::new();
    let mut by_source = BTreeMap::<&str, Running>::new();
    let mut region_topics = BTreeMap::<(&str, i64), usize>::new();

    for article in articles {
        let month = (
            article.date_published.year(),
            article.date_published.month(),
        );
        by_month.entry(month).or_default().push(article.sentiment);
        by_region
            .entry(article.region.as_str())
            .or_default()
            .push(article.sentiment);
        by_source
            .entry(article.source.as_str())
            .or_default()
            .push(article.sentiment);
        *region_topics
            .entry((article.region.as_str(), article.topic))
            .or_default() += 1;
    }

    let sentiment_by_month = by_month
        .into_iter()
        .map(|((year, month), running)| MonthlySentiment {
            month: format!("{year:04}-{month:02}"),
            mean_sentiment: running.mean(),
            articles: running.count,
        })
        .collect();

    let sentiment_by_region = to_group_sentiment(by_region);

    let mut sentiment_by_source = to_group_sentiment(by_source);
    sentiment_by_source.sort_by(|left, right| {
        right
            .mean_sentiment
            .total_cmp(&left.mean_sentiment)
            .then_with(|| left.key.cmp(&right.key))
    });

    let topics_by_region = region_topics
        .into_iter()
        .map(|((region, topic), articles)| RegionTopicCount {
            region: region.to_string(),
            topic,
            topic_name: names.resolve(topic).to_string(),
            articles,
        })
        .collect();

    Aggregates {
        sentiment_by_month,
        sentiment_by_region,
        sentiment_by_source,
        topics_by_region,
    }
}

fn to_group_sentiment(groups: BTreeMap<&str, Running>) -> Vec<GroupSentiment> {
    groups
        .into_iter()
        .map(|(key, running)| GroupSentiment {
            key: key.to_string(),
            mean_sentiment: running.mean(),
            articles: running.count,
        })
        .collect()
}

/// Most frequent topic names per source, sources in name order.
pub(super) fn top_topics_per_source(
    articles: &[Article],
    names: &TopicNames,
    limit: usize,
) -> BTreeMap<String, Vec<(TopicName, usize)>> {
    let mut counts = BTreeMap::<&str, BTreeMap<TopicName, usize>>::new();
    for article in articles {
        *counts
            .entry(article.source.as_str())
            .or_default()
            .entry(names.resolve(article.topic))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(source, topics)| {
            let mut ranked = topics.into_iter().collect::<Vec<(TopicName, usize)>>();
            ranked.sort_by(|left, right| {
                right
                    .1
                    .cmp(&left.1)
                    .then_with(|| left.0.to_string().cmp(&right.0.to_string()))
            });
            ranked.truncate(limit);
            (source.to_string(), ranked)
        })
        .collect()
}
