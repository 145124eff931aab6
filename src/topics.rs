use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub const NOISE_TOPIC: i64 = -1;

const DEFAULT_TOPICS: &[(i64, &str, &[&str])] = &[
    (
        0,
        "emissions_carbon_policy",
        &["emissions", "carbon", "co", "tax", "cap", "policy", "coal", "greenhouse"],
    ),
    (
        1,
        "extreme_weather_disasters",
        &["storm", "typhoon", "hurricane", "flood", "floods", "drought", "heatwave", "wildfire"],
    ),
    (
        2,
        "energy_renewables",
        &["solar", "wind", "renewable", "energy", "electricity", "grid", "nuclear", "battery"],
    ),
    (
        3,
        "negotiations_summits",
        &["summit", "cop", "negotiators", "agreement", "treaty", "delegates", "pledge", "paris"],
    ),
    (
        4,
        "science_research",
        &["scientists", "study", "research", "researchers", "model", "data", "ipcc", "temperature"],
    ),
    (
        5,
        "oceans_ice",
        &["ocean", "sea", "ice", "arctic", "glacier", "coral", "antarctic", "melting"],
    ),
];

pub trait TopicAssigner: Send + Sync {
    /// Topic id for `text`, or `NOISE_TOPIC` when nothing fits.
    fn assign(&self, text: &str) -> i64;

    fn label(&self, topic: i64) -> Option<String>;
}

#[derive(Debug, Clone)]
struct KeywordTopic {
    id: i64,
    label: String,
    keywords: HashSet<String>,
}

/// Assigns the topic whose keyword set has the most token hits; ties go to
/// the lower id and zero hits is noise.
#[derive(Debug, Clone)]
pub struct KeywordTopicModel {
    topics: Vec<KeywordTopic>,
}

impl Default for KeywordTopicModel {
    fn default() -> Self {
        let topics = DEFAULT_TOPICS
            .iter()
            .map(|(id, label, keywords)| KeywordTopic {
                id: *id,
                label: (*label).to_string(),
                keywords: keywords.iter().map(|word| (*word).to_string()).collect(),
            })
            .collect();
        Self { topics }
    }
}

impl TopicAssigner for KeywordTopicModel {
    fn assign(&self, text: &str) -> i64 {
        let mut best = (NOISE_TOPIC, 0_usize);
        for topic in &self.topics {
            let hits = text
                .split_whitespace()
                .filter(|token| topic.keywords.contains(*token))
                .count();
            if hits > best.1 || (hits == best.1 && hits > 0 && topic.id < best.0) {
                best = (topic.id, hits);
            }
        }
        best.0
    }

    fn label(&self, topic: i64) -> Option<String> {
        self.topics
            .iter()
            .find(|candidate| candidate.id == topic)
            .map(|candidate| format!("{}_{}", candidate.id, candidate.label))
    }
}

/// One row of the topic info table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub topic: i64,
    pub name: String,
    pub count: usize,
}

/// Topic info rows for every non-noise topic that has at least one article,
/// ordered by descending count then id.
pub fn summarize_topics(assigner: &dyn TopicAssigner, assignments: &[i64]) -> Vec<TopicInfo> {
    let mut counts = BTreeMap::<i64, usize>::new();
    for topic in assignments {
        *counts.entry(*topic).or_default() += 1;
    }

    let mut rows = counts
        .into_iter()
        .filter(|(topic, _)| *topic != NOISE_TOPIC)
        .filter_map(|(topic, count)| {
            assigner.label(topic).map(|name| TopicInfo { topic, name, count })
        })
        .collect::<Vec<TopicInfo>>();
    rows.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.topic.cmp(&right.topic))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicName {
    Named(String),
    Unnamed(i64),
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Unnamed(topic) => write!(f, "Topic {topic}"),
        }
    }
}

/// Topic id → name lookup built once from the topic info table.
#[derive(Debug, Clone, Default)]
pub struct TopicNames {
    names: BTreeMap<i64, String>,
}

impl TopicNames {
    pub fn from_info(rows: &[TopicInfo]) -> Self {
        Self {
            names: rows
                .iter()
                .map(|row| (row.topic, row.name.clone()))
                .collect(),
        }
    }

    pub fn resolve(&self, topic: i64) -> TopicName {
        match self.names.get(&topic) {
            Some(name) => TopicName::Named(name.clone()),
            None => TopicName::Unnamed(topic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_picks_topic_with_most_keyword_hits() {
        let model = KeywordTopicModel::default();
        assert_eq!(
            model.assign("typhoon haiyan brought storm surge and floods to the coast"),
            1
        );
        assert_eq!(
            model.assign("solar and wind power fed the grid as carbon fell"),
            2
        );
    }

    #[test]
    fn assign_breaks_ties_toward_lower_topic_id() {
        let model = KeywordTopicModel::default();
        assert_eq!(model.assign("carbon levels and arctic ice"), 5);
        assert_eq!(model.assign("carbon and solar"), 0);
    }

    #[test]
    fn assign_without_hits_is_noise() {
        let model = KeywordTopicModel::default();
        assert_eq!(model.assign("the minister visited a school"), NOISE_TOPIC);
        assert_eq!(model.assign(""), NOISE_TOPIC);
    }

    #[test]
    fn summarize_topics_skips_noise_and_orders_by_count() {
        let model = KeywordTopicModel::default();
        let rows = summarize_topics(&model, &[2, NOISE_TOPIC, 5, 2, NOISE_TOPIC, 0, 5, 2]);
        assert_eq!(
            rows,
            vec![
                TopicInfo {
                    topic: 2,
                    name: "2_energy_renewables".to_string(),
                    count: 3,
                },
                TopicInfo {
                    topic: 5,
                    name: "5_oceans_ice".to_string(),
                    count: 2,
                },
                TopicInfo {
                    topic: 0,
                    name: "0_emissions_carbon_policy".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn topic_names_resolve_unnamed_topics_to_placeholder() {
        let names = TopicNames::from_info(&[TopicInfo {
            topic: 3,
            name: "3_negotiations_summits".to_string(),
            count: 12,
        }]);

        assert_eq!(
            names.resolve(3),
            TopicName::Named("3_negotiations_summits".to_string())
        );
        assert_eq!(names.resolve(NOISE_TOPIC), TopicName::Unnamed(-1));
        assert_eq!(names.resolve(NOISE_TOPIC).to_string(), "Topic -1");
    }
}
