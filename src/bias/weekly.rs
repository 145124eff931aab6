use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;
use serde::Serialize;

use super::BiasRecord;

/// How weeks without any article are represented in the series.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillPolicy {
    #[default]
    Zero,
    CarryForward,
}

impl FillPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::CarryForward => "carry-forward",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPoint {
    pub week_start: NaiveDate,
    pub mean_bias: f64,
    pub articles: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeeklySeries {
    pub points: Vec<WeeklyPoint>,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.mean_bias).collect()
    }

    pub fn week_start_at(&self, index: usize) -> Option<NaiveDate> {
        self.points.get(index).map(|point| point.week_start)
    }
}

/// Monday of the Monday-to-Sunday week containing `date`.
///
/// Weeks are labelled by their first day, not by the closing Sunday, so a
/// changepoint date precedes the Sunday label by six days and an event that
/// starts mid-week is not attributed to that week's shift.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Mean bias per week over the full span of `records`, one point every
/// seven days from the first observed week to the last.
pub fn resample_weekly(records: &[&BiasRecord], fill: FillPolicy) -> WeeklySeries {
    let mut buckets = BTreeMap::<NaiveDate, (f64, usize)>::new();
    for record in records {
        let entry = buckets
            .entry(week_start(record.date_published))
            .or_insert((0.0, 0));
        entry.0 += record.bias;
        entry.1 += 1;
    }

    let (Some(first), Some(last)) = (
        buckets.keys().next().copied(),
        buckets.keys().next_back().copied(),
    ) else {
        return WeeklySeries::default();
    };

    let mut points = Vec::<WeeklyPoint>::new();
    let mut current = first;
    while current <= last {
        let point = match buckets.get(&current) {
            Some((total, count)) => WeeklyPoint {
                week_start: current,
                mean_bias: total / *count as f64,
                articles: *count,
            },
            None => WeeklyPoint {
                week_start: current,
                mean_bias: match fill {
                    FillPolicy::Zero => 0.0,
                    FillPolicy::CarryForward => points
                        .last()
                        .map(|previous| previous.mean_bias)
                        .unwrap_or(0.0),
                },
                articles: 0,
            },
        };
        points.push(point);
        current += Duration::days(7);
    }

    WeeklySeries { points }
}
