use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EVENT_WINDOW_DAYS: i64 = 90;

const BUILTIN_EVENTS: &[(&str, &str, &str)] = &[
    (
        "Syrian Civil War Escalation (Chemical Weapons)",
        "2013-08-21",
        "2013-10-01",
    ),
    (
        "Westgate Shopping Mall Attack, Kenya",
        "2013-09-21",
        "2013-09-24",
    ),
    (
        "Typhoon Haiyan in the Philippines",
        "2013-11-08",
        "2013-11-15",
    ),
    (
        "Euromaidan Revolution in Ukraine",
        "2013-11-21",
        "2014-02-22",
    ),
    (
        "Annexation of Crimea by Russia",
        "2014-02-23",
        "2014-03-19",
    ),
    ("MH370 Disappearance", "2014-03-08", "2014-04-28"),
    (
        "Boko Haram Chibok Kidnapping, Nigeria",
        "2014-04-14",
        "2014-05-01",
    ),
    ("MH17 Shot Down over Ukraine", "2014-07-17", "2014-07-25"),
    (
        "Ebola Outbreak in West Africa (Peak Fear)",
        "2014-08-01",
        "2014-12-31",
    ),
    ("Rise of ISIS in Iraq and Syria", "2014-06-01", "2014-12-31"),
    ("Hong Kong Umbrella Revolution", "2014-09-26", "2014-12-15"),
    ("Charlie Hebdo Attack in Paris", "2015-01-07", "2015-01-14"),
    ("Germanwings Flight 9525 Crash", "2015-03-24", "2015-04-01"),
    ("Nepal Earthquake", "2015-04-25", "2015-05-12"),
    (
        "Greek Debt Crisis (Bailout Referendum)",
        "2015-06-27",
        "2015-07-13",
    ),
    ("Iran Nuclear Deal Agreement", "2015-07-14", "2015-07-20"),
    ("European Migrant Crisis (Peak)", "2015-08-01", "2015-11-30"),
    ("Paris Bataclan Attacks", "2015-11-13", "2015-11-20"),
    ("COP21 Paris Climate Agreement", "2015-11-30", "2015-12-12"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Ordered, read-only list of dated world events.
///
/// Attribution is first-match in declaration order: when the look-ahead
/// windows of several events cover a date, the earliest declared event is
/// returned even if a later one started closer to that date.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCatalog {
    events: Vec<Event>,
    window_days: i64,
}

impl EventCatalog {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            window_days: DEFAULT_EVENT_WINDOW_DAYS,
        }
    }

    pub fn builtin() -> Self {
        let events = BUILTIN_EVENTS
            .iter()
            .map(|(name, start, end)| Event {
                name: (*name).to_string(),
                start_date: NaiveDate::parse_from_str(start, "%Y-%m-%d")
                    .expect("valid built-in event start date"),
                end_date: NaiveDate::parse_from_str(end, "%Y-%m-%d")
                    .expect("valid built-in event end date"),
            })
            .collect();
        Self::new(events)
    }

    /// Reads a JSON array of `{ "name", "start_date", "end_date" }` objects;
    /// array order becomes catalog order.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let events: Vec<Event> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse event catalog {}", path.display()))?;

        for event in &events {
            if event.name.trim().is_empty() {
                bail!("event catalog {} contains an unnamed event", path.display());
            }
            if event.end_date < event.start_date {
                bail!(
                    "event '{}' in {} ends before it starts",
                    event.name,
                    path.display()
                );
            }
        }

        Ok(Self::new(events))
    }

    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// First event whose `[start, start + window]` range contains `date`.
    /// A window reaching past the last representable date is open-ended.
    pub fn correlate(&self, date: NaiveDate) -> Option<&Event> {
        let window = Duration::try_days(self.window_days);
        self.events.iter().find(|event| {
            event.start_date <= date
                && window
                    .and_then(|window| event.start_date.checked_add_signed(window))
                    .is_none_or(|end| date <= end)
        })
    }
}
