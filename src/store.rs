//! SQLite article store shared by ingest, analyze and status.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::bias::{Article, ArticleError};
use crate::topics::TopicInfo;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

/// One fully preprocessed and annotated article ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArticle {
    pub article_id: String,
    pub source: String,
    pub country: String,
    pub region: String,
    pub headline: String,
    pub cleaned_body: String,
    pub date_published: NaiveDate,
    pub sentiment: f64,
    pub topic: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRow {
    pub source: Option<String>,
    pub region: Option<String>,
    pub topic: Option<i64>,
    pub sentiment: Option<f64>,
    pub date_published: Option<String>,
}

impl ArticleRow {
    pub fn into_article(self, row: usize) -> Result<Article, ArticleError> {
        let missing = |field: &'static str| ArticleError::MissingField { row, field };

        let source = self
            .source
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| missing("source"))?;
        let region = self.region.ok_or_else(|| missing("region"))?;
        let topic = self.topic.ok_or_else(|| missing("topic"))?;
        let sentiment = self.sentiment.ok_or_else(|| missing("sentiment"))?;
        let raw_date = self
            .date_published
            .ok_or_else(|| missing("date_published"))?;
        let date_published = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
            .map_err(|_| ArticleError::InvalidDate {
                row,
                value: raw_date.clone(),
            })?;

        Ok(Article {
            source,
            region,
            topic,
            sentiment,
            date_published,
        })
    }
}

pub fn open_read_write(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS articles (
              article_id TEXT PRIMARY KEY,
              source TEXT,
              country TEXT,
              region TEXT,
              headline TEXT,
              cleaned_body TEXT,
              date_published TEXT,
              sentiment REAL,
              topic INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source);

            CREATE TABLE IF NOT EXISTS topics (
              topic INTEGER PRIMARY KEY,
              name TEXT NOT NULL,
              article_count INTEGER NOT NULL
            );
            ",
        )
        .context("failed to create article store schema")?;

    set_metadata(connection, "db_schema_version", DB_SCHEMA_VERSION)?;
    Ok(())
}

pub fn set_metadata(connection: &Connection, key: &str, value: &str) -> Result<()> {
    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES(?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            params![key, value],
        )
        .with_context(|| format!("failed to write metadata key {key}"))?;
    Ok(())
}

pub fn get_metadata(connection: &Connection, key: &str) -> Result<Option<String>> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read metadata key {key}"))
}

/// Replaces the article and topic tables in a single transaction.
pub fn replace_corpus(
    connection: &mut Connection,
    articles: &[StoredArticle],
    topics: &[TopicInfo],
) -> Result<()> {
    let tx = connection
        .transaction()
        .context("failed to start corpus transaction")?;

    tx.execute("DELETE FROM articles", [])?;
    tx.execute("DELETE FROM topics", [])?;

    {
        let mut insert_article = tx.prepare(
            "
            INSERT INTO articles(
              article_id, source, country, region, headline, cleaned_body,
              date_published, sentiment, topic
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )?;
        for article in articles {
            insert_article
                .execute(params![
                    article.article_id,
                    article.source,
                    article.country,
                    article.region,
                    article.headline,
                    article.cleaned_body,
                    article.date_published.format("%Y-%m-%d").to_string(),
                    article.sentiment,
                    article.topic,
                ])
                .with_context(|| format!("failed to insert article {}", article.article_id))?;
        }

        let mut insert_topic = tx.prepare(
            "INSERT INTO topics(topic, name, article_count) VALUES(?1, ?2, ?3)",
        )?;
        for topic in topics {
            insert_topic
                .execute(params![topic.topic, topic.name, topic.count as i64])
                .with_context(|| format!("failed to insert topic {}", topic.topic))?;
        }
    }

    tx.commit().context("failed to commit corpus transaction")?;
    Ok(())
}

/// Loads the analysis view of every stored article. A row with a null
/// required field aborts the load.
pub fn load_articles(connection: &Connection) -> Result<Vec<Article>> {
    let mut statement = connection.prepare(
        "
        SELECT source, region, topic, sentiment, date_published
        FROM articles
        ORDER BY date_published ASC, article_id ASC
        ",
    )?;

    let mut rows = statement.query([])?;
    let mut out = Vec::<Article>::new();
    let mut index = 0_usize;

    while let Some(row) = rows.next()? {
        let raw = ArticleRow {
            source: row.get(0)?,
            region: row.get(1)?,
            topic: row.get(2)?,
            sentiment: row.get(3)?,
            date_published: row.get(4)?,
        };
        out.push(raw.into_article(index)?);
        index += 1;
    }

    Ok(out)
}

pub fn load_topics(connection: &Connection) -> Result<Vec<TopicInfo>> {
    let mut statement = connection.prepare(
        "
        SELECT topic, name, article_count
        FROM topics
        ORDER BY article_count DESC, topic ASC
        ",
    )?;

    let mut rows = statement.query([])?;
    let mut out = Vec::<TopicInfo>::new();
    while let Some(row) = rows.next()? {
        out.push(TopicInfo {
            topic: row.get(0)?,
            name: row.get(1)?,
            count: row.get::<_, i64>(2)? as usize,
        });
    }

    Ok(out)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: &str, source: &str, date: &str, sentiment: f64, topic: i64) -> StoredArticle {
        StoredArticle {
            article_id: id.to_string(),
            source: source.to_string(),
            country: "UK".to_string(),
            region: "Europe".to_string(),
            headline: format!("headline {id}"),
            cleaned_body: format!("body {id}"),
            date_published: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
            sentiment,
            topic,
        }
    }

    fn memory_store() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&connection).expect("schema");
        connection
    }

    #[test]
    fn replace_corpus_round_trips_articles_and_topics() {
        let mut connection = memory_store();
        let articles = vec![
            stored("b", "guardian", "2015-02-01", -0.25, 1),
            stored("a", "bbc", "2015-01-15", 0.5, 3),
        ];
        let topics = vec![TopicInfo {
            topic: 3,
            name: "3_negotiations_summits".to_string(),
            count: 1,
        }];

        replace_corpus(&mut connection, &articles, &topics).expect("store corpus");

        let loaded = load_articles(&connection).expect("load articles");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].source, "bbc");
        assert_eq!(loaded[0].topic, 3);
        assert_eq!(loaded[1].sentiment, -0.25);
        assert_eq!(load_topics(&connection).expect("load topics"), topics);
        assert_eq!(
            get_metadata(&connection, "db_schema_version").expect("metadata"),
            Some(DB_SCHEMA_VERSION.to_string())
        );
    }

    #[test]
    fn replace_corpus_discards_previous_run() {
        let mut connection = memory_store();
        replace_corpus(
            &mut connection,
            &[stored("a", "bbc", "2015-01-15", 0.5, 3)],
            &[],
        )
        .expect("first corpus");
        replace_corpus(
            &mut connection,
            &[stored("z", "dw", "2015-03-15", 0.1, 2)],
            &[],
        )
        .expect("second corpus");

        let loaded = load_articles(&connection).expect("load articles");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].source, "dw");
    }

    #[test]
    fn load_articles_fails_loudly_on_missing_region() {
        let connection = memory_store();
        connection
            .execute(
                "
                INSERT INTO articles(article_id, source, region, topic, sentiment, date_published)
                VALUES('x', 'cnn', NULL, 1, 0.2, '2015-01-01')
                ",
                [],
            )
            .expect("insert row");

        let err = load_articles(&connection).expect_err("missing region must fail");
        let article_err = err
            .downcast_ref::<ArticleError>()
            .expect("typed article error");
        assert_eq!(
            article_err,
            &ArticleError::MissingField {
                row: 0,
                field: "region"
            }
        );
    }

    #[test]
    fn into_article_rejects_unparseable_dates() {
        let row = ArticleRow {
            source: Some("fox".to_string()),
            region: Some("North America".to_string()),
            topic: Some(0),
            sentiment: Some(0.1),
            date_published: Some("yesterday".to_string()),
        };

        assert_eq!(
            row.into_article(7),
            Err(ArticleError::InvalidDate {
                row: 7,
                value: "yesterday".to_string()
            })
        );
    }
}
