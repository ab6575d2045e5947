use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::parser::record::Record;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            id          INTEGER PRIMARY KEY,
            collection  TEXT NOT NULL,
            url         TEXT NOT NULL,
            document    TEXT NOT NULL,
            inserted_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_products_collection ON products(collection);

        CREATE TABLE IF NOT EXISTS failures (
            id          INTEGER PRIMARY KEY,
            collection  TEXT NOT NULL,
            url         TEXT NOT NULL,
            kind        TEXT NOT NULL CHECK(kind IN ('transport','missing_data')),
            reason      TEXT NOT NULL,
            failed_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_failures_kind ON failures(kind);

        CREATE TABLE IF NOT EXISTS runs (
            id          INTEGER PRIMARY KEY,
            started_at  TEXT NOT NULL,
            finished_at TEXT,
            categories  INTEGER NOT NULL DEFAULT 0,
            stored      INTEGER NOT NULL DEFAULT 0,
            failed      INTEGER NOT NULL DEFAULT 0,
            anomalies   INTEGER NOT NULL DEFAULT 0
        );
        ",
    )?;
    Ok(())
}

// ── Documents ──

/// Append one product document to `collection`.
pub fn insert_product(conn: &Connection, collection: &str, url: &str, record: &Record) -> Result<i64> {
    let document = serde_json::to_string(record)?;
    conn.execute(
        "INSERT INTO products (collection, url, document) VALUES (?1, ?2, ?3)",
        rusqlite::params![collection, url, document],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    MissingData,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::MissingData => "missing_data",
        }
    }
}

pub fn record_failure(
    conn: &Connection,
    collection: &str,
    url: &str,
    kind: FailureKind,
    reason: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO failures (collection, url, kind, reason) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![collection, url, kind.as_str(), reason],
    )?;
    Ok(())
}

// ── Runs ──

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTotals {
    pub categories: usize,
    pub stored: usize,
    pub failed: usize,
    pub anomalies: usize,
}

impl RunTotals {
    pub fn add(&mut self, other: &RunTotals) {
        self.categories += other.categories;
        self.stored += other.stored;
        self.failed += other.failed;
        self.anomalies += other.anomalies;
    }
}

pub fn start_run(conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT INTO runs (started_at) VALUES (?1)",
        rusqlite::params![chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_run(conn: &Connection, run_id: i64, totals: &RunTotals) -> Result<()> {
    conn.execute(
        "UPDATE runs SET finished_at = ?1, categories = ?2, stored = ?3, failed = ?4, anomalies = ?5
         WHERE id = ?6",
        rusqlite::params![
            chrono::Utc::now().to_rfc3339(),
            totals.categories,
            totals.stored,
            totals.failed,
            totals.anomalies,
            run_id,
        ],
    )?;
    Ok(())
}

// ── Stats ──

pub struct RunRow {
    pub started_at: String,
    pub finished_at: Option<String>,
    pub totals: RunTotals,
}

pub struct Stats {
    pub documents: usize,
    pub anomalies: usize,
    pub transport_failures: usize,
    pub missing_data_failures: usize,
    pub collections: Vec<(String, usize)>,
    pub last_run: Option<RunRow>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
    let anomalies: usize = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE json_extract(document, '$.product_path') = 'null'",
        [],
        |r| r.get(0),
    )?;
    let failures_of = |kind: FailureKind| -> rusqlite::Result<usize> {
        conn.query_row(
            "SELECT COUNT(*) FROM failures WHERE kind = ?1",
            [kind.as_str()],
            |r| r.get(0),
        )
    };
    let transport_failures = failures_of(FailureKind::Transport)?;
    let missing_data_failures = failures_of(FailureKind::MissingData)?;

    let mut stmt = conn.prepare(
        "SELECT collection, COUNT(*) FROM products GROUP BY collection ORDER BY collection",
    )?;
    let collections = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT started_at, finished_at, categories, stored, failed, anomalies
         FROM runs ORDER BY id DESC LIMIT 1",
    )?;
    let last_run = stmt
        .query_map([], |row| {
            Ok(RunRow {
                started_at: row.get(0)?,
                finished_at: row.get(1)?,
                totals: RunTotals {
                    categories: row.get(2)?,
                    stored: row.get(3)?,
                    failed: row.get(4)?,
                    anomalies: row.get(5)?,
                },
            })
        })?
        .next()
        .transpose()?;

    Ok(Stats {
        documents,
        anomalies,
        transport_failures,
        missing_data_failures,
        collections,
        last_run,
    })
}

#[cfg(test)]
pub(crate) fn open_in_memory() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::regions::RegionSelectors;
    use crate::parser::Extractor;

    fn record(fixture: &str) -> Record {
        let raw = std::fs::read(format!("tests/fixtures/{}.html", fixture)).unwrap();
        Extractor::new(&RegionSelectors::default()).unwrap().extract(&raw).unwrap()
    }

    #[test]
    fn stored_document_keeps_all_keys() {
        let conn = open_in_memory();
        let id = insert_product(&conn, "mens_jackets", "https://www.rei.com/product/1", &record("jacket")).unwrap();
        let doc: String = conn
            .query_row("SELECT document FROM products WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(json.as_object().unwrap().len(), Record::KEYS.len());
        assert_eq!(json["gender"], "Men's");
    }

    #[test]
    fn stats_count_collections_anomalies_and_failures() {
        let conn = open_in_memory();
        insert_product(&conn, "mens_jackets", "u1", &record("jacket")).unwrap();
        insert_product(&conn, "mens_jackets", "u2", &record("jacket")).unwrap();
        insert_product(&conn, "camp_kitchen", "u3", &record("sparse")).unwrap();
        record_failure(&conn, "camp_kitchen", "u4", FailureKind::Transport, "server answered 503").unwrap();
        record_failure(&conn, "camp_kitchen", "u5", FailureKind::MissingData, "no payload").unwrap();

        let run = start_run(&conn).unwrap();
        let totals = RunTotals { categories: 2, stored: 3, failed: 2, anomalies: 1 };
        finish_run(&conn, run, &totals).unwrap();

        let s = get_stats(&conn).unwrap();
        assert_eq!(s.documents, 3);
        assert_eq!(s.anomalies, 1);
        assert_eq!(s.transport_failures, 1);
        assert_eq!(s.missing_data_failures, 1);
        assert_eq!(
            s.collections,
            [("camp_kitchen".to_string(), 1), ("mens_jackets".to_string(), 2)]
        );
        let last = s.last_run.unwrap();
        assert_eq!(last.totals, totals);
        assert!(last.finished_at.is_some());
    }

    #[test]
    fn totals_add_up() {
        let mut total = RunTotals::default();
        total.add(&RunTotals { categories: 1, stored: 3, failed: 1, anomalies: 0 });
        total.add(&RunTotals { categories: 1, stored: 2, failed: 0, anomalies: 2 });
        assert_eq!(total, RunTotals { categories: 2, stored: 5, failed: 1, anomalies: 2 });
    }

    #[test]
    fn empty_store_has_no_last_run() {
        let s = get_stats(&open_in_memory()).unwrap();
        assert_eq!(s.documents, 0);
        assert!(s.last_run.is_none());
    }
}
