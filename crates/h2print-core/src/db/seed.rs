use std::io::{BufRead, BufReader};
use std::path::Path;

use rusqlite::params;
use serde::Deserialize;
use tracing::info;

use super::types::ImportStats;
use super::{DbError, FingerprintDb};

/// One NDJSON collection entry, as exported by signature-collection runs.
#[derive(Deserialize)]
struct CollectionEntry {
    desc: String,
    h2_hash: String,
    h2_str: Option<String>,
}

impl FingerprintDb {
    /// Import labeled fingerprints from an NDJSON collection file.
    ///
    /// Each line holds one `{"desc": ..., "h2_hash": ..., "h2_str": ...}`
    /// object; blank lines and `#`/`//` comments are ignored, unparsable
    /// lines are counted as skipped.
    pub fn import_collection(&self, path: &Path, source: &str) -> Result<ImportStats, DbError> {
        let file = std::fs::File::open(path)
            .map_err(|e| DbError::SeedError(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);

        let tx = self.conn.unchecked_transaction()?;
        let mut stmt = tx.prepare(
            "INSERT INTO h2_fingerprints
                (hash, application, category, canonical, source)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        let mut imported = 0u64;
        let mut skipped = 0u64;

        for line_result in reader.lines() {
            let line = line_result
                .map_err(|e| DbError::SeedError(format!("read line: {}", e)))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
                continue;
            }
            let entry: CollectionEntry = match serde_json::from_str(line) {
                Ok(e) => e,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            let category = categorize_desc(&entry.desc);

            stmt.execute(params![
                entry.h2_hash,
                entry.desc,
                category,
                entry.h2_str,
                source,
            ])?;
            imported += 1;
        }
        drop(stmt);
        tx.commit()?;

        info!(
            "collection import ({}): {} imported, {} skipped",
            source, imported, skipped
        );
        Ok(ImportStats { imported, skipped })
    }

    /// Insert a single labeled fingerprint with source `manual`.
    pub fn add_manual(
        &self,
        hash: &str,
        application: &str,
        category: Option<&str>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO h2_fingerprints (hash, application, category, source)
             VALUES (?1, ?2, ?3, 'manual')",
            params![hash, application, category],
        )?;
        Ok(())
    }

    /// Clear all fingerprints from a given source.
    pub fn clear_source(&self, source: &str) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM h2_fingerprints WHERE source = ?1", [source])?;
        Ok(())
    }

    /// Count fingerprints grouped by source.
    pub fn stats(&self) -> Result<DbStats, DbError> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM h2_fingerprints", [], |row| {
                row.get(0)
            })?;

        let mut by_source = Vec::new();
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM h2_fingerprints GROUP BY source")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        for row in rows {
            by_source.push(row?);
        }

        Ok(DbStats { total, by_source })
    }
}

pub struct DbStats {
    pub total: i64,
    pub by_source: Vec<(String, i64)>,
}

/// Simple heuristic categorization from collection description strings.
fn categorize_desc(desc: &str) -> Option<String> {
    let lower = desc.to_lowercase();
    if lower.contains("malware")
        || lower.contains("trojan")
        || lower.contains("cobalt")
        || lower.contains("metasploit")
        || lower.contains("empire")
    {
        Some("malware".to_string())
    } else if lower.contains("chrome")
        || lower.contains("firefox")
        || lower.contains("safari")
        || lower.contains("edge")
        || lower.contains("browser")
        || lower.contains("opera")
    {
        Some("browser".to_string())
    } else if lower.contains("curl")
        || lower.contains("wget")
        || lower.contains("python")
        || lower.contains("go http")
        || lower.contains("java")
        || lower.contains("okhttp")
        || lower.contains("nghttp")
        || lower.contains("nmap")
    {
        Some("tool".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FingerprintDb;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn categorize_browsers() {
        assert_eq!(categorize_desc("Chrome 98"), Some("browser".into()));
        assert_eq!(categorize_desc("Firefox 98"), Some("browser".into()));
    }

    #[test]
    fn categorize_tools() {
        assert_eq!(categorize_desc("curl/7.88"), Some("tool".into()));
        assert_eq!(categorize_desc("Python httpx"), Some("tool".into()));
    }

    #[test]
    fn categorize_malware() {
        assert_eq!(
            categorize_desc("CobaltStrike beacon"),
            Some("malware".into())
        );
    }

    #[test]
    fn categorize_unknown() {
        assert_eq!(categorize_desc("Some random app"), None);
    }

    #[test]
    fn import_collection_ndjson() {
        let db = FingerprintDb::open_in_memory().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# labeled signatures").unwrap();
        writeln!(
            file,
            r#"{{"desc":"Chrome 98","h2_hash":"abc123","h2_str":"{{\"frames\": []}}"}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"desc":"curl/7.88","h2_hash":"def456"}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();

        let stats = db.import_collection(file.path(), "collection").unwrap();
        assert_eq!(stats.imported, 2);
        assert_eq!(stats.skipped, 1);

        let matches = db.lookup("abc123").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].application, "Chrome 98");
        assert_eq!(matches[0].category.as_deref(), Some("browser"));
        assert_eq!(matches[0].canonical.as_deref(), Some(r#"{"frames": []}"#));
    }

    #[test]
    fn add_manual_entry_is_found() {
        let db = FingerprintDb::open_in_memory().unwrap();
        db.add_manual("feed01", "httpx", Some("tool")).unwrap();

        let matches = db.lookup("feed01").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source, "manual");
    }

    #[test]
    fn clear_source_removes_entries() {
        let db = FingerprintDb::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO h2_fingerprints (hash, application, source)
                 VALUES ('h1', 'App1', 'collection')",
                [],
            )
            .unwrap();
        db.conn
            .execute(
                "INSERT INTO h2_fingerprints (hash, application, source)
                 VALUES ('h2', 'App2', 'manual')",
                [],
            )
            .unwrap();

        db.clear_source("collection").unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total, 1); // only the manual entry remains
        assert_eq!(stats.by_source, vec![("manual".to_string(), 1)]);
    }
}
