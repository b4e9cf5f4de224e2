use rusqlite::params;

use super::types::{Classification, H2Match};
use super::{DbError, FingerprintDb};

impl FingerprintDb {
    /// Look up all matches for a given signature hash.
    pub fn lookup(&self, hash: &str) -> Result<Vec<H2Match>, DbError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT application, category, canonical, source
             FROM h2_fingerprints WHERE hash = ?1",
        )?;
        let matches = stmt
            .query_map(params![hash], |row| {
                Ok(H2Match {
                    application: row.get(0)?,
                    category: row.get(1)?,
                    canonical: row.get(2)?,
                    source: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// Look up a hash and derive a best-match summary.
    pub fn classify(&self, hash: &str) -> Result<Classification, DbError> {
        let matches = self.lookup(hash)?;
        let mut classification = Classification {
            matches,
            best_match: None,
        };
        classification.derive_best_match();
        Ok(classification)
    }
}
