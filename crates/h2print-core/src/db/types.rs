use serde::Serialize;

/// A single fingerprint match from the database.
#[derive(Debug, Clone, Serialize)]
pub struct H2Match {
    pub application: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    pub source: String,
}

/// Classification result for one signature hash.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<H2Match>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_match: Option<String>,
}

impl Classification {
    pub fn empty() -> Self {
        Self {
            matches: vec![],
            best_match: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Derive a single best-match summary string.
    /// Categorized matches win over uncategorized ones.
    pub fn derive_best_match(&mut self) {
        let best = self
            .matches
            .iter()
            .find(|m| m.category.is_some())
            .or_else(|| self.matches.first());

        if let Some(m) = best {
            let mut s = m.application.clone();
            if let Some(cat) = &m.category {
                s.push_str(&format!(" [{}]", cat));
            }
            self.best_match = Some(s);
        }
    }
}

/// Statistics returned by import operations.
pub struct ImportStats {
    pub imported: u64,
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(application: &str, category: Option<&str>) -> H2Match {
        H2Match {
            application: application.to_string(),
            category: category.map(str::to_string),
            canonical: None,
            source: "test".to_string(),
        }
    }

    #[test]
    fn best_match_prefers_categorized_entries() {
        let mut c = Classification {
            matches: vec![m("Mystery App", None), m("Chrome 120", Some("browser"))],
            best_match: None,
        };
        c.derive_best_match();
        assert_eq!(c.best_match.as_deref(), Some("Chrome 120 [browser]"));
    }

    #[test]
    fn best_match_falls_back_to_first() {
        let mut c = Classification {
            matches: vec![m("Some App", None)],
            best_match: None,
        };
        c.derive_best_match();
        assert_eq!(c.best_match.as_deref(), Some("Some App"));
    }

    #[test]
    fn empty_classification_has_no_best_match() {
        let mut c = Classification::empty();
        c.derive_best_match();
        assert!(c.best_match.is_none());
        assert!(c.is_empty());
    }
}
