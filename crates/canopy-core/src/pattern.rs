//! Mined modification patterns.
//!
//! Patterns are derived data: the temporal engine rebuilds them from
//! its pair counters and they are never mutated individually.

use serde::{Deserialize, Serialize};

/// How the pattern was mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Files changed in the same commit.
    CoModification,

    /// Files changed within a short time window, in order.
    Sequential,
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CoModification => "co-modification",
            Self::Sequential => "sequential",
        };
        write!(f, "{}", s)
    }
}

/// A statistical association between files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationPattern {
    /// Stable id derived from the file pair, e.g. `comod:a.ts::b.ts`.
    pub id: String,
    pub kind: PatternKind,
    pub name: String,
    pub description: String,

    /// How many times the association was observed.
    pub frequency: u32,

    /// Mining confidence in [0, 1].
    pub confidence: f64,

    /// The files involved. Order matters for sequential patterns.
    pub related_files: Vec<String>,
}

impl ModificationPattern {
    /// Whether the pattern involves the given file.
    pub fn mentions(&self, path: &str) -> bool {
        self.related_files.iter().any(|f| f == path)
    }

    /// The files in the pattern other than `path`.
    pub fn counterparts<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a str> {
        let path = path.to_string();
        self.related_files
            .iter()
            .filter(move |f| **f != path)
            .map(|f| f.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(files: &[&str]) -> ModificationPattern {
        ModificationPattern {
            id: "comod:a::b".into(),
            kind: PatternKind::CoModification,
            name: "a + b".into(),
            description: String::new(),
            frequency: 3,
            confidence: 0.3,
            related_files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_mentions_and_counterparts() {
        let p = pattern(&["a.ts", "b.ts"]);
        assert!(p.mentions("a.ts"));
        assert!(!p.mentions("c.ts"));
        let others: Vec<&str> = p.counterparts("a.ts").collect();
        assert_eq!(others, vec!["b.ts"]);
    }
}
