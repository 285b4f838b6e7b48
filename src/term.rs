use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Category key assigned to terms whose category is absent or unregistered.
pub const DEFAULT_CATEGORY: &str = "custom";

static BUILTIN_JSON: &str = include_str!("../data/builtin_terms.json");

static BUILTIN_TERMS: Lazy<Vec<Term>> =
    Lazy::new(|| serde_json::from_str(BUILTIN_JSON).expect("builtin term list parses"));

/// A glossary entry: an English source phrase, its Japanese rendering, and
/// display metadata. `en` and `ja` are expected to be non-empty; records that
/// violate this are filtered out by [`dictionary_snapshot`] before matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub en: String,
    pub ja: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Incoming term fields before the store assigns an id and normalizes them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermDraft {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ja: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl TermDraft {
    pub fn new(en: impl Into<String>, ja: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ja: ja.into(),
            ..Self::default()
        }
    }
}

/// Display metadata for a term category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub key: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

/// Fixed category registry. The final entry is the fallback for unknown keys.
pub const CATEGORIES: &[CategoryInfo] = &[
    CategoryInfo {
        key: "theory",
        icon: "📖",
        label: "理論",
    },
    CategoryInfo {
        key: "concept",
        icon: "💡",
        label: "概念",
    },
    CategoryInfo {
        key: "security",
        icon: "🛡️",
        label: "安全保障",
    },
    CategoryInfo {
        key: "diplomacy",
        icon: "🤝",
        label: "外交",
    },
    CategoryInfo {
        key: "organization",
        icon: "🏛️",
        label: "国際機構",
    },
    CategoryInfo {
        key: "economy",
        icon: "💹",
        label: "国際政治経済",
    },
    CategoryInfo {
        key: "law",
        icon: "⚖️",
        label: "国際法",
    },
    CategoryInfo {
        key: "custom",
        icon: "📝",
        label: "カスタム",
    },
];

/// Resolves a category key to its display metadata, falling back to the
/// default category for unknown keys.
pub fn category_info(key: &str) -> &'static CategoryInfo {
    CATEGORIES
        .iter()
        .find(|cat| cat.key == key)
        .unwrap_or_else(|| CATEGORIES.last().expect("registry is non-empty"))
}

/// The static built-in term list, parsed once from the embedded JSON.
pub fn builtin_terms() -> &'static [Term] {
    &BUILTIN_TERMS
}

/// Builds the immutable dictionary snapshot the matcher consumes: built-in
/// terms followed by the custom set, dropping records with an empty `en` or
/// `ja`. Uniqueness of `en` across the two sources is the store's concern,
/// not enforced here.
pub fn dictionary_snapshot(custom: &[Term]) -> Vec<Term> {
    builtin_terms()
        .iter()
        .chain(custom.iter())
        .filter(|term| !term.en.trim().is_empty() && !term.ja.trim().is_empty())
        .cloned()
        .collect()
}

/// Parses the line-oriented bulk import format: one record per line, fields
/// `en, ja, category?, note?, reference?`, tab-delimited when the line
/// contains a tab and comma-delimited otherwise. Lines with fewer than two
/// fields are skipped; records with blank `en`/`ja` survive parsing and are
/// counted as skipped by the store's bulk import.
pub fn parse_bulk(input: &str) -> Vec<TermDraft> {
    let mut drafts = Vec::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = if line.contains('\t') {
            line.split('\t').collect()
        } else {
            line.split(',').collect()
        };
        if parts.len() < 2 {
            continue;
        }
        let field = |idx: usize| parts.get(idx).map(|s| s.trim().to_string());
        drafts.push(TermDraft {
            en: field(0).unwrap_or_default(),
            ja: field(1).unwrap_or_default(),
            category: field(2).filter(|s| !s.is_empty()),
            note: field(3),
            reference: field(4),
        });
    }
    drafts
}

/// Serializes terms into the export format: one comma-joined
/// `en, ja, category, note, reference` line per entry.
pub fn export_csv(terms: &[Term]) -> String {
    terms
        .iter()
        .map(|t| {
            format!(
                "{}, {}, {}, {}, {}",
                t.en, t.ja, t.category, t.note, t.reference
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
