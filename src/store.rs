use parking_lot::RwLock;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::term::{DEFAULT_CATEGORY, Term, TermDraft};

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    /// A term with the same `en` (case-insensitive) already exists.
    Duplicate(String),
    /// No term carries the given id.
    NotFound(String),
    /// `en` or `ja` was blank.
    MissingField(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "store io error: {err}"),
            StoreError::Serde(err) => write!(f, "store serialization error: {err}"),
            StoreError::Duplicate(en) => write!(f, "term {en:?} is already registered"),
            StoreError::NotFound(id) => write!(f, "no term with id {id:?}"),
            StoreError::MissingField(field) => write!(f, "term field {field:?} is required"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        StoreError::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Serde(value)
    }
}

/// Partial update for a stored term. `None` leaves a field untouched;
/// `note`/`reference` accept empty strings so callers can clear them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermPatch {
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub ja: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Result of a bulk import: how many records were appended, how many were
/// skipped (blank required fields or duplicates), and the resulting store
/// size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    terms: Vec<Term>,
}

/// The server-managed custom term list, persisted as a single JSON document.
///
/// Every mutation rewrites the backing file while holding the write lock, so
/// the on-disk state always reflects the last completed operation. Reads hand
/// out snapshot clones; the matcher never sees the lock.
pub struct TermStore {
    inner: RwLock<Vec<Term>>,
    path: Option<PathBuf>,
}

impl TermStore {
    /// Opens the store at `path`, starting empty when the file is missing or
    /// unreadable as the term document.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let terms = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<StoreFile>(&raw).ok())
            .map(|file| file.terms)
            .unwrap_or_default();
        Self {
            inner: RwLock::new(terms),
            path: Some(path),
        }
    }

    /// An in-memory store that never touches the filesystem.
    pub fn ephemeral() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Snapshot clone of the custom term list, in insertion order.
    pub fn terms(&self) -> Vec<Term> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Registers a new custom term. Fields are trimmed; a blank `en`/`ja` or
    /// a case-insensitive duplicate `en` is rejected.
    pub fn add(&self, draft: TermDraft) -> Result<Term, StoreError> {
        let term = normalize(draft)?;
        let mut guard = self.inner.write();
        if guard.iter().any(|t| t.en.eq_ignore_ascii_case(&term.en)) {
            return Err(StoreError::Duplicate(term.en));
        }
        guard.push(term.clone());
        self.persist(&guard)?;
        Ok(term)
    }

    /// Applies a partial update to the term with the given id.
    pub fn update(&self, id: &str, patch: TermPatch) -> Result<Term, StoreError> {
        let mut guard = self.inner.write();
        let term = guard
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(en) = patch.en.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            term.en = en;
        }
        if let Some(ja) = patch.ja.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            term.ja = ja;
        }
        if let Some(category) = patch.category.filter(|v| !v.trim().is_empty()) {
            term.category = category.trim().to_string();
        }
        if let Some(note) = patch.note {
            term.note = note.trim().to_string();
        }
        if let Some(reference) = patch.reference {
            term.reference = reference.trim().to_string();
        }
        let updated = term.clone();
        self.persist(&guard)?;
        Ok(updated)
    }

    /// Removes the term with the given id and returns it.
    pub fn remove(&self, id: &str) -> Result<Term, StoreError> {
        let mut guard = self.inner.write();
        let idx = guard
            .iter()
            .position(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = guard.remove(idx);
        self.persist(&guard)?;
        Ok(removed)
    }

    /// Appends every importable draft, skipping records with blank required
    /// fields and case-insensitive duplicates (including duplicates within
    /// the batch itself).
    pub fn bulk_import(&self, drafts: Vec<TermDraft>) -> Result<ImportOutcome, StoreError> {
        let mut guard = self.inner.write();
        let mut imported = 0;
        let mut skipped = 0;
        for draft in drafts {
            let Ok(term) = normalize(draft) else {
                skipped += 1;
                continue;
            };
            if guard.iter().any(|t| t.en.eq_ignore_ascii_case(&term.en)) {
                skipped += 1;
                continue;
            }
            guard.push(term);
            imported += 1;
        }
        self.persist(&guard)?;
        Ok(ImportOutcome {
            imported,
            skipped,
            total: guard.len(),
        })
    }

    fn persist(&self, terms: &[Term]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = StoreFile {
            terms: terms.to_vec(),
        };
        let body = serde_json::to_vec_pretty(&file)?;
        fs::write(path, body)?;
        Ok(())
    }
}

fn normalize(draft: TermDraft) -> Result<Term, StoreError> {
    let en = draft.en.trim().to_string();
    let ja = draft.ja.trim().to_string();
    if en.is_empty() {
        return Err(StoreError::MissingField("en"));
    }
    if ja.is_empty() {
        return Err(StoreError::MissingField("ja"));
    }
    let category = draft
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    Ok(Term {
        id: Some(generate_term_id()),
        en,
        ja,
        category,
        note: draft.note.map(|n| n.trim().to_string()).unwrap_or_default(),
        reference: draft
            .reference
            .map(|r| r.trim().to_string())
            .unwrap_or_default(),
    })
}

/// Millisecond timestamp plus a short random alphanumeric suffix, mirroring
/// the id shape the term documents have always carried.
fn generate_term_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();
    format!("{millis:x}{}", suffix.to_lowercase())
}
