pub mod markup;
pub mod matcher;
pub mod store;
pub mod term;
#[cfg(feature = "web")]
pub mod web;

pub use markup::{escape_html, render_highlights};
pub use matcher::{TermMatch, match_terms, summarize};
pub use store::{ImportOutcome, StoreError, TermPatch, TermStore};
pub use term::{
    CATEGORIES, CategoryInfo, DEFAULT_CATEGORY, Term, TermDraft, builtin_terms, category_info,
    dictionary_snapshot, export_csv, parse_bulk,
};
