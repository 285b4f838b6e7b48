use std::error::Error;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use irgloss::{
    Term, TermDraft, TermStore, category_info, dictionary_snapshot, export_csv, match_terms,
    parse_bulk, render_highlights, summarize,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "irgloss", about = "Highlight international-relations terminology", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the custom term store.
    #[arg(long, global = true, default_value = "terms.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect dictionary terms in a text and report their positions.
    Annotate {
        /// File to read; standard input when omitted.
        file: Option<PathBuf>,
        /// Print highlighted HTML markup instead of a match table.
        #[arg(long)]
        html: bool,
    },
    /// Operations on the term dictionary.
    #[command(subcommand)]
    Term(TermCommand),
    /// Run the HTTP server.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used in log output.
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TermCommand {
    /// List dictionary terms, built-in and custom.
    List {
        /// Restrict the listing to one category.
        #[arg(short, long)]
        category: Option<String>,
        /// Case-insensitive substring to match in en, ja, or note.
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a custom term to the store.
    Add {
        en: String,
        ja: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        reference: Option<String>,
    },
    /// Remove a custom term by id.
    Remove { id: String },
    /// Bulk-import terms from a tab- or comma-separated file.
    Import {
        /// File to read; standard input when omitted.
        file: Option<PathBuf>,
    },
    /// Print all terms in the comma-joined export format.
    Export,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Annotate { file, html } => handle_annotate(&cli.store, file, html, cli.json),
        Command::Term(TermCommand::List { category, search }) => {
            handle_list(&cli.store, category, search, cli.json)
        }
        Command::Term(TermCommand::Add {
            en,
            ja,
            category,
            note,
            reference,
        }) => handle_add(&cli.store, en, ja, category, note, reference, cli.json),
        Command::Term(TermCommand::Remove { id }) => handle_remove(&cli.store, id, cli.json),
        Command::Term(TermCommand::Import { file }) => handle_import(&cli.store, file, cli.json),
        Command::Term(TermCommand::Export) => handle_export(&cli.store),
        #[cfg(feature = "web")]
        Command::Serve { addr, base_url } => handle_serve(&cli.store, addr, base_url),
    }
}

fn read_input(file: Option<PathBuf>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn handle_annotate(
    store_path: &PathBuf,
    file: Option<PathBuf>,
    html: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let text = read_input(file)?;
    let store = TermStore::open(store_path);
    let custom = store.terms();
    let dictionary = dictionary_snapshot(&custom);
    let matches = match_terms(&text, &dictionary);
    let unique = summarize(&matches);

    if html {
        println!("{}", render_highlights(&text, &matches));
        return Ok(());
    }
    if as_json {
        let payload = annotate_payload(&text, &matches, &unique);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_match_table(&matches);
    }
    Ok(())
}

/// The same shape the web annotate endpoint returns: match spans, the
/// unique-term summary, the detected count, and the highlight markup.
fn annotate_payload(
    text: &str,
    matches: &[irgloss::TermMatch<'_>],
    unique: &[&Term],
) -> serde_json::Value {
    json!({
        "count": unique.len(),
        "matches": matches.iter().map(|m| {
            json!({
                "start": m.start,
                "end": m.end,
                "en": m.term.en,
                "ja": m.term.ja,
                "category": m.term.category,
                "original": m.original,
            })
        }).collect::<Vec<_>>(),
        "terms": unique,
        "html": render_highlights(text, matches),
    })
}

fn handle_list(
    store_path: &PathBuf,
    category: Option<String>,
    search: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let store = TermStore::open(store_path);
    let custom = store.terms();
    let mut terms = dictionary_snapshot(&custom);
    if let Some(cat) = &category {
        terms.retain(|t| &t.category == cat);
    }
    if let Some(needle) = &search {
        let needle = needle.to_lowercase();
        terms.retain(|t| {
            t.en.to_lowercase().contains(&needle)
                || t.ja.to_lowercase().contains(&needle)
                || t.note.to_lowercase().contains(&needle)
        });
    }
    terms.sort_by(|a, b| a.en.to_lowercase().cmp(&b.en.to_lowercase()));

    if as_json {
        let payload = json!({
            "category": category,
            "search": search,
            "terms": terms,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_term_table(&terms);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_add(
    store_path: &PathBuf,
    en: String,
    ja: String,
    category: Option<String>,
    note: Option<String>,
    reference: Option<String>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let store = TermStore::open(store_path);
    let term = store.add(TermDraft {
        en,
        ja,
        category,
        note,
        reference,
    })?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&term)?);
    } else {
        let id = term.id.as_deref().unwrap_or("-");
        println!("Added \"{}\" → {} ({}) [{}]", term.en, term.ja, term.category, id);
    }
    Ok(())
}

fn handle_remove(store_path: &PathBuf, id: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let store = TermStore::open(store_path);
    let removed = store.remove(&id)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "removed": removed }))?);
    } else {
        println!("Removed \"{}\" ({})", removed.en, id);
    }
    Ok(())
}

fn handle_import(
    store_path: &PathBuf,
    file: Option<PathBuf>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let input = read_input(file)?;
    let drafts = parse_bulk(&input);
    if drafts.is_empty() {
        return Err("No importable lines found; expected tab- or comma-separated en/ja pairs".into());
    }
    let store = TermStore::open(store_path);
    let outcome = store.bulk_import(drafts)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "Imported {} terms ({} skipped), store now holds {}.",
            outcome.imported, outcome.skipped, outcome.total
        );
    }
    Ok(())
}

fn handle_export(store_path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let store = TermStore::open(store_path);
    // Custom terms only, so an export can be re-imported without doubling
    // the built-in dictionary.
    println!("{}", export_csv(&store.terms()));
    Ok(())
}

#[cfg(feature = "web")]
fn handle_serve(
    store_path: &PathBuf,
    addr: std::net::SocketAddr,
    base_url: Option<String>,
) -> Result<(), Box<dyn Error>> {
    use irgloss::web::{WebConfig, init_tracing, serve};

    init_tracing();
    let config = WebConfig {
        addr,
        base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
        store_path: store_path.clone(),
    };
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))?;
    Ok(())
}

fn print_match_table(matches: &[irgloss::TermMatch<'_>]) {
    if matches.is_empty() {
        println!("No dictionary terms detected.");
        return;
    }
    let width = matches
        .iter()
        .map(|m| m.term.en.len())
        .max()
        .unwrap_or(4)
        .max("TERM".len());
    println!("{:<width$}  {:>5}  {:>5}  {}", "TERM", "START", "END", "JA", width = width);
    println!("{:-<width$}  -----  -----  --", "", width = width);
    for m in matches {
        println!(
            "{:<width$}  {:>5}  {:>5}  {}",
            m.term.en,
            m.start,
            m.end,
            m.term.ja,
            width = width
        );
    }
}

fn print_term_table(terms: &[Term]) {
    if terms.is_empty() {
        println!("No terms matched.");
        return;
    }
    let width = terms
        .iter()
        .map(|t| t.en.len())
        .max()
        .unwrap_or(4)
        .max("TERM".len());
    println!("{:<width$}  {:<12}  {}", "TERM", "CATEGORY", "JA", width = width);
    println!("{:-<width$}  ------------  --", "", width = width);
    for term in terms {
        let cat = category_info(&term.category);
        println!(
            "{:<width$}  {:<12}  {}",
            term.en, cat.key, term.ja,
            width = width
        );
    }
}
