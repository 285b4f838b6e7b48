use crate::matcher::TermMatch;
use crate::term::category_info;

/// Escapes the characters with meaning in HTML text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Builds the highlight markup for an annotated text: literal segments are
/// escaped, each match becomes a `term-highlight` span carrying the term
/// fields as data attributes (escaped, so dictionary content cannot inject
/// markup), and newlines become `<br>`.
///
/// `matches` must be the untouched output of
/// [`match_terms`](crate::matcher::match_terms) over the same `text`:
/// non-overlapping and sorted by start.
pub fn render_highlights(text: &str, matches: &[TermMatch<'_>]) -> String {
    let mut html = String::with_capacity(text.len() + matches.len() * 160);
    let mut last_end = 0;
    for m in matches {
        if m.start > last_end {
            html.push_str(&escape_html(&text[last_end..m.start]));
        }
        let cat = category_info(&m.term.category);
        html.push_str(&format!(
            r#"<span class="term-highlight" data-category="{category}" data-en="{en}" data-ja="{ja}" data-note="{note}" data-reference="{reference}" data-cat-label="{cat_label}">{original}</span>"#,
            category = escape_html(&m.term.category),
            en = escape_html(&m.term.en),
            ja = escape_html(&m.term.ja),
            note = escape_html(&m.term.note),
            reference = escape_html(&m.term.reference),
            cat_label = escape_html(cat.label),
            original = escape_html(m.original),
        ));
        last_end = m.end;
    }
    if last_end < text.len() {
        html.push_str(&escape_html(&text[last_end..]));
    }
    html.replace('\n', "<br>")
}
