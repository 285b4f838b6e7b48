use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use irgloss::{builtin_terms, dictionary_snapshot, match_terms, render_highlights, summarize};

const PARAGRAPH: &str = "The balance of power remains central to realist thought. \
States facing a security dilemma may pursue deterrence or containment, while \
liberal scholars emphasize collective security, economic interdependence, and \
international organizations. Soft power and public diplomacy complement hard \
power; hegemonic stability theory links order to a dominant state.";

fn sample_text(repeats: usize) -> String {
    let mut text = String::with_capacity(PARAGRAPH.len() * repeats + repeats);
    for _ in 0..repeats {
        text.push_str(PARAGRAPH);
        text.push('\n');
    }
    text
}

fn bench_match_terms(c: &mut Criterion) {
    let dictionary = dictionary_snapshot(&[]);
    for &repeats in &[1usize, 10, 100] {
        let text = sample_text(repeats);
        let label = format!("{}_chars", text.len());
        c.bench_with_input(
            BenchmarkId::new("match_terms", label),
            &text,
            |b, text| {
                b.iter(|| {
                    let matches = match_terms(text, &dictionary);
                    black_box(matches.len());
                });
            },
        );
    }
}

fn bench_summarize(c: &mut Criterion) {
    let dictionary = dictionary_snapshot(&[]);
    let text = sample_text(50);
    let matches = match_terms(&text, &dictionary);
    c.bench_function("summarize", |b| {
        b.iter(|| {
            let unique = summarize(&matches);
            black_box(unique.len());
        });
    });
}

fn bench_render_highlights(c: &mut Criterion) {
    let dictionary = dictionary_snapshot(&[]);
    let text = sample_text(10);
    let matches = match_terms(&text, &dictionary);
    c.bench_function("render_highlights", |b| {
        b.iter(|| {
            let html = render_highlights(&text, &matches);
            black_box(html.len());
        });
    });
}

fn bench_no_matches(c: &mut Criterion) {
    // Worst case for the scan loop: every term probed, nothing found.
    let dictionary = builtin_terms().to_vec();
    let text = "z ".repeat(2_000);
    c.bench_function("match_terms_no_hits", |b| {
        b.iter(|| {
            let matches = match_terms(&text, &dictionary);
            black_box(matches.len());
        });
    });
}

criterion_group!(
    benches,
    bench_match_terms,
    bench_summarize,
    bench_render_highlights,
    bench_no_matches
);
criterion_main!(benches);
