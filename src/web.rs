use crate::markup::render_highlights;
use crate::matcher::{match_terms, summarize};
use crate::store::{StoreError, TermPatch, TermStore};
use crate::term::{CATEGORIES, Term, TermDraft, category_info, dictionary_snapshot, export_csv};
use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: TermStore,
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
    pub store_path: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
            store_path: PathBuf::from("terms.json"),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

/// Installs the fmt subscriber, honoring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let state = Arc::new(AppState {
        store: TermStore::open(&config.store_path),
    });
    info!(
        custom_terms = state.store.len(),
        store = %config.store_path.display(),
        "Loaded custom term store"
    );
    let router = build_router(state);
    info!(addr = %config.addr, base = %config.base_url, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/annotate", get(annotate_html))
        .route("/dictionary", get(dictionary_html))
        .route("/api/annotate", post(api_annotate))
        .route("/api/terms", get(api_terms_list).post(api_terms_add))
        .route("/api/terms/bulk", post(api_terms_bulk))
        .route("/api/terms/export", get(api_terms_export))
        .route(
            "/api/terms/:id",
            put(api_terms_update).delete(api_terms_remove),
        )
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => ApiError::conflict(err.to_string()),
            StoreError::NotFound(_) => ApiError::not_found(err.to_string()),
            StoreError::MissingField(_) => ApiError::bad_request(err.to_string()),
            StoreError::Io(_) | StoreError::Serde(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "irgloss-web" }))
}

#[derive(Debug, Deserialize)]
struct AnnotateRequest {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatchPayload {
    start: usize,
    end: usize,
    en: String,
    ja: String,
    category: String,
    original: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotatePayload {
    /// Distinct terms detected, unique by lowercased `en`.
    count: usize,
    matches: Vec<MatchPayload>,
    terms: Vec<Term>,
    html: String,
}

impl AnnotatePayload {
    fn build(text: &str, custom: &[Term]) -> Self {
        let snapshot = dictionary_snapshot(custom);
        let matches = match_terms(text, &snapshot);
        let unique: Vec<Term> = summarize(&matches).into_iter().cloned().collect();
        let html = render_highlights(text, &matches);
        let match_payloads = matches
            .iter()
            .map(|m| MatchPayload {
                start: m.start,
                end: m.end,
                en: m.term.en.clone(),
                ja: m.term.ja.clone(),
                category: m.term.category.clone(),
                original: m.original.to_string(),
            })
            .collect();
        Self {
            count: unique.len(),
            matches: match_payloads,
            terms: unique,
            html,
        }
    }
}

async fn api_annotate(
    State(state): State<SharedState>,
    Json(request): Json<AnnotateRequest>,
) -> Json<AnnotatePayload> {
    let custom = state.store.terms();
    Json(AnnotatePayload::build(&request.text, &custom))
}

#[derive(Debug, Serialize, Deserialize)]
struct TermListPayload {
    terms: Vec<Term>,
}

async fn api_terms_list(State(state): State<SharedState>) -> Json<TermListPayload> {
    Json(TermListPayload {
        terms: state.store.terms(),
    })
}

async fn api_terms_add(
    State(state): State<SharedState>,
    Json(draft): Json<TermDraft>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    let term = state.store.add(draft)?;
    Ok((StatusCode::CREATED, Json(term)))
}

async fn api_terms_update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<TermPatch>,
) -> Result<Json<Term>, ApiError> {
    let term = state.store.update(&id, patch)?;
    Ok(Json(term))
}

async fn api_terms_remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.store.remove(&id)?;
    Ok(Json(json!({ "removed": removed })))
}

#[derive(Debug, Deserialize)]
struct BulkRequest {
    terms: Vec<TermDraft>,
}

async fn api_terms_bulk(
    State(state): State<SharedState>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<crate::store::ImportOutcome>, ApiError> {
    if request.terms.is_empty() {
        return Err(ApiError::bad_request("Provide a non-empty `terms` array."));
    }
    let outcome = state.store.bulk_import(request.terms)?;
    Ok(Json(outcome))
}

async fn api_terms_export(State(state): State<SharedState>) -> impl IntoResponse {
    // Only the custom list is exported; re-importing an export must not
    // duplicate built-in entries.
    let csv = export_csv(&state.store.terms());
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv)
}

async fn home(State(state): State<SharedState>) -> impl IntoResponse {
    let template = HomeTemplate {
        builtin_count: crate::term::builtin_terms().len(),
        custom_count: state.store.len(),
        version: env!("CARGO_PKG_VERSION"),
    };
    render_template(template)
}

#[derive(Debug, Deserialize)]
struct AnnotateParams {
    text: Option<String>,
}

struct SummaryCard {
    en: String,
    ja: String,
    reference: String,
    icon: &'static str,
    label: &'static str,
    dictionary_link: String,
}

async fn annotate_html(
    State(state): State<SharedState>,
    Query(params): Query<AnnotateParams>,
) -> impl IntoResponse {
    let text = params.text.unwrap_or_default();
    let payload = if text.trim().is_empty() {
        None
    } else {
        let custom = state.store.terms();
        Some(AnnotatePayload::build(&text, &custom))
    };
    let cards = payload
        .as_ref()
        .map(|p| {
            p.terms
                .iter()
                .map(|term| {
                    let cat = category_info(&term.category);
                    SummaryCard {
                        en: term.en.clone(),
                        ja: term.ja.clone(),
                        reference: term.reference.clone(),
                        icon: cat.icon,
                        label: cat.label,
                        dictionary_link: format!("/dictionary?q={}", encode_component(&term.en)),
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    let template = AnnotateTemplate {
        text,
        payload,
        cards,
    };
    render_template(template)
}

#[derive(Debug, Deserialize)]
struct DictionaryParams {
    category: Option<String>,
    q: Option<String>,
}

struct DictionaryRow {
    term: Term,
    icon: &'static str,
    label: &'static str,
}

struct CategoryLink {
    icon: &'static str,
    label: &'static str,
    href: String,
    active: bool,
}

async fn dictionary_html(
    State(state): State<SharedState>,
    Query(params): Query<DictionaryParams>,
) -> impl IntoResponse {
    let active_category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);

    let custom = state.store.terms();
    let all = dictionary_snapshot(&custom);
    let total = all.len();
    let query_lower = query.as_deref().map(str::to_lowercase);
    let mut filtered: Vec<Term> = all
        .into_iter()
        .filter(|t| {
            active_category
                .as_deref()
                .is_none_or(|cat| t.category == cat)
        })
        .filter(|t| {
            query_lower.as_deref().is_none_or(|q| {
                t.en.to_lowercase().contains(q)
                    || t.ja.to_lowercase().contains(q)
                    || t.note.to_lowercase().contains(q)
                    || t.reference.to_lowercase().contains(q)
            })
        })
        .collect();
    filtered.sort_by(|a, b| a.en.to_lowercase().cmp(&b.en.to_lowercase()));

    let rows = filtered
        .into_iter()
        .map(|term| {
            let cat = category_info(&term.category);
            DictionaryRow {
                icon: cat.icon,
                label: cat.label,
                term,
            }
        })
        .collect::<Vec<_>>();
    let categories = category_links(active_category.as_deref(), query.as_deref());
    let template = DictionaryTemplate {
        shown: rows.len(),
        total,
        query: query.unwrap_or_default(),
        rows,
        categories,
    };
    render_template(template)
}

fn category_links(active: Option<&str>, query: Option<&str>) -> Vec<CategoryLink> {
    let query_suffix = query
        .map(|q| format!("&q={}", encode_component(q)))
        .unwrap_or_default();
    let mut links = vec![CategoryLink {
        icon: "🗂️",
        label: "すべて",
        href: format!("/dictionary?{}", query_suffix.trim_start_matches('&')),
        active: active.is_none(),
    }];
    for cat in CATEGORIES {
        links.push(CategoryLink {
            icon: cat.icon,
            label: cat.label,
            href: format!(
                "/dictionary?category={}{}",
                encode_component(cat.key),
                query_suffix
            ),
            active: active == Some(cat.key),
        });
    }
    links
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn render_template<T: Template>(template: T) -> Html<String> {
    Html(
        template
            .render()
            .unwrap_or_else(|err| format!("<h1>template error</h1><p>{err}</p>")),
    )
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="ja">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>irgloss • IR Terminology Highlighter</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="bg-slate-50 text-slate-900">
    <main class="min-h-screen flex flex-col items-center py-10 px-4">
      <div class="max-w-3xl w-full space-y-6">
        <div>
          <p class="uppercase tracking-wide text-sm text-slate-500">irgloss v{{ version }}</p>
          <h1 class="text-4xl font-extrabold tracking-tight">国際政治学の専門用語をハイライト</h1>
          <p class="text-lg text-slate-600">英語テキストを貼り付けると、辞書に登録された専門用語が検出され、和訳・解説・参照先が付与されます。</p>
        </div>
        <div class="flex flex-wrap gap-3">
          <a href="/annotate" class="inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800 transition-colors">テキストを解析</a>
          <a href="/dictionary" class="inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800 transition-colors">辞書を見る</a>
        </div>
        <p class="text-sm text-slate-500">内蔵 {{ builtin_count }} 語 + カスタム {{ custom_count }} 語</p>
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct HomeTemplate {
    builtin_count: usize,
    custom_count: usize,
    version: &'static str,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="ja">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>irgloss • 用語検出</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    <style>
      .term-highlight { background: #fef08a; border-bottom: 2px solid #ca8a04; border-radius: 2px; cursor: help; }
    </style>
  </head>
  <body class="bg-slate-50 text-slate-900">
    <main class="min-h-screen flex flex-col items-center py-10 px-4">
      <div class="max-w-4xl w-full space-y-6">
        <h1 class="text-2xl font-bold"><a href="/">irgloss</a> / 用語検出</h1>
        <form method="get" action="/annotate" class="space-y-3">
          <textarea name="text" rows="8" class="w-full rounded border border-slate-300 p-3 font-mono text-sm" placeholder="英語テキストを貼り付けてください">{{ text }}</textarea>
          <button type="submit" class="rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800">用語を検出</button>
        </form>
        {% if payload.is_some() %}
        <section>
          <h2 class="text-xl font-semibold mb-2">検出結果（{{ payload.as_ref().unwrap().count }} 用語）</h2>
          {% if payload.as_ref().unwrap().matches.len() == 0 %}
          <p class="text-slate-500">専門用語が検出されませんでした。</p>
          {% else %}
          <div class="bg-white shadow rounded p-4 leading-relaxed">{{ payload.as_ref().unwrap().html|safe }}</div>
          <div class="grid gap-2 md:grid-cols-2 mt-4">
            {% for card in cards %}
            <a href="{{ card.dictionary_link }}" class="block px-3 py-2 bg-white rounded shadow hover:shadow-md transition">
              <p class="font-semibold">{{ card.en }} <span class="text-slate-400">→</span> {{ card.ja }}</p>
              <p class="text-xs text-slate-500">{{ card.icon }} {{ card.label }}{% if card.reference.len() > 0 %} • 📚 {{ card.reference }}{% endif %}</p>
            </a>
            {% endfor %}
          </div>
          {% endif %}
        </section>
        {% endif %}
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct AnnotateTemplate {
    text: String,
    payload: Option<AnnotatePayload>,
    cards: Vec<SummaryCard>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="ja">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>irgloss • 辞書</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="bg-slate-50 text-slate-900">
    <main class="min-h-screen flex flex-col items-center py-10 px-4">
      <div class="max-w-5xl w-full space-y-6">
        <h1 class="text-2xl font-bold"><a href="/">irgloss</a> / 辞書</h1>
        <form method="get" action="/dictionary" class="flex gap-2">
          <input type="text" name="q" value="{{ query }}" placeholder="用語・訳語・解説を検索" class="flex-1 rounded border border-slate-300 px-3 py-2" />
          <button type="submit" class="rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800">検索</button>
        </form>
        <div class="flex flex-wrap gap-2">
          {% for cat in categories %}
          <a href="{{ cat.href }}" class="px-3 py-1 rounded-full text-sm {% if cat.active %}bg-slate-900 text-white{% else %}bg-white text-slate-700 shadow-sm{% endif %}">{{ cat.icon }} {{ cat.label }}</a>
          {% endfor %}
        </div>
        <p class="text-sm text-slate-500">{{ shown }} / {{ total }} 語</p>
        {% if rows.len() == 0 %}
        <p>該当する用語がありません。</p>
        {% else %}
        <div class="bg-white shadow rounded overflow-hidden">
          <table class="min-w-full text-sm">
            <thead class="bg-slate-100 text-left">
              <tr>
                <th class="px-4 py-2">用語</th>
                <th class="px-4 py-2">訳語</th>
                <th class="px-4 py-2">分類</th>
                <th class="px-4 py-2">解説</th>
                <th class="px-4 py-2">参照</th>
              </tr>
            </thead>
            <tbody>
              {% for row in rows %}
              <tr class="border-b border-slate-200">
                <td class="px-4 py-2 font-semibold">{{ row.term.en }}</td>
                <td class="px-4 py-2">{{ row.term.ja }}</td>
                <td class="px-4 py-2 whitespace-nowrap">{{ row.icon }} {{ row.label }}</td>
                <td class="px-4 py-2 text-slate-600">{{ row.term.note }}</td>
                <td class="px-4 py-2 text-slate-500">{% if row.term.reference.len() > 0 %}{{ row.term.reference }}{% else %}—{% endif %}</td>
              </tr>
              {% endfor %}
            </tbody>
          </table>
        </div>
        {% endif %}
      </div>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct DictionaryTemplate {
    shown: usize,
    total: usize,
    query: String,
    rows: Vec<DictionaryRow>,
    categories: Vec<CategoryLink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = TermStore::ephemeral();
        store
            .add(TermDraft {
                en: "quantum diplomacy".into(),
                ja: "量子外交".into(),
                category: Some("diplomacy".into()),
                note: Some("テスト用のカスタム用語".into()),
                reference: None,
            })
            .expect("seed custom term");
        let state = Arc::new(AppState { store });
        build_router(state)
    }

    async fn body_string(response: Response) -> String {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_request(method: &str, uri: &str, payload: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let response = test_router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let text = body_string(response).await;
        assert!(text.contains("\"ok\""));
    }

    #[tokio::test]
    async fn api_annotate_detects_builtin_and_custom_terms() {
        let request = json_request(
            "POST",
            "/api/annotate",
            json!({ "text": "The balance of power shapes quantum diplomacy." }),
        );
        let response = test_router().oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        let payload: AnnotatePayload = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(payload.count, 2);
        let detected: Vec<&str> = payload.matches.iter().map(|m| m.en.as_str()).collect();
        assert_eq!(detected, vec!["balance of power", "quantum diplomacy"]);
        assert!(payload.html.contains("term-highlight"));
    }

    #[tokio::test]
    async fn api_annotate_handles_empty_text() {
        let request = json_request("POST", "/api/annotate", json!({ "text": "" }));
        let response = test_router().oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        let payload: AnnotatePayload = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(payload.count, 0);
        assert!(payload.matches.is_empty());
    }

    #[tokio::test]
    async fn api_terms_crud_round_trip() {
        let router = test_router();

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/terms",
                json!({ "en": "sharp power", "ja": "シャープパワー" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Term = serde_json::from_str(&body_string(response).await).unwrap();
        let id = created.id.expect("id assigned");

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/terms",
                json!({ "en": "Sharp Power", "ja": "重複" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/terms/{id}"),
                json!({ "ja": "シャープ・パワー" }),
            ))
            .await
            .unwrap();
        assert!(response.status().is_success());
        let updated: Term = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(updated.ja, "シャープ・パワー");

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/terms/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());

        let response = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/terms/no-such-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_terms_add_rejects_blank_required_fields() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/terms",
                json!({ "en": "  ", "ja": "訳" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_bulk_import_reports_counts() {
        let response = test_router()
            .oneshot(json_request(
                "POST",
                "/api/terms/bulk",
                json!({ "terms": [
                    { "en": "lawfare", "ja": "法律戦" },
                    { "en": "quantum diplomacy", "ja": "重複" },
                    { "en": "", "ja": "欠落" }
                ] }),
            ))
            .await
            .unwrap();
        assert!(response.status().is_success());
        let outcome: crate::store::ImportOutcome =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.total, 2);
    }

    #[tokio::test]
    async fn api_export_returns_csv() {
        let response = test_router()
            .oneshot(
                Request::get("/api/terms/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/csv"));
        let text = body_string(response).await;
        assert!(text.contains("quantum diplomacy, 量子外交, diplomacy"));
        // Custom terms only; built-in entries must not round-trip into the
        // store through a later import.
        assert!(!text.contains("balance of power"));
    }

    #[tokio::test]
    async fn annotate_page_escapes_input_and_highlights() {
        let response = test_router()
            .oneshot(
                Request::get(
                    "/annotate?text=The%20balance%20of%20power%20%3Cb%3Eendures%3C%2Fb%3E",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_string(response).await;
        assert!(html.contains("term-highlight"));
        assert!(html.contains("勢力均衡"));
        assert!(!html.contains("<b>endures</b>"));
    }

    #[tokio::test]
    async fn dictionary_search_folds_case_in_note_and_ja() {
        let router = test_router();
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/terms",
                json!({
                    "en": "classical realism",
                    "ja": "古典的リアリズム",
                    "note": "Morgenthau に代表される人間性ベースの現実主義。"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Lowercased query must hit the capitalized word in `note`.
        let response = router
            .oneshot(
                Request::get("/dictionary?q=morgenthau")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_string(response).await;
        assert!(html.contains("classical realism"));
    }

    #[tokio::test]
    async fn dictionary_page_filters_by_category() {
        let response = test_router()
            .oneshot(
                Request::get("/dictionary?category=diplomacy")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        let html = body_string(response).await;
        assert!(html.contains("quantum diplomacy"));
        assert!(!html.contains("勢力均衡"));
    }
}
