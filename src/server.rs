//! HTTP adapter.
//!
//! The [`localize`] middleware resolves the language of every request from
//! its headers, cookies, query string and url-encoded form body, then stores
//! it as a [`RequestLanguage`] extension for handlers to pick up.

use crate::i18n::{
    Engine, I18nError, LanguageProvider, LanguageSignals, LanguageTag, MessageRequest,
    Negotiator, TranslationRequest,
};
use axum::{
    body::{to_bytes, Body},
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Largest form body read for language negotiation.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Language resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLanguage(pub LanguageTag);

/// Language signals of one HTTP request.
#[derive(Debug, Default)]
pub struct HttpSignals {
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
}

impl HttpSignals {
    /// Collect signals from `request`. The form body is only read when the
    /// negotiator uses it and its declared length is at most
    /// `MAX_FORM_BYTES`; the returned request carries the same body.
    pub async fn collect(request: Request, negotiator: &Negotiator) -> (Request, HttpSignals) {
        let mut signals = HttpSignals {
            headers: request.headers().clone(),
            cookies: parse_cookies(request.headers()),
            query: Query::<HashMap<String, String>>::try_from_uri(request.uri())
                .map(|Query(query)| query)
                .unwrap_or_default(),
            form: HashMap::new(),
        };

        if !negotiator.providers().contains(&LanguageProvider::Form)
            || !is_form(request.headers())
            || !fits_form_limit(request.headers())
        {
            return (request, signals);
        }

        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, MAX_FORM_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read form body for language negotiation: {}", e);
                return (Request::from_parts(parts, Body::empty()), signals);
            }
        };

        if let Ok(probe) = axum::http::Request::builder()
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(bytes.clone()))
        {
            if let Ok(Form(form)) = Form::<HashMap<String, String>>::from_request(probe, &()).await {
                signals.form = form;
            }
        }

        (Request::from_parts(parts, Body::from(bytes)), signals)
    }
}

impl LanguageSignals for HttpSignals {
    fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn query(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn form(&self, name: &str) -> Option<String> {
        self.form.get(name).cloned()
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn fits_form_limit(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok())
        .is_some_and(|length| length <= MAX_FORM_BYTES)
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Resolve the request language and store it as [`RequestLanguage`].
pub async fn localize(State(engine): State<Arc<Engine>>, request: Request, next: Next) -> Response {
    let (mut request, signals) = HttpSignals::collect(request, engine.negotiator()).await;
    let language = engine.resolve_language(&signals);
    debug!("Resolved language '{}' for {}", language, request.uri());
    request.extensions_mut().insert(RequestLanguage(language));
    next.run(request).await
}

/// Routes of the demo server.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/_i18n/metrics", get(metrics))
        .route("/_i18n/languages", get(languages))
        .route("/_i18n/translate", post(translate))
        .route("/:message_id", get(message))
        .route("/:message_id/:name", get(message_with_name))
        .layer(middleware::from_fn_with_state(engine.clone(), localize))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// Plain text labelled with the language the text was rendered from.
fn text_response(engine: &Engine, language: &LanguageTag, text: String) -> Response {
    let rendered = engine.localizer(language).language().to_string();
    ([(header::CONTENT_LANGUAGE, rendered)], text).into_response()
}

#[derive(Debug, Deserialize)]
struct CountParams {
    count: Option<String>,
}

async fn message(
    State(engine): State<Arc<Engine>>,
    Extension(RequestLanguage(language)): Extension<RequestLanguage>,
    Path(message_id): Path<String>,
    Query(params): Query<CountParams>,
) -> Response {
    let request = match params.count {
        Some(count) => TranslationRequest::new(message_id).with_count(count).into(),
        None => MessageRequest::Id(message_id),
    };
    let text = engine.must_translate(&language, request);
    text_response(&engine, &language, text)
}

async fn message_with_name(
    State(engine): State<Arc<Engine>>,
    Extension(RequestLanguage(language)): Extension<RequestLanguage>,
    Path((message_id, name)): Path<(String, String)>,
    Query(params): Query<CountParams>,
) -> Response {
    let mut request = TranslationRequest::new(message_id).with_value("Name", name);
    if let Some(count) = params.count {
        request = request.with_count(count);
    }
    let text = engine.must_translate(&language, request);
    text_response(&engine, &language, text)
}

async fn translate(
    State(engine): State<Arc<Engine>>,
    Extension(RequestLanguage(language)): Extension<RequestLanguage>,
    Json(body): Json<Value>,
) -> Response {
    match engine.translate_value(&language, body) {
        Ok(text) => Json(json!({ "language": language.to_string(), "text": text })).into_response(),
        Err(untranslated) => {
            let status = match untranslated.error {
                I18nError::UnsupportedRequestShape(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::OK,
            };
            let body = json!({
                "language": language.to_string(),
                "text": untranslated.text,
                "error": untranslated.error.to_string(),
            });
            (status, Json(body)).into_response()
        }
    }
}

async fn metrics(State(engine): State<Arc<Engine>>) -> Response {
    Json(engine.metrics().report()).into_response()
}

async fn languages(State(engine): State<Arc<Engine>>) -> Response {
    let languages: Vec<String> = engine.languages().iter().map(ToString::to_string).collect();
    Json(json!({
        "default": engine.default_language().to_string(),
        "languages": languages,
    }))
    .into_response()
}
