use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

use common::types::Health;
use models::{Entity, EntityKind};
use storage::Storage;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn hello() -> &'static str {
    "Hello from statedir!"
}

async fn c_text(Path(text): Path<String>) -> String {
    format!("C {}", text.replace('_', " "))
}

async fn python_default() -> &'static str {
    "Python is cool"
}

async fn python_text(Path(text): Path<String>) -> String {
    format!("Python {}", text.replace('_', " "))
}

async fn number(Path(n): Path<i64>) -> String {
    format!("{n} is a number")
}

async fn number_parity(Path(n): Path<i64>) -> Html<String> {
    let parity = if n % 2 == 0 { "even" } else { "odd" };
    Html(page("statedir", &format!("<h1>Number: {n} is {parity}</h1>")))
}

/// HTML list of every state, ascending by name. Display order is the
/// caller's concern, not the facade's.
async fn states_list(State(app): State<AppState>) -> Result<Html<String>, ApiError> {
    let all = app.storage.all(Some(EntityKind::State)).await?;
    let mut states: Vec<_> = all
        .into_values()
        .filter_map(|e| match e {
            Entity::State(s) => Some(s),
            _ => None,
        })
        .collect();
    states.sort_by(|a, b| a.display_name().cmp(b.display_name()));

    let items: String = states
        .iter()
        .map(|s| format!("      <li>{}: <b>{}</b></li>\n", s.id, escape(s.display_name())))
        .collect();
    Ok(Html(page(
        "States",
        &format!("    <h1>States</h1>\n    <ul>\n{items}    </ul>"),
    )))
}

/// One state and its cities, ascending by city name. 404 for an unknown id.
async fn state_detail(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    let states = app.storage.all(Some(EntityKind::State)).await?;
    let Some(Entity::State(state)) = states.get(&format!("State.{id}")).cloned() else {
        return Err(ApiError::not_found("state"));
    };

    let all = app.storage.all(Some(EntityKind::City)).await?;
    let mut cities: Vec<_> = all
        .into_values()
        .filter_map(|e| match e {
            Entity::City(c) if c.state_id == id => Some(c),
            _ => None,
        })
        .collect();
    cities.sort_by(|a, b| a.display_name().cmp(b.display_name()));

    let items: String = cities
        .iter()
        .map(|c| format!("      <li>{}: <b>{}</b></li>\n", c.id, escape(c.display_name())))
        .collect();
    Ok(Html(page(
        "State",
        &format!(
            "    <h1>State: {}</h1>\n    <h3>Cities:</h3>\n    <ul>\n{items}    </ul>",
            escape(state.display_name())
        ),
    )))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <title>{title}</title>\n  </head>\n  <body>\n{body}\n  </body>\n</html>\n"
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Build the full application router around one shared storage facade.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .route("/c/:text", get(c_text))
        .route("/python", get(python_default))
        .route("/python/:text", get(python_text))
        .route("/number/:n", get(number))
        .route("/number_odd_or_even/:n", get(number_parity))
        .route("/states", get(states_list))
        .route("/states/:id", get(state_detail))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
