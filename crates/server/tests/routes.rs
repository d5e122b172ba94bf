use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use models::{CityRecord, Entity, StateRecord};
use server::routes::{build_router, AppState};
use storage::{FileStorage, Storage};

fn app(storage: Arc<FileStorage>) -> Router {
    build_router(AppState { storage }, CorsLayer::very_permissive())
}

fn empty_app() -> Router {
    app(Arc::new(FileStorage::new(temp_store())))
}

fn temp_store() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("statedir_routes_{}.json", Uuid::new_v4()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.expect("body").to_bytes();
    (status, String::from_utf8(bytes.to_vec()).expect("utf8 body"))
}

#[tokio::test]
async fn hello_route() {
    let (status, body) = get(empty_app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello from statedir!");
}

#[tokio::test]
async fn health_route() {
    let (status, body) = get(empty_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn c_route_replaces_underscores() {
    let (status, body) = get(empty_app(), "/c/is_fun").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "C is fun");
}

#[tokio::test]
async fn python_route_has_a_default() {
    let (_, body) = get(empty_app(), "/python").await;
    assert_eq!(body, "Python is cool");
    let (_, body) = get(empty_app(), "/python/is_magic").await;
    assert_eq!(body, "Python is magic");
}

#[tokio::test]
async fn number_route_wants_an_integer() {
    let (status, body) = get(empty_app(), "/number/89").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "89 is a number");

    let (status, _) = get(empty_app(), "/number/eighty-nine").await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn parity_route_renders_html() {
    let (status, body) = get(empty_app(), "/number_odd_or_even/6").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Number: 6 is even</h1>"));

    let (_, body) = get(empty_app(), "/number_odd_or_even/7").await;
    assert!(body.contains("7 is odd"));
}

#[tokio::test]
async fn states_page_lists_names_ascending() -> Result<(), anyhow::Error> {
    let storage = Arc::new(FileStorage::new(temp_store()));
    for name in ["Texas", "California", "Arizona"] {
        storage.add(Entity::State(StateRecord::new(Some(name.into())))).await?;
    }

    let (status, body) = get(app(storage), "/states").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>States</h1>"));

    let arizona = body.find("Arizona").expect("Arizona rendered");
    let california = body.find("California").expect("California rendered");
    let texas = body.find("Texas").expect("Texas rendered");
    assert!(arizona < california && california < texas);
    Ok(())
}

#[tokio::test]
async fn state_page_lists_its_cities_only() -> Result<(), anyhow::Error> {
    let storage = Arc::new(FileStorage::new(temp_store()));
    let state = StateRecord::new(Some("Arizona".into()));
    let state_id = state.id;
    storage.add(Entity::State(state)).await?;
    storage.add(Entity::City(CityRecord::new(state_id, Some("Phoenix".into())))).await?;
    storage.add(Entity::City(CityRecord::new(Uuid::new_v4(), Some("Denver".into())))).await?;

    let (status, body) = get(app(storage), &format!("/states/{state_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("State: Arizona"));
    assert!(body.contains("Phoenix"));
    assert!(!body.contains("Denver"));
    Ok(())
}

#[tokio::test]
async fn unknown_state_is_404() {
    let (status, _) = get(empty_app(), &format!("/states/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
