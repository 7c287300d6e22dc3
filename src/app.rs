#![cfg(feature = "web")]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path as AxumPath, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::columns::ColumnMap;
use crate::dashboard;
use crate::export;
use crate::ingest;
use crate::login::{self, Role, UserStore, validate_session};
use crate::record::{CapabilityRecord, Division, display_contact};
use crate::search::{
    DEFAULT_SEARCH_FIELDS, EmptyQueryPolicy, SearchField, SearchFilter, filter_records,
    group_by_domain,
};
use crate::state::{Action, Page, ViewState, reduce};
use crate::store::{FeedbackStore, RecordPatch, RecordStore, StoredRecord};

/// Shared application state behind the router
pub struct AppState {
    /// The capability record table
    pub store: Mutex<RecordStore>,

    /// The independent feedback table
    pub feedback: FeedbackStore,

    /// Provisioned credential/role list
    pub users: UserStore,

    /// Current interactive view state, replaced wholesale per interaction
    pub view: Mutex<ViewState>,

    /// Column mapping for uploaded workbooks
    pub map: ColumnMap,

    /// Fields the text query matches against
    pub fields: Vec<SearchField>,

    /// Empty-query behavior for the interactive search
    pub policy: EmptyQueryPolicy,
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    domains: Option<String>,
    has_sme: Option<bool>,
}

#[derive(Deserialize)]
struct ExportParams {
    format: Option<String>,
    q: Option<String>,
    domains: Option<String>,
    has_sme: Option<bool>,
}

#[derive(Deserialize)]
struct NavigateParams {
    page: Page,
}

#[derive(Deserialize)]
struct FeedbackForm {
    name: String,
    email: String,
    rating: u8,
    comments: String,
}

/// Start the web application
///
/// Opens every table under the database directory, optionally seeds the
/// record set from a workbook when the store is empty, and serves the router
/// until shutdown.
///
/// An admin account can be provisioned on first start through the
/// `CAPSEARCH_ADMIN_USER` / `CAPSEARCH_ADMIN_PASSWORD` environment
/// variables; credentials never live in source. `CAPSEARCH_EMPTY_QUERY=all`
/// switches the empty-search behavior from "show nothing" to "show all".
///
/// # Arguments
/// * `addr` - Address to bind, e.g. "127.0.0.1:3000"
/// * `database_dir` - Directory holding the persisted tables
/// * `workbook` - Optional capability workbook to ingest when the store is empty
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
pub async fn run(
    addr: &str,
    database_dir: &str,
    workbook: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = UserStore::open(database_dir)?;
    seed_admin_from_env(&users)?;

    let store = RecordStore::open(database_dir)?;
    let feedback = FeedbackStore::open(database_dir)?;
    let map = ColumnMap::current_revision();

    // Seed the record set on first start
    if store.read_all()?.is_empty() {
        if let Some(path) = workbook {
            let records = ingest::ingest_file(path, &map)?;
            let count = store.replace_all(records)?;
            log::info!("Seeded {} records from {}", count, path.display());
        } else {
            log::warn!("Record store is empty and no workbook was given");
        }
    }

    let policy = match std::env::var("CAPSEARCH_EMPTY_QUERY").as_deref() {
        Ok("all") => EmptyQueryPolicy::ShowAll,
        _ => EmptyQueryPolicy::ShowNothing,
    };

    let app_state = Arc::new(AppState {
        store: Mutex::new(store),
        feedback,
        users,
        view: Mutex::new(ViewState::initial()),
        map,
        fields: DEFAULT_SEARCH_FIELDS.to_vec(),
        policy,
    });

    let app = Router::new()
        .route("/", get(serve_landing))
        .route("/login", get(login::serve_login_page))
        .route("/app", get(serve_app))
        .route("/api/login", post(login::handle_login))
        .route("/api/logout", post(login::handle_logout))
        .route("/api/search", get(search))
        .route("/api/navigate", post(navigate))
        .route("/api/records/:id", get(get_record).post(update_record))
        .route("/api/ingest", post(ingest_workbook))
        .route("/api/contacts", post(contacts_listing))
        .route("/api/export", get(export_records))
        .route("/api/feedback", get(list_feedback).post(submit_feedback))
        .route("/api/dashboard", get(dashboard_counts))
        .route("/api/dashboard/domains.png", get(domain_chart))
        .route("/api/dashboard/divisions.png", get(division_chart))
        .with_state(app_state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Provision the initial admin account from the environment, if configured
fn seed_admin_from_env(users: &UserStore) -> Result<(), String> {
    if !users.is_empty()? {
        return Ok(());
    }

    let username = std::env::var("CAPSEARCH_ADMIN_USER").unwrap_or_default();
    let password = std::env::var("CAPSEARCH_ADMIN_PASSWORD").unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        log::warn!("No users provisioned; set CAPSEARCH_ADMIN_USER and CAPSEARCH_ADMIN_PASSWORD");
        return Ok(());
    }

    users.register_user(&username, "", &password, Role::Admin)?;
    log::info!("Provisioned admin user '{}'", username);
    Ok(())
}

async fn serve_landing() -> Html<&'static str> {
    Html(include_str!("./static/landing.html"))
}

async fn serve_app(jar: CookieJar) -> Response {
    if session_from(&jar).is_none() {
        return Redirect::to("/login").into_response();
    }

    Html(include_str!("./static/app.html")).into_response()
}

/// Session attached to the request cookie, if any
fn session_from(jar: &CookieJar) -> Option<(String, Role)> {
    jar.get("session")
        .and_then(|cookie| validate_session(cookie.value()))
}

/// Reject the request unless it carries a valid session
fn require_session(jar: &CookieJar) -> Result<(String, Role), Response> {
    session_from(jar).ok_or_else(|| (StatusCode::UNAUTHORIZED, "Not logged in").into_response())
}

/// Reject the request unless it carries a valid session with edit capability
fn require_editor(jar: &CookieJar) -> Result<String, Response> {
    let (user, role) = require_session(jar)?;
    if !role.can_edit() {
        return Err((StatusCode::FORBIDDEN, "Not permitted").into_response());
    }
    Ok(user)
}

/// JSON error body in the shape used across the API
fn error_json(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "status": "error", "message": message })),
    )
        .into_response()
}

/// Shape one record for display
///
/// Contact fields are rendered with the "TBC" placeholder for blanks; the
/// headline falls back from skill to competency the way the search page
/// displays it.
fn record_json(stored: &StoredRecord) -> serde_json::Value {
    let record = &stored.record;

    let mut contacts = serde_json::Map::new();
    for division in Division::ALL {
        contacts.insert(
            division.label().to_string(),
            serde_json::Value::String(display_contact(record.division_sme(division)).to_string()),
        );
    }

    let headline = if record.skill.trim().is_empty() {
        &record.competency
    } else {
        &record.skill
    };

    serde_json::json!({
        "id": stored.id,
        "domain": record.domain,
        "headline": headline,
        "skill": record.skill,
        "competency": record.competency,
        "description": record.description,
        "capability_group": record.capability_group,
        "group_capability": record.group_capability,
        "global_sme": display_contact(&record.global_sme),
        "division_smes": contacts,
        "has_sme": record.has_global_sme(),
    })
}

/// Apply the request's search parameters to the view state via the reducer
fn advance_view(state: &AppState, params: &SearchParams) -> ViewState {
    let mut view = state.view.lock().unwrap();
    let mut next = view.clone();

    if let Some(q) = &params.q {
        next = reduce(&next, Action::SetQuery(q.clone()));
    }
    if let Some(domains) = &params.domains {
        let list: Vec<String> = domains
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        next = reduce(&next, Action::SetDomains(list));
    }
    if let Some(has_sme) = params.has_sme {
        next = reduce(&next, Action::SetRequireSme(has_sme));
    }

    *view = next.clone();
    next
}

async fn search(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<SearchParams>,
) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let view = advance_view(&state, &params);

    let records = match state.store.lock().unwrap().read_all() {
        Ok(records) => records,
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    let matches = filter_records(&records, &view.filter(), &state.fields, state.policy);
    let groups = group_by_domain(&matches);

    let group_json: Vec<serde_json::Value> = groups
        .iter()
        .map(|group| {
            serde_json::json!({
                "domain": group.domain,
                "records": group.records.iter().map(|r| record_json(r)).collect::<Vec<_>>(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "total": matches.len(),
        "query": view.query,
        "groups": group_json,
    }))
    .into_response()
}

async fn navigate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<NavigateParams>,
) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let mut view = state.view.lock().unwrap();
    let next = reduce(&view, Action::Navigate(params.page));
    *view = next;

    Json(serde_json::json!({ "status": "ok", "page": params.page })).into_response()
}

async fn get_record(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<u64>,
) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    match state.store.lock().unwrap().get(id) {
        Ok(Some(stored)) => Json(record_json(&stored)).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, &format!("No record with id {}", id)),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AxumPath(id): AxumPath<u64>,
    Json(patch): Json<RecordPatch>,
) -> Response {
    if let Err(response) = require_editor(&jar) {
        return response;
    }

    match state.store.lock().unwrap().update(id, &patch) {
        Ok(stored) => {
            log::info!("Record {} updated", id);
            Json(record_json(&stored)).into_response()
        }
        Err(e) => error_json(StatusCode::NOT_FOUND, &e),
    }
}

async fn ingest_workbook(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = require_editor(&jar) {
        return response;
    }

    let file_data = match read_upload(&mut multipart, "workbook").await {
        Some(data) => data,
        None => return error_json(StatusCode::BAD_REQUEST, "No file data received"),
    };

    let records: Vec<CapabilityRecord> = match ingest::ingest_bytes(&file_data, &state.map) {
        Ok(records) => records,
        Err(e) => {
            return error_json(
                StatusCode::BAD_REQUEST,
                &format!("Failed to read workbook: {}", e),
            );
        }
    };

    match state.store.lock().unwrap().replace_all(records) {
        Ok(count) => {
            log::info!("Re-ingested {} records", count);
            Json(serde_json::json!({ "status": "ok", "loaded": count })).into_response()
        }
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

async fn contacts_listing(jar: CookieJar, mut multipart: Multipart) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let file_data = match read_upload(&mut multipart, "contacts").await {
        Some(data) => data,
        None => return error_json(StatusCode::BAD_REQUEST, "No file data received"),
    };

    match ingest::parse_contacts(&file_data) {
        Ok(groups) => Json(serde_json::json!({ "groups": groups })).into_response(),
        Err(message) => error_json(StatusCode::BAD_REQUEST, &message),
    }
}

/// Pull one named file field out of a multipart upload
async fn read_upload(multipart: &mut Multipart, field_name: &str) -> Option<Vec<u8>> {
    let mut file_data = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        if field.name().unwrap_or("unknown") == field_name {
            file_data = field.bytes().await.unwrap_or_default().to_vec();
        }
    }

    if file_data.is_empty() {
        None
    } else {
        Some(file_data)
    }
}

async fn export_records(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<ExportParams>,
) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let records = match state.store.lock().unwrap().read_all() {
        Ok(records) => records,
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    // The export defaults to the full set; search params narrow it
    let filter = SearchFilter {
        query: params.q.clone().unwrap_or_default(),
        domains: params
            .domains
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect(),
        require_sme: params.has_sme.unwrap_or(false),
    };
    let subset: Vec<StoredRecord> =
        filter_records(&records, &filter, &state.fields, EmptyQueryPolicy::ShowAll)
            .into_iter()
            .cloned()
            .collect();

    match params.format.as_deref().unwrap_or("csv") {
        "xlsx" => match export::to_xlsx(&subset) {
            Ok(bytes) => download_response(
                Bytes::from(bytes),
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "capabilities.xlsx",
            ),
            Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
        _ => match export::to_csv(&subset) {
            Ok(csv) => download_response(Bytes::from(csv), "text/csv", "capabilities.csv"),
            Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
    }
}

/// Build a downloadable-file response
fn download_response(body: Bytes, content_type: &str, filename: &str) -> Response {
    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(axum::body::Body::from(body))
    {
        Ok(response) => response,
        Err(_) => error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build download"),
    }
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    axum::Form(form): axum::Form<FeedbackForm>,
) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    match state
        .feedback
        .submit(&form.name, &form.email, form.rating, &form.comments)
    {
        Ok(entry) => Json(serde_json::json!({ "status": "ok", "id": entry.id })).into_response(),
        Err(message) => error_json(StatusCode::BAD_REQUEST, &message),
    }
}

async fn list_feedback(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Err(response) = require_editor(&jar) {
        return response;
    }

    match state.feedback.read_all() {
        Ok(entries) => Json(serde_json::json!({ "entries": entries })).into_response(),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

async fn dashboard_counts(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let records = match state.store.lock().unwrap().read_all() {
        Ok(records) => records,
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    Json(serde_json::json!({
        "total": records.len(),
        "domains": dashboard::domain_counts(&records),
        "divisions": dashboard::division_coverage(&records),
    }))
    .into_response()
}

async fn domain_chart(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let records = match state.store.lock().unwrap().read_all() {
        Ok(records) => records,
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    let counts = dashboard::domain_counts(&records);
    let options = dashboard::ChartOptions {
        title: "Records per Domain".to_string(),
        ..Default::default()
    };

    match dashboard::domain_chart_png(&counts, &options) {
        Ok(png) => png_response(png),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn division_chart(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Err(response) = require_session(&jar) {
        return response;
    }

    let records = match state.store.lock().unwrap().read_all() {
        Ok(records) => records,
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e),
    };

    let coverage = dashboard::division_coverage(&records);
    let options = dashboard::ChartOptions {
        title: "SME Coverage per Division".to_string(),
        y_label: "Records with contact".to_string(),
        ..Default::default()
    };

    match dashboard::division_chart_png(&coverage, &options) {
        Ok(png) => png_response(png),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Build an inline PNG response
fn png_response(png: Vec<u8>) -> Response {
    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .body(axum::body::Body::from(Bytes::from(png)))
    {
        Ok(response) => response,
        Err(_) => error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build image"),
    }
}
