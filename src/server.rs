//! HTTP surface: REST CRUD for the design entities, auth, AI search/chat and
//! PDF report downloads.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use time::macros::format_description;
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    ChatRequest, Credentials, HierarchyCreate, HierarchyTypeCreate, HierarchyTypeUpdate,
    HierarchyUpdate, ObjectCreate, ObjectTypeCreate, ObjectTypeUpdate, ObjectUpdate,
    RelationCreate, RelationTypeCreate, RelationTypeUpdate, RelationUpdate, SearchRequest,
};
use crate::error::{ObjectDesignError, Result};
use crate::services::ai::AiService;
use crate::services::{auth, report};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub ai: Option<Arc<AiService>>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ObjectDesignError {
    fn into_response(self) -> Response {
        let status = match &self {
            ObjectDesignError::NotFound(_) => StatusCode::NOT_FOUND,
            ObjectDesignError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            ObjectDesignError::Conflict(_) => StatusCode::CONFLICT,
            ObjectDesignError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

fn require_uuid(value: &str, entity: &str) -> Result<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ObjectDesignError::InvalidFormat(format!("invalid {} id '{}'", entity, value)))
}

fn parse_catalog_id(value: &str, entity: &str) -> Result<i32> {
    value
        .parse()
        .map_err(|_| ObjectDesignError::InvalidFormat(format!("invalid {} id '{}'", entity, value)))
}

fn not_found(entity: &str, id: &str) -> ObjectDesignError {
    ObjectDesignError::NotFound(format!("{} '{}' not found", entity, id))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/objects", get(list_objects).post(create_object))
        .route(
            "/objects/:id",
            get(get_object).put(update_object).delete(delete_object),
        )
        .route("/objects/:id/relations", get(object_relations))
        .route("/objects/:id/hierarchy", get(object_hierarchy))
        .route("/relations", get(list_relations).post(create_relation))
        .route(
            "/relations/:id",
            get(get_relation).put(update_relation).delete(delete_relation),
        )
        .route("/hierarchies", get(list_hierarchies).post(create_hierarchy))
        .route(
            "/hierarchies/:id",
            get(get_hierarchy)
                .put(update_hierarchy)
                .delete(delete_hierarchy),
        )
        .route(
            "/object-types",
            get(list_object_types).post(create_object_type),
        )
        .route(
            "/object-types/:id",
            get(get_object_type)
                .put(update_object_type)
                .delete(delete_object_type),
        )
        .route(
            "/relation-types",
            get(list_relation_types).post(create_relation_type),
        )
        .route(
            "/relation-types/:id",
            get(get_relation_type)
                .put(update_relation_type)
                .delete(delete_relation_type),
        )
        .route(
            "/hierarchy-types",
            get(list_hierarchy_types).post(create_hierarchy_type),
        )
        .route(
            "/hierarchy-types/:id",
            get(get_hierarchy_type)
                .put(update_hierarchy_type)
                .delete(delete_hierarchy_type),
        )
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/search", post(search))
        .route("/chat", post(chat))
        .route("/reports/:report_type", get(download_report))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn list_objects(State(state): State<AppState>) -> Result<Response> {
    let objects = state.store.list_objects().await?;
    Ok(Json(objects).into_response())
}

async fn create_object(
    State(state): State<AppState>,
    Json(payload): Json<ObjectCreate>,
) -> Result<Response> {
    let object = state.store.create_object(payload).await?;
    Ok((StatusCode::CREATED, Json(object)).into_response())
}

async fn get_object(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    require_uuid(&id, "object")?;
    let object = state
        .store
        .get_object(&id)
        .await?
        .ok_or_else(|| not_found("object", &id))?;
    Ok(Json(object).into_response())
}

async fn update_object(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ObjectUpdate>,
) -> Result<Response> {
    require_uuid(&id, "object")?;
    let object = state
        .store
        .update_object(&id, payload)
        .await?
        .ok_or_else(|| not_found("object", &id))?;
    Ok(Json(object).into_response())
}

async fn delete_object(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    require_uuid(&id, "object")?;
    if !state.store.delete_object(&id).await? {
        return Err(not_found("object", &id));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn object_relations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    require_uuid(&id, "object")?;
    let relations = state.store.get_object_relations(&id).await?;
    Ok(Json(relations).into_response())
}

async fn object_hierarchy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    require_uuid(&id, "object")?;
    let hierarchies = state.store.get_object_hierarchy(&id).await?;
    Ok(Json(hierarchies).into_response())
}

async fn list_relations(State(state): State<AppState>) -> Result<Response> {
    let relations = state.store.list_relations().await?;
    Ok(Json(relations).into_response())
}

async fn create_relation(
    State(state): State<AppState>,
    Json(payload): Json<RelationCreate>,
) -> Result<Response> {
    require_uuid(&payload.primary_object_id, "object")?;
    let relation = state.store.create_relation(payload).await?;
    Ok((StatusCode::CREATED, Json(relation)).into_response())
}

async fn get_relation(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    require_uuid(&id, "relation")?;
    let relation = state
        .store
        .get_relation(&id)
        .await?
        .ok_or_else(|| not_found("relation", &id))?;
    Ok(Json(relation).into_response())
}

async fn update_relation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RelationUpdate>,
) -> Result<Response> {
    require_uuid(&id, "relation")?;
    let relation = state
        .store
        .update_relation(&id, payload)
        .await?
        .ok_or_else(|| not_found("relation", &id))?;
    Ok(Json(relation).into_response())
}

async fn delete_relation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    require_uuid(&id, "relation")?;
    if !state.store.delete_relation(&id).await? {
        return Err(not_found("relation", &id));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_hierarchies(State(state): State<AppState>) -> Result<Response> {
    let hierarchies = state.store.list_hierarchies().await?;
    Ok(Json(hierarchies).into_response())
}

async fn create_hierarchy(
    State(state): State<AppState>,
    Json(payload): Json<HierarchyCreate>,
) -> Result<Response> {
    let hierarchy = state.store.create_hierarchy(payload).await?;
    Ok((StatusCode::CREATED, Json(hierarchy)).into_response())
}

async fn get_hierarchy(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    require_uuid(&id, "hierarchy")?;
    let hierarchy = state
        .store
        .get_hierarchy(&id)
        .await?
        .ok_or_else(|| not_found("hierarchy", &id))?;
    Ok(Json(hierarchy).into_response())
}

async fn update_hierarchy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<HierarchyUpdate>,
) -> Result<Response> {
    require_uuid(&id, "hierarchy")?;
    let hierarchy = state
        .store
        .update_hierarchy(&id, payload)
        .await?
        .ok_or_else(|| not_found("hierarchy", &id))?;
    Ok(Json(hierarchy).into_response())
}

async fn delete_hierarchy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    require_uuid(&id, "hierarchy")?;
    if !state.store.delete_hierarchy(&id).await? {
        return Err(not_found("hierarchy", &id));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_object_types(State(state): State<AppState>) -> Result<Response> {
    let types = state.store.list_object_types().await?;
    Ok(Json(types).into_response())
}

async fn create_object_type(
    State(state): State<AppState>,
    Json(payload): Json<ObjectTypeCreate>,
) -> Result<Response> {
    let created = state.store.create_object_type(payload).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_object_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "object type")?;
    let found = state
        .store
        .get_object_type(id)
        .await?
        .ok_or_else(|| not_found("object type", &id.to_string()))?;
    Ok(Json(found).into_response())
}

async fn update_object_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ObjectTypeUpdate>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "object type")?;
    let updated = state
        .store
        .update_object_type(id, payload)
        .await?
        .ok_or_else(|| not_found("object type", &id.to_string()))?;
    Ok(Json(updated).into_response())
}

async fn delete_object_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "object type")?;
    if !state.store.delete_object_type(id).await? {
        return Err(not_found("object type", &id.to_string()));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_relation_types(State(state): State<AppState>) -> Result<Response> {
    let types = state.store.list_relation_types().await?;
    Ok(Json(types).into_response())
}

async fn create_relation_type(
    State(state): State<AppState>,
    Json(payload): Json<RelationTypeCreate>,
) -> Result<Response> {
    let created = state.store.create_relation_type(payload).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_relation_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "relation type")?;
    let found = state
        .store
        .get_relation_type(id)
        .await?
        .ok_or_else(|| not_found("relation type", &id.to_string()))?;
    Ok(Json(found).into_response())
}

async fn update_relation_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RelationTypeUpdate>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "relation type")?;
    let updated = state
        .store
        .update_relation_type(id, payload)
        .await?
        .ok_or_else(|| not_found("relation type", &id.to_string()))?;
    Ok(Json(updated).into_response())
}

async fn delete_relation_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "relation type")?;
    if !state.store.delete_relation_type(id).await? {
        return Err(not_found("relation type", &id.to_string()));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_hierarchy_types(State(state): State<AppState>) -> Result<Response> {
    let types = state.store.list_hierarchy_types().await?;
    Ok(Json(types).into_response())
}

async fn create_hierarchy_type(
    State(state): State<AppState>,
    Json(payload): Json<HierarchyTypeCreate>,
) -> Result<Response> {
    let created = state.store.create_hierarchy_type(payload).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_hierarchy_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "hierarchy type")?;
    let found = state
        .store
        .get_hierarchy_type(id)
        .await?
        .ok_or_else(|| not_found("hierarchy type", &id.to_string()))?;
    Ok(Json(found).into_response())
}

async fn update_hierarchy_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<HierarchyTypeUpdate>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "hierarchy type")?;
    let updated = state
        .store
        .update_hierarchy_type(id, payload)
        .await?
        .ok_or_else(|| not_found("hierarchy type", &id.to_string()))?;
    Ok(Json(updated).into_response())
}

async fn delete_hierarchy_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_catalog_id(&id, "hierarchy type")?;
    if !state.store.delete_hierarchy_type(id).await? {
        return Err(not_found("hierarchy type", &id.to_string()));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Response> {
    let user = auth::register(&state.store, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": user,
        })),
    )
        .into_response())
}

async fn login(State(state): State<AppState>, Json(payload): Json<Credentials>) -> Result<Response> {
    let outcome = auth::login(&state.store, payload).await?;
    Ok(Json(outcome).into_response())
}

fn require_ai(state: &AppState) -> Result<Arc<AiService>> {
    state.ai.clone().ok_or_else(|| {
        ObjectDesignError::ServiceUnavailable("AI features require an OpenAI API key".to_string())
    })
}

async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Response> {
    let ai = require_ai(&state)?;
    let response = ai.search_objects(&payload.query, &state.store).await?;
    Ok(Json(response).into_response())
}

async fn chat(State(state): State<AppState>, Json(payload): Json<ChatRequest>) -> Result<Response> {
    let ai = require_ai(&state)?;
    let response = ai
        .chat_with_context(&payload.message, payload.session_id.as_deref(), &state.store)
        .await?;
    Ok(Json(response).into_response())
}

async fn download_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
) -> Result<Response> {
    let report_type: report::ReportType = report_type.parse()?;

    let objects = state.store.list_objects().await?;
    let bytes = match report_type {
        report::ReportType::Objects => report::objects_report(&objects)?,
        report::ReportType::Relations => {
            let relations = state.store.list_relations().await?;
            report::relations_report(&relations, &objects)?
        }
        report::ReportType::Hierarchies => {
            let hierarchies = state.store.list_hierarchies().await?;
            report::hierarchies_report(&hierarchies, &objects)?
        }
        report::ReportType::Full => {
            let relations = state.store.list_relations().await?;
            let hierarchies = state.store.list_hierarchies().await?;
            report::full_report(&objects, &relations, &hierarchies)?
        }
    };

    let label = match report_type {
        report::ReportType::Objects => "objects",
        report::ReportType::Relations => "relations",
        report::ReportType::Hierarchies => "hierarchies",
        report::ReportType::Full => "full",
    };
    let format = format_description!("[year]-[month]-[day]");
    let date = OffsetDateTime::now_utc()
        .format(&format)
        .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
    let filename = format!("object-design-{}-report-{}.pdf", label, date);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let store = Store::new(config.database_path()).await?;
    let ai = config
        .openai
        .as_ref()
        .and_then(|openai| openai.api_key.clone().map(|key| (key, openai)))
        .map(|(key, openai)| {
            Arc::new(AiService::new(
                key,
                openai.model.clone(),
                openai.base_url.clone(),
            ))
        });
    Ok(AppState { store, ai })
}

pub async fn run(config: Config) -> Result<()> {
    run_with_shutdown(config, futures_pending()).await
}

async fn futures_pending() {
    std::future::pending::<()>().await
}

pub async fn run_with_shutdown<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&config).await?;
    let app = build_router(state).layer(cors_layer(&config.cors_origins()));

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ObjectDesignError::Runtime(e.to_string()))?;

    Ok(())
}
