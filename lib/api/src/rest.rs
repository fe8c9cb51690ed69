use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use teamroute_core::{
    AddressQuery, CatalogResolver, Error, ResolverConfig, SegmentDraft, TeamDraft, TeamResolver,
    UnitDraft,
};
use teamroute_storage::StorageManager;
use tracing::{debug, error, info};

/// Error message of a search that matched no street segment
pub const NO_TEAM_FOUND: &str = "No team found for this address";

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Shared state behind every handler
pub struct AppState {
    storage: Arc<StorageManager>,
    resolver: CatalogResolver<StorageManager>,
}

impl AppState {
    pub fn new(storage: Arc<StorageManager>, config: ResolverConfig) -> Self {
        let resolver = CatalogResolver::with_config(storage.clone(), config);
        Self { storage, resolver }
    }
}

#[derive(Deserialize)]
struct SearchParams {
    street: Option<String>,
    number: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

#[derive(Deserialize)]
struct RecoverRequest {
    checksum: Option<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    units: usize,
    teams: usize,
    segments: usize,
    localities: usize,
}

pub struct RestApi;

impl RestApi {
    /// Bind the HTTP server without running it.
    /// Returns the server handle and the addresses it listens on.
    pub fn bind(
        storage: Arc<StorageManager>,
        config: ResolverConfig,
        addr: impl std::net::ToSocketAddrs,
    ) -> std::io::Result<(Server, Vec<SocketAddr>)> {
        let state = web::Data::new(AppState::new(storage, config));

        let server = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(addr)?;

        let addrs = server.addrs();
        Ok((server.run(), addrs))
    }

    pub async fn start(
        storage: Arc<StorageManager>,
        port: u16,
        config: ResolverConfig,
    ) -> std::io::Result<()> {
        let (server, addrs) = Self::bind(storage, config, ("0.0.0.0", port))?;
        info!("REST API listening on {:?}", addrs);
        server.await
    }
}

/// Register every route. The caller provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest()
            .json(ApiResponse::<()>::failure(format!("Invalid request payload: {}", err)));
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response =
            HttpResponse::BadRequest().json(ApiResponse::<()>::failure("Invalid ID"));
        InternalError::from_response(err, response).into()
    }))
    .route("/health", web::get().to(health))
    // search must be registered before /streets/{id}
    .route("/streets/search", web::get().to(find_team_by_address))
    .route("/streets", web::get().to(list_segments))
    .route("/streets", web::post().to(create_segment))
    .route("/streets/{id}", web::get().to(get_segment))
    .route("/streets/{id}", web::put().to(update_segment))
    .route("/streets/{id}", web::delete().to(delete_segment))
    .route("/ubs", web::get().to(list_units))
    .route("/ubs", web::post().to(create_unit))
    .route("/ubs/{id}", web::get().to(get_unit))
    .route("/ubs/{id}", web::put().to(update_unit))
    .route("/ubs/{id}", web::delete().to(delete_unit))
    .route("/teams", web::get().to(list_teams))
    .route("/teams", web::post().to(create_team))
    .route("/teams/{id}", web::get().to(get_team))
    .route("/teams/{id}", web::put().to(update_team))
    .route("/teams/{id}", web::delete().to(delete_team))
    .route("/snapshots", web::get().to(list_snapshots))
    .route("/snapshots", web::post().to(create_snapshot))
    .route("/snapshots/{name}", web::delete().to(delete_snapshot))
    .route("/snapshots/{name}/recover", web::post().to(recover_snapshot));
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        e if e.is_input_error() => StatusCode::BAD_REQUEST,
        Error::TeamHasSegments(_) | Error::UnitHasTeams(_) => StatusCode::BAD_REQUEST,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: Error) -> HttpResponse {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    let message = match err {
        Error::InvalidInput(message) => message,
        other => other.to_string(),
    };
    HttpResponse::build(status).json(ApiResponse::<()>::failure(message))
}

fn respond<T: Serialize>(status: StatusCode, result: teamroute_core::Result<T>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::build(status).json(ApiResponse::ok(data)),
        Err(e) => error_response(e),
    }
}

async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let catalog = state.storage.catalog();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(Health {
        status: "ok",
        units: catalog.units().len(),
        teams: catalog.teams().len(),
        segments: catalog.segment_count(),
        localities: catalog.locality_count(),
    })))
}

async fn find_team_by_address(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> ActixResult<HttpResponse> {
    let params = params.into_inner();
    let query = match AddressQuery::parse(
        params.street.as_deref().unwrap_or_default(),
        params.number.as_deref().unwrap_or_default(),
        params.city.as_deref().unwrap_or_default(),
        params.state.as_deref().unwrap_or_default(),
    ) {
        Ok(q) => q,
        Err(e) => return Ok(error_response(e)),
    };

    match state.resolver.resolve_address(&query).await {
        Ok(Some(resolution)) => {
            debug!(
                segment_id = resolution.street_segment.id,
                team_id = resolution.team.id,
                score = resolution.score,
                "Address resolved"
            );
            Ok(HttpResponse::Ok().json(ApiResponse::ok(resolution)))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::<()>::failure(NO_TEAM_FOUND))),
        Err(e) => Ok(error_response(e)),
    }
}

// ==================== Units ====================

async fn list_units(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.storage.list_units())))
}

async fn create_unit(
    state: web::Data<AppState>,
    req: web::Json<UnitDraft>,
) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::CREATED, state.storage.create_unit(req.into_inner())))
}

async fn get_unit(state: web::Data<AppState>, path: web::Path<u64>) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::OK, state.storage.get_unit(path.into_inner())))
}

async fn update_unit(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    req: web::Json<UnitDraft>,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        StatusCode::OK,
        state.storage.update_unit(path.into_inner(), req.into_inner()),
    ))
}

async fn delete_unit(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    Ok(respond(StatusCode::OK, state.storage.delete_unit(id).map(|_| id)))
}

// ==================== Teams ====================

async fn list_teams(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.storage.list_teams())))
}

async fn create_team(
    state: web::Data<AppState>,
    req: web::Json<TeamDraft>,
) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::CREATED, state.storage.create_team(req.into_inner())))
}

async fn get_team(state: web::Data<AppState>, path: web::Path<u64>) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::OK, state.storage.get_team(path.into_inner())))
}

async fn update_team(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    req: web::Json<TeamDraft>,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        StatusCode::OK,
        state.storage.update_team(path.into_inner(), req.into_inner()),
    ))
}

async fn delete_team(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    Ok(respond(StatusCode::OK, state.storage.delete_team(id).map(|_| id)))
}

// ==================== Street segments ====================

async fn list_segments(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(state.storage.list_segments())))
}

async fn create_segment(
    state: web::Data<AppState>,
    req: web::Json<SegmentDraft>,
) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::CREATED, state.storage.create_segment(req.into_inner())))
}

async fn get_segment(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::OK, state.storage.get_segment(path.into_inner())))
}

async fn update_segment(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    req: web::Json<SegmentDraft>,
) -> ActixResult<HttpResponse> {
    Ok(respond(
        StatusCode::OK,
        state.storage.update_segment(path.into_inner(), req.into_inner()),
    ))
}

async fn delete_segment(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    Ok(respond(StatusCode::OK, state.storage.delete_segment(id).map(|_| id)))
}

// ==================== Snapshots ====================

async fn list_snapshots(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::OK, state.storage.list_snapshots()))
}

async fn create_snapshot(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(respond(StatusCode::CREATED, state.storage.create_snapshot()))
}

async fn delete_snapshot(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();
    Ok(respond(StatusCode::OK, state.storage.delete_snapshot(&name).map(|_| name)))
}

async fn recover_snapshot(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: Option<web::Json<RecoverRequest>>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();
    let checksum = req.and_then(|r| r.into_inner().checksum);
    Ok(respond(
        StatusCode::OK,
        state
            .storage
            .restore_snapshot(&name, checksum.as_deref())
            .map(|_| name),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use serde_json::{json, Value};

    fn state(dir: &std::path::Path) -> web::Data<AppState> {
        let storage = Arc::new(StorageManager::new(dir).unwrap());
        web::Data::new(AppState::new(storage, ResolverConfig::default()))
    }

    #[actix_web::test]
    async fn test_search_requires_all_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/streets/search?street=Rua%20A&city=Recife&state=PE")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required parameters: street, number, city, state");
    }

    #[actix_web::test]
    async fn test_search_rejects_non_numeric_number() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/streets/search?street=Rua%20A&number=12B&city=Recife&state=PE")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_crud_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/ubs")
            .set_json(json!({
                "name": "UBS Vila Mariana",
                "address": "Rua Domingos de Morais, 100",
                "city": "São Paulo",
                "state": "SP",
                "cep": "04010-100"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let ubs_id = body["data"]["id"].as_u64().unwrap();

        let req = test::TestRequest::post()
            .uri("/teams")
            .set_json(json!({ "name": "Equipe Azul", "ubs_id": ubs_id }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["ubs"]["id"], ubs_id);
        let team_id = body["data"]["id"].as_u64().unwrap();

        let req = test::TestRequest::post()
            .uri("/streets")
            .set_json(json!({
                "street_name": "Rua das Flores",
                "street_type": "R.",
                "neighborhood": "Vila Mariana",
                "city": "São Paulo",
                "state": "SP",
                "start_number": 1,
                "end_number": 999,
                "cep_prefix": "04010",
                "even_odd": "all",
                "team_id": team_id
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["street_name"], "RUA DAS FLORES");
        assert_eq!(body["data"]["street_type"], "RUA");

        let req = test::TestRequest::get()
            .uri("/streets/search?street=Rua%20das%20Fl%C3%B4res&number=42&city=S%C3%A3o%20Paulo&state=SP")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["team"]["name"], "Equipe Azul");
        assert_eq!(body["data"]["ubs"]["id"], ubs_id);

        let req = test::TestRequest::get()
            .uri("/streets/search?street=Rua%20das%20Flores&number=1000&city=S%C3%A3o%20Paulo&state=SP")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], NO_TEAM_FOUND);

        let req = test::TestRequest::delete()
            .uri(&format!("/teams/{}", team_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_invalid_segment_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/streets")
            .set_json(json!({
                "street_name": "Rua das Flores",
                "street_type": "Rua",
                "neighborhood": "Centro",
                "city": "Recife",
                "state": "PE",
                "start_number": 1,
                "end_number": 10,
                "cep_prefix": "",
                "even_odd": "all",
                "team_id": 99
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/streets")
            .set_payload("{not json")
            .insert_header(("content-type", "application/json"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_missing_records_are_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        for uri in ["/ubs/7", "/teams/7", "/streets/7"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::get().uri("/ubs/abc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete()
            .uri("/snapshots/catalog-missing.snapshot")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["segments"], 0);
        assert_eq!(body["data"]["localities"], 0);
    }
}
