// src/web/mod.rs

pub mod handlers;
pub mod identity;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::core::database::Database;
use crate::core::service_client::ServiceClient;
use crate::discovery::Page;
use crate::environment::EnvironmentConfig;
use crate::recommend::{MatchingClient, RecommendationSet};
use crate::routing::{RoutePlanner, RoutingClient};
use crate::types::{Job, JobWithDistance, NewJob};
use anyhow::{Context, Result};
use identity::CallerId;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{
    catchers, get, options, patch, post, routes, Build, Config, FromForm, Request, Response,
    Rocket, State,
};
use std::sync::Arc;
use tracing::info;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/// Matching backend shared by the recommendation routes
pub struct MatcherState(pub Arc<dyn MatchingClient>);

#[derive(FromForm, Debug, Default)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub open_only: Option<bool>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[get("/health")]
pub async fn health(db: &State<Database>) -> Result<Json<TextResponse>, ApiError> {
    handlers::health_handler(db).await
}

#[get("/jobs/nearby?<query..>")]
pub async fn nearby_jobs(
    query: NearbyQuery,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<Page<JobWithDistance>>>, ApiError> {
    handlers::nearby_jobs_handler(query, db, config).await
}

#[get("/jobs/<id>")]
pub async fn get_job(id: &str, db: &State<Database>) -> Result<Json<DataResponse<Job>>, ApiError> {
    handlers::get_job_handler(id, db).await
}

#[post("/jobs", data = "<posting>")]
pub async fn create_job(
    posting: Json<NewJob>,
    caller: CallerId,
    db: &State<Database>,
) -> Result<(Status, Json<DataResponse<Job>>), ApiError> {
    handlers::create_job_handler(posting, caller, db).await
}

#[patch("/jobs/<id>/status", data = "<request>")]
pub async fn update_job_status(
    id: &str,
    request: Json<StatusUpdateRequest>,
    caller: CallerId,
    db: &State<Database>,
) -> Result<Json<DataResponse<Job>>, ApiError> {
    handlers::update_job_status_handler(id, request, caller, db).await
}

#[post("/route", data = "<request>")]
pub async fn route_to_job(
    request: Json<StandardRequest<RouteRequest>>,
    db: &State<Database>,
    planner: &State<RoutePlanner>,
) -> Result<Json<DataResponse<RouteData>>, ApiError> {
    handlers::route_to_job_handler(request, db, planner).await
}

#[post("/recommendations", data = "<request>")]
pub async fn recommend(
    request: Json<StandardRequest<RecommendationRequest>>,
    caller: CallerId,
    db: &State<Database>,
    matcher: &State<MatcherState>,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<RecommendationSet>>, ApiError> {
    handlers::recommend_handler(request, caller, db, matcher, config).await
}

#[get("/recommendations")]
pub async fn cached_recommendations(
    caller: CallerId,
    db: &State<Database>,
    matcher: &State<MatcherState>,
) -> Result<Json<DataResponse<Option<RecommendationSet>>>, ApiError> {
    handlers::cached_recommendations_handler(caller, db, matcher).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

fn caught(error: &str, code: &str, suggestions: &[&str]) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        error.to_string(),
        code.to_string(),
        suggestions.iter().map(|s| s.to_string()).collect(),
        None,
    ))
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    caught(
        "Invalid request format",
        "BAD_REQUEST",
        &[
            "Check your request JSON format",
            "Verify all required fields are present",
        ],
    )
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    caught(
        "Missing or invalid X-User-Id header",
        "UNAUTHORIZED",
        &["Sign in again"],
    )
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    caught("Resource not found", "NOT_FOUND", &["Check the URL"])
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    caught(
        "Request body could not be understood",
        "UNPROCESSABLE_ENTITY",
        &["Check field names and value types"],
    )
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    caught(
        "Internal server error",
        "INTERNAL_ERROR",
        &[
            "Try again in a few moments",
            "Contact support if the problem persists",
        ],
    )
}

pub fn build_rocket(
    db: Database,
    planner: RoutePlanner,
    matcher: Arc<dyn MatchingClient>,
    server_config: ServerConfig,
) -> Rocket<Build> {
    rocket::build()
        .attach(Cors)
        .manage(db)
        .manage(planner)
        .manage(MatcherState(matcher))
        .manage(server_config)
        .register(
            "/api",
            catchers![bad_request, unauthorized, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                health,
                nearby_jobs,
                get_job,
                create_job,
                update_job_status,
                route_to_job,
                recommend,
                cached_recommendations,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: EnvironmentConfig, port: u16) -> Result<()> {
    config.ensure_directories().await?;

    let db = Database::new(&config.database_path).await?;
    let planner = RoutePlanner::new(RoutingClient::new(&config.routing_url)?);
    let matcher: Arc<dyn MatchingClient> = Arc::new(ServiceClient::new(
        &config.matching_url,
        config.matching_api_key.clone(),
    )?);
    let server_config = ServerConfig {
        page_size: config.page_size,
        default_radius: config.default_radius(),
    };

    info!("Starting job discovery API server on port {}", port);
    info!("Database: {}", config.database_path.display());
    info!("Routing service: {}", config.routing_url);
    info!("Matching service: {}", config.matching_url);

    build_rocket(db, planner, matcher, server_config)
        .configure(Config::figment().merge(("port", port)))
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Rocket server failed")?;

    Ok(())
}
