// src/web/handlers/route_handlers.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::Serialize;
use rocket::State;
use tracing::{info, warn};

use crate::core::database::{Database, JobRepository};
use crate::routing::{RoutePlan, RoutePlanner};
use crate::types::{Job, JobError};
use crate::web::handlers::job_handlers::job_error_response;
use crate::web::types::*;

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct RouteData {
    pub job: Job,
    pub plan: RoutePlan,
}

pub async fn route_to_job_handler(
    request: Json<StandardRequest<RouteRequest>>,
    db: &State<Database>,
    planner: &State<RoutePlanner>,
) -> Result<Json<DataResponse<RouteData>>, ApiError> {
    let conversation_id = request.conversation_id.clone();
    let RouteRequest { from, job_id } = request.into_inner().data;

    if !from.is_valid() {
        return Err(api_error(
            Status::BadRequest,
            "Starting point is out of range",
            "INVALID_COORDINATES",
            &["Latitude must be within ±90 and longitude within ±180"],
        ));
    }

    let job = JobRepository::new(db.pool())
        .find_by_id(&job_id)
        .await
        .map_err(|e| job_error_response(&e))?
        .ok_or_else(|| job_error_response(&JobError::NotFound(job_id.clone()).into()))?;

    let Some(destination) = job.coordinates() else {
        warn!("Job {} has no usable location: {}", job.id, job.location);
        return Err(api_error(
            Status::UnprocessableEntity,
            "This job has no usable location",
            "JOB_LOCATION_UNKNOWN",
            &["Use the job address to find it on the map"],
        ));
    };

    let plan = planner.plan(from, destination).await;
    let message = match &plan {
        RoutePlan::Routed(route) => {
            format!("{} · {}", route.distance_text, route.duration_text)
        }
        RoutePlan::Centered { .. } => "Route unavailable, showing the job location".to_string(),
    };
    info!("Route to job {}: routed={}", job.id, plan.is_routed());

    Ok(Json(DataResponse::success(
        message,
        RouteData { job, plan },
        conversation_id,
    )))
}
