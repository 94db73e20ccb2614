// src/web/handlers/job_handlers.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

use crate::core::database::{Database, JobRepository};
use crate::discovery::{page_size_or_default, paginate, rank_jobs, JobFilter, Page};
use crate::geo::Coordinates;
use crate::types::{Job, JobError, JobWithDistance, NewJob};
use crate::utils::non_blank;
use crate::web::identity::CallerId;
use crate::web::types::*;
use crate::web::NearbyQuery;

/// Both or neither of lat/lng; anything else is a client error
pub(crate) fn user_location(
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Option<Coordinates>, ApiError> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let coords = Coordinates::new(lat, lng);
            if coords.is_valid() {
                Ok(Some(coords))
            } else {
                Err(api_error(
                    Status::BadRequest,
                    "Coordinates out of range",
                    "INVALID_COORDINATES",
                    &["Latitude must be within ±90 and longitude within ±180"],
                ))
            }
        }
        _ => Err(api_error(
            Status::BadRequest,
            "lat and lng must be provided together",
            "INVALID_COORDINATES",
            &["Send both lat and lng, or neither to list without distances"],
        )),
    }
}

pub(crate) fn job_error_response(e: &anyhow::Error) -> ApiError {
    match e.downcast_ref::<JobError>() {
        Some(JobError::NotFound(id)) => api_error(
            Status::NotFound,
            &format!("Job not found: {}", id),
            "JOB_NOT_FOUND",
            &["Refresh the job list"],
        ),
        Some(JobError::NotOwner(_)) => api_error(
            Status::Forbidden,
            &e.to_string(),
            "NOT_JOB_OWNER",
            &["Only the employer who posted a job can change it"],
        ),
        Some(JobError::InvalidPosting(_)) | Some(JobError::InvalidStatus(_)) => api_error(
            Status::BadRequest,
            &e.to_string(),
            "INVALID_JOB",
            &["Check the title, address and location fields"],
        ),
        None => {
            error!("Job storage failure: {:#}", e);
            api_error(
                Status::InternalServerError,
                "Job storage failure",
                "DATABASE_ERROR",
                &["Try again in a few moments"],
            )
        }
    }
}

pub async fn nearby_jobs_handler(
    query: NearbyQuery,
    db: &State<Database>,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<Page<JobWithDistance>>>, ApiError> {
    let user = user_location(query.lat, query.lng)?;
    let filter = JobFilter {
        location: non_blank(query.location.as_deref()),
        job_type: non_blank(query.job_type.as_deref()),
        open_only: query.open_only.unwrap_or(true),
    };

    let jobs = JobRepository::new(db.pool())
        .list_all()
        .await
        .map_err(|e| job_error_response(&e))?;

    let ranked = rank_jobs(user, jobs, &filter);
    let page_size = page_size_or_default(query.page_size.or(Some(config.page_size)));
    let page = paginate(ranked, query.page.unwrap_or(1), page_size);

    info!(
        "Nearby jobs: user={:?} filter={:?} page {}/{} ({} total)",
        user, filter, page.page, page.total_pages, page.total
    );

    let message = if user.is_some() {
        format!("{} jobs sorted by distance", page.total)
    } else {
        format!("{} jobs (location unknown, not sorted by distance)", page.total)
    };

    Ok(Json(DataResponse::success(message, page, None)))
}

pub async fn get_job_handler(
    id: &str,
    db: &State<Database>,
) -> Result<Json<DataResponse<Job>>, ApiError> {
    let job = JobRepository::new(db.pool())
        .find_by_id(id)
        .await
        .map_err(|e| job_error_response(&e))?
        .ok_or_else(|| job_error_response(&JobError::NotFound(id.to_string()).into()))?;

    Ok(Json(DataResponse::success(
        "Job loaded".to_string(),
        job,
        None,
    )))
}

pub async fn create_job_handler(
    posting: Json<NewJob>,
    caller: CallerId,
    db: &State<Database>,
) -> Result<(Status, Json<DataResponse<Job>>), ApiError> {
    let posting = posting.into_inner();
    info!("Employer {} posting job: {}", caller.as_str(), posting.title);

    let job = JobRepository::new(db.pool())
        .create(caller.as_str(), &posting)
        .await
        .map_err(|e| {
            warn!("Job posting rejected for {}: {}", caller.as_str(), e);
            job_error_response(&e)
        })?;

    if job.coordinates().is_none() {
        warn!(
            "Job {} stored with a location that does not parse: {}",
            job.id, job.location
        );
    }

    Ok((
        Status::Created,
        Json(DataResponse::success("Job created".to_string(), job, None)),
    ))
}

pub async fn update_job_status_handler(
    id: &str,
    request: Json<StatusUpdateRequest>,
    caller: CallerId,
    db: &State<Database>,
) -> Result<Json<DataResponse<Job>>, ApiError> {
    let job = JobRepository::new(db.pool())
        .set_status(id, caller.as_str(), request.status)
        .await
        .map_err(|e| job_error_response(&e))?;

    Ok(Json(DataResponse::success(
        format!("Job is now {}", job.status),
        job,
        None,
    )))
}
