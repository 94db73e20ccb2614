// src/web/handlers/recommendation_handlers.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use crate::core::database::Database;
use crate::geo::Coordinates;
use crate::recommend::{RecommendationService, RecommendationSet, SearchRadius};
use crate::web::identity::CallerId;
use crate::web::types::*;
use crate::web::MatcherState;

pub async fn recommend_handler(
    request: Json<StandardRequest<RecommendationRequest>>,
    caller: CallerId,
    db: &State<Database>,
    matcher: &State<MatcherState>,
    config: &State<ServerConfig>,
) -> Result<Json<DataResponse<RecommendationSet>>, ApiError> {
    let conversation_id = request.conversation_id.clone();
    let body = request.into_inner().data;

    let location = Coordinates::new(body.lat, body.lng);
    if !location.is_valid() {
        return Err(api_error(
            Status::BadRequest,
            "Coordinates out of range",
            "INVALID_COORDINATES",
            &["Latitude must be within ±90 and longitude within ±180"],
        ));
    }

    let radius = match body.radius_km {
        Some(km) => SearchRadius::new(km).map_err(|e| {
            api_error(
                Status::BadRequest,
                &e.to_string(),
                "INVALID_RADIUS",
                &["Pick a radius between 0.5 and 10 km"],
            )
        })?,
        None => config.default_radius,
    };

    if body.profile.trim().is_empty() {
        return Err(api_error(
            Status::BadRequest,
            "Profile text is required",
            "MISSING_PROFILE",
            &["Describe your skills and preferred work"],
        ));
    }

    info!(
        "Recommendations requested by {} within {} km of {}",
        caller.as_str(),
        radius.km(),
        location
    );

    let service = RecommendationService::new(db.pool(), matcher.0.as_ref());
    let set = service
        .recommend(caller.as_str(), &body.profile, location, radius)
        .await
        .map_err(|e| {
            error!("Recommendation failed for {}: {:#}", caller.as_str(), e);
            api_error(
                Status::BadGateway,
                "Job matching service is unavailable",
                "MATCHING_FAILED",
                &["Try again in a few moments", "Browse nearby jobs meanwhile"],
            )
        })?;

    let message = if set.items.is_empty() {
        format!("No open jobs within {} km", set.radius_km)
    } else {
        format!("{} recommended jobs", set.items.len())
    };

    Ok(Json(DataResponse::success(message, set, conversation_id)))
}

pub async fn cached_recommendations_handler(
    caller: CallerId,
    db: &State<Database>,
    matcher: &State<MatcherState>,
) -> Result<Json<DataResponse<Option<RecommendationSet>>>, ApiError> {
    let service = RecommendationService::new(db.pool(), matcher.0.as_ref());
    let cached = service.cached(caller.as_str()).await.map_err(|e| {
        error!("Failed to load cached recommendations: {:#}", e);
        api_error(
            Status::InternalServerError,
            "Failed to load recommendations",
            "DATABASE_ERROR",
            &["Try again in a few moments"],
        )
    })?;

    let message = match &cached {
        Some(set) => format!("{} cached recommendations", set.items.len()),
        None => "No recommendations yet".to_string(),
    };

    Ok(Json(DataResponse::success(message, cached, None)))
}
