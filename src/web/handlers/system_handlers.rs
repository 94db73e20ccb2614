// src/web/handlers/system_handlers.rs
use crate::core::database::Database;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::error;

pub async fn health_handler(db: &State<Database>) -> Result<Json<TextResponse>, ApiError> {
    match db.health_check().await {
        Ok(()) => Ok(Json(TextResponse::success(
            "Job discovery service is running".to_string(),
        ))),
        Err(e) => {
            error!("Health check failed: {}", e);
            Err(api_error(
                Status::ServiceUnavailable,
                "Database unavailable",
                "DATABASE_UNAVAILABLE",
                &["Check the database file and permissions"],
            ))
        }
    }
}
