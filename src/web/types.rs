// src/web/types.rs

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::recommend::SearchRadius;
use crate::types::JobStatus;

pub struct ServerConfig {
    pub page_size: usize,
    pub default_radius: SearchRadius,
}

// ===== Request types =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RouteRequest {
    pub from: Coordinates,
    pub job_id: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RecommendationRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
    /// Free-text worker profile forwarded to the matching service
    pub profile: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusUpdateRequest {
    pub status: JobStatus,
}

// Request types with conversation_id support
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    pub conversation_id: Option<String>,
}

// ===== Standard response envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Error half of every handler result
pub type ApiError = (Status, Json<StandardErrorResponse>);

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}

pub fn api_error(status: Status, error: &str, error_code: &str, suggestions: &[&str]) -> ApiError {
    (
        status,
        Json(StandardErrorResponse::new(
            error.to_string(),
            error_code.to_string(),
            suggestions.iter().map(|s| s.to_string()).collect(),
            None,
        )),
    )
}
