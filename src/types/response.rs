// src/types/response.rs
//! Wire types exchanged with the job matching (AI ranking) service

use serde::{Deserialize, Serialize};

// ===== Service Request Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub job_id: String,
    pub title: String,
    pub description: String,
    pub job_type: String,
    pub address: String,
    pub salary: Option<String>,
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub struct JobMatchRequest<'a> {
    pub profile: &'a str,
    pub candidates: &'a [MatchCandidate],
}

// ===== Service Response Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub job_id: String,
    pub score: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobMatchResponse {
    #[serde(default)]
    pub matches: Vec<MatchScore>,
    pub status: Option<String>,
}
