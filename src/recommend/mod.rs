// src/recommend/mod.rs
//! Radius-bounded recommendations: nearest open jobs within the chosen radius
//! are ranked by the job matching service and cached per user.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::database::{JobRepository, RecommendationRepository};
use crate::discovery::with_distances;
use crate::geo::Coordinates;
use crate::types::{Job, JobWithDistance, MatchCandidate, MatchScore};

pub const MIN_RADIUS_KM: f64 = 0.5;
pub const MAX_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Upper bound on jobs forwarded to the matching service
pub const MAX_CANDIDATES: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RadiusError {
    #[error("Search radius must be between 0.5 and 10 km, got {0}")]
    OutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchRadius(f64);

impl SearchRadius {
    pub fn new(km: f64) -> Result<Self, RadiusError> {
        if km.is_finite() && (MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&km) {
            Ok(Self(km))
        } else {
            Err(RadiusError::OutOfRange(km))
        }
    }

    pub fn km(&self) -> f64 {
        self.0
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self(DEFAULT_RADIUS_KM)
    }
}

/// Open jobs whose distance is at most `radius`, nearest first, capped at [`MAX_CANDIDATES`].
///
/// Jobs whose location does not parse are left out.
pub fn within_radius(
    user: Coordinates,
    jobs: Vec<Job>,
    radius: SearchRadius,
) -> Vec<JobWithDistance> {
    let open = jobs.into_iter().filter(Job::is_open).collect();
    let mut nearby: Vec<JobWithDistance> = with_distances(Some(user), open)
        .into_iter()
        .filter(|j| j.distance_km.is_some_and(|d| d <= radius.km()))
        .collect();
    nearby.sort_by(|a, b| a.effective_distance().total_cmp(&b.effective_distance()));
    nearby.truncate(MAX_CANDIDATES);
    nearby
}

#[async_trait]
pub trait MatchingClient: Send + Sync {
    async fn rank(&self, profile: &str, candidates: &[MatchCandidate]) -> Result<Vec<MatchScore>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub job_id: String,
    pub title: String,
    pub address: String,
    pub job_type: String,
    pub distance_km: f64,
    pub score: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub user_id: String,
    pub radius_km: f64,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<Recommendation>,
}

fn to_candidate(job: &JobWithDistance) -> MatchCandidate {
    MatchCandidate {
        job_id: job.job.id.clone(),
        title: job.job.title.clone(),
        description: job.job.description.clone(),
        job_type: job.job.job_type.clone(),
        address: job.job.address.clone(),
        salary: job.job.salary.clone(),
        distance_km: job.distance_km.unwrap_or(f64::INFINITY),
    }
}

/// Join scores back onto the candidates they refer to.
///
/// Scores for unknown or repeated job ids are dropped; order is best score
/// first, nearer job first on ties.
pub fn merge_scores(
    candidates: &[JobWithDistance],
    scores: Vec<MatchScore>,
) -> Vec<Recommendation> {
    let by_id: HashMap<&str, &JobWithDistance> =
        candidates.iter().map(|c| (c.job.id.as_str(), c)).collect();
    let mut seen = HashSet::new();

    let mut merged: Vec<Recommendation> = scores
        .into_iter()
        .filter_map(|score| {
            let candidate = by_id.get(score.job_id.as_str())?;
            if !seen.insert(score.job_id.clone()) {
                return None;
            }
            Some(Recommendation {
                job_id: score.job_id,
                title: candidate.job.title.clone(),
                address: candidate.job.address.clone(),
                job_type: candidate.job.job_type.clone(),
                distance_km: candidate.effective_distance(),
                score: if score.score.is_finite() {
                    score.score.clamp(0.0, 100.0)
                } else {
                    0.0
                },
                reason: score.reason,
            })
        })
        .collect();

    merged.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.distance_km.total_cmp(&b.distance_km))
    });
    merged
}

pub struct RecommendationService<'a> {
    pool: &'a SqlitePool,
    matcher: &'a dyn MatchingClient,
}

impl<'a> RecommendationService<'a> {
    pub fn new(pool: &'a SqlitePool, matcher: &'a dyn MatchingClient) -> Self {
        Self { pool, matcher }
    }

    pub async fn recommend(
        &self,
        user_id: &str,
        profile: &str,
        location: Coordinates,
        radius: SearchRadius,
    ) -> Result<RecommendationSet> {
        let jobs = JobRepository::new(self.pool).list_open().await?;
        let candidates = within_radius(location, jobs, radius);

        let items = if candidates.is_empty() {
            info!(
                "No open jobs within {} km of {} for user {}",
                radius.km(),
                location,
                user_id
            );
            Vec::new()
        } else {
            let payload: Vec<MatchCandidate> = candidates.iter().map(to_candidate).collect();
            let scores = self
                .matcher
                .rank(profile, &payload)
                .await
                .context("Job matching service failed")?;
            let merged = merge_scores(&candidates, scores);
            if merged.len() < candidates.len() {
                warn!(
                    "Matching service scored {} of {} candidates",
                    merged.len(),
                    candidates.len()
                );
            }
            merged
        };

        let set = RecommendationSet {
            user_id: user_id.to_string(),
            radius_km: radius.km(),
            generated_at: Utc::now(),
            items,
        };

        let payload = serde_json::to_string(&set).context("Failed to serialize recommendations")?;
        RecommendationRepository::new(self.pool)
            .save(user_id, radius.km(), &payload)
            .await?;

        info!(
            "Cached {} recommendations for user {}",
            set.items.len(),
            user_id
        );
        Ok(set)
    }

    /// Recommendations stored by the last successful run, if any
    pub async fn cached(&self, user_id: &str) -> Result<Option<RecommendationSet>> {
        let Some(cached) = RecommendationRepository::new(self.pool).load(user_id).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<RecommendationSet>(&cached.payload) {
            Ok(set) => Ok(Some(set)),
            Err(e) => {
                warn!("Discarding unreadable recommendation cache for {}: {}", user_id, e);
                RecommendationRepository::new(self.pool).clear(user_id).await?;
                Ok(None)
            }
        }
    }
}
