// src/discovery/mod.rs
//! Distance attachment, facet filtering, distance ordering and pagination of job listings.
//!
//! Everything here is pure and recomputed per request.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::types::{Job, JobWithDistance};
use crate::utils::{format_distance, normalize_facet, normalize_job_type};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFilter {
    /// Substring of the display address, e.g. a district or province
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub open_only: bool,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if self.open_only && !job.is_open() {
            return false;
        }
        if let Some(location) = &self.location {
            let wanted = normalize_facet(location);
            if !wanted.is_empty() && !normalize_facet(&job.address).contains(&wanted) {
                return false;
            }
        }
        // Same synonym table as the write path, so "Bán thời gian" finds "part-time"
        if let Some(job_type) = self.job_type.as_deref().filter(|t| !t.trim().is_empty()) {
            if normalize_job_type(Some(job_type)) != normalize_job_type(Some(&job.job_type)) {
                return false;
            }
        }
        true
    }
}

/// Attach the distance from `user` to each job; `None` when either side is unknown.
pub fn with_distances(user: Option<Coordinates>, jobs: Vec<Job>) -> Vec<JobWithDistance> {
    jobs.into_iter()
        .map(|job| {
            let distance_km = user
                .zip(job.coordinates())
                .map(|(user, coords)| user.distance_km(&coords));
            JobWithDistance {
                job,
                distance_text: distance_km.map(format_distance),
                distance_km,
            }
        })
        .collect()
}

/// Filter by facets and order nearest first.
///
/// Jobs without a computable distance keep their relative order and come last.
pub fn rank_jobs(
    user: Option<Coordinates>,
    jobs: Vec<Job>,
    filter: &JobFilter,
) -> Vec<JobWithDistance> {
    let filtered = jobs.into_iter().filter(|job| filter.matches(job)).collect();
    let mut ranked = with_distances(user, filtered);
    ranked.sort_by(|a, b| a.effective_distance().total_cmp(&b.effective_distance()));
    ranked
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`
pub fn page_size_or_default(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Slice one 1-based page out of `items`. Page 0 is read as page 1.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        page,
        page_size,
        total,
        total_pages,
    }
}
