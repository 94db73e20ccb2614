// src/types/job.rs
//! Job postings as stored and as served with a transient distance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::geo::{format_location, try_parse_location, Coordinates};

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Unknown job status: {0}")]
    InvalidStatus(String),

    #[error("Invalid job posting: {0}")]
    InvalidPosting(String),

    #[error("Only the employer who posted job {0} can change it")]
    NotOwner(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            other => Err(JobError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub employer_id: String,
    pub title: String,
    pub description: String,
    pub job_type: String,
    /// Encoded as `"[<lat>° N, <lng>° E]"`
    pub location: String,
    /// Display address shown next to the distance
    pub address: String,
    pub salary: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn coordinates(&self) -> Option<Coordinates> {
        try_parse_location(&self.location)
    }

    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }
}

/// A job together with its distance from the user, when one can be computed
#[derive(Debug, Clone, Serialize)]
pub struct JobWithDistance {
    #[serde(flatten)]
    pub job: Job,
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_text: Option<String>,
}

impl JobWithDistance {
    /// Missing distances compare as infinitely far away
    pub fn effective_distance(&self) -> f64 {
        self.distance_km.unwrap_or(f64::INFINITY)
    }
}

/// Employer form submission
#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub job_type: Option<String>,
    /// Either an already-encoded location string...
    pub location: Option<String>,
    /// ...or explicit coordinates
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: String,
    pub salary: Option<String>,
}

impl NewJob {
    /// Resolve the location to store. Explicit coordinates win over the string.
    ///
    /// An unparsable string is kept as-is: such jobs still appear in plain listings.
    pub fn encoded_location(&self) -> Result<String, JobError> {
        match (self.lat, self.lng, self.location.as_deref()) {
            (Some(lat), Some(lng), _) => {
                let coords = Coordinates::new(lat, lng);
                if !coords.is_valid() {
                    return Err(JobError::InvalidPosting(format!(
                        "coordinates out of range: {}, {}",
                        lat, lng
                    )));
                }
                Ok(format_location(coords))
            }
            (None, None, Some(location)) if !location.trim().is_empty() => {
                Ok(location.trim().to_string())
            }
            _ => Err(JobError::InvalidPosting(
                "either location or both lat and lng are required".to_string(),
            )),
        }
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.title.trim().is_empty() {
            return Err(JobError::InvalidPosting("title is required".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(JobError::InvalidPosting("address is required".to_string()));
        }
        self.encoded_location().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> NewJob {
        NewJob {
            title: "Phụ bếp".to_string(),
            description: String::new(),
            job_type: Some("part-time".to_string()),
            location: None,
            lat: Some(21.0285),
            lng: Some(105.8542),
            address: "Hoàn Kiếm, Hà Nội".to_string(),
            salary: None,
        }
    }

    #[test]
    fn test_status_round_trip_through_text() {
        assert_eq!("open".parse::<JobStatus>().unwrap(), JobStatus::Open);
        assert_eq!(" Closed ".parse::<JobStatus>().unwrap(), JobStatus::Closed);
        assert!("archived".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_explicit_coordinates_are_encoded() {
        assert_eq!(
            posting().encoded_location().unwrap(),
            "[21.028500° N, 105.854200° E]"
        );
    }

    #[test]
    fn test_location_string_kept_verbatim() {
        let mut job = posting();
        job.lat = None;
        job.lng = None;
        job.location = Some(" gần chợ Bến Thành ".to_string());
        assert_eq!(job.encoded_location().unwrap(), "gần chợ Bến Thành");
    }

    #[test]
    fn test_missing_location_is_rejected() {
        let mut job = posting();
        job.lat = None;
        assert!(job.validate().is_err());
        let mut job = posting();
        job.lat = Some(120.0);
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let mut job = posting();
        job.title = "  ".to_string();
        assert!(matches!(job.validate(), Err(JobError::InvalidPosting(_))));
    }
}
