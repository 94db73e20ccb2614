// src/job_cli.rs
use crate::core::database::{Database, JobRepository};
use crate::discovery::{paginate, rank_jobs, JobFilter};
use crate::environment::EnvironmentConfig;
use crate::geo::Coordinates;
use crate::location::{IpGeolocationSource, LocationAcquirer, LocationTracker};
use crate::routing::{RoutePlan, RoutePlanner, RoutingClient};
use crate::state::{Action, DiscoveryState, Store};
use crate::types::{JobStatus, NewJob};
use crate::utils::{format_distance, non_blank};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "job-manager")]
#[command(about = "Manage and browse job postings from the terminal")]
pub struct JobCli {
    #[command(subcommand)]
    pub command: JobCommand,

    /// Overrides the database path from config.yaml
    #[arg(long)]
    pub database_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Initialize the database
    Init,
    /// Post a new job
    Add {
        #[arg(long)]
        employer: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        address: String,
        /// Encoded location, e.g. "[21.028511° N, 105.854164° E]"
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        location: Option<String>,
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        #[arg(long)]
        job_type: Option<String>,
        #[arg(long)]
        salary: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Import jobs from a CSV file (employer_id,title,address,location,job_type,salary,description)
    Import { csv_file: PathBuf },
    /// List all jobs, newest first
    List,
    /// Jobs sorted by distance from a point
    Nearby {
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Detect the current position from the public IP address
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        auto: bool,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        job_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Driving route from a point to a job
    Route {
        job_id: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Close a job so it no longer shows in open listings
    Close {
        job_id: String,
        #[arg(long)]
        employer: String,
    },
}

/// One row of an import file
#[derive(Debug, Deserialize)]
pub struct ImportRow {
    pub employer_id: String,
    pub title: String,
    pub address: String,
    pub location: String,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ImportRow {
    pub fn into_posting(self) -> (String, NewJob) {
        let posting = NewJob {
            title: self.title,
            description: self.description.unwrap_or_default(),
            job_type: non_blank(self.job_type.as_deref()),
            location: Some(self.location),
            lat: None,
            lng: None,
            address: self.address,
            salary: non_blank(self.salary.as_deref()),
        };
        (self.employer_id.trim().to_string(), posting)
    }
}

pub async fn handle_job_command(cli: JobCli, config: EnvironmentConfig) -> Result<()> {
    let database_path = cli
        .database_path
        .clone()
        .unwrap_or_else(|| config.database_path.clone());
    let db = Database::new(&database_path).await?;
    let jobs = JobRepository::new(db.pool());

    match cli.command {
        JobCommand::Init => {
            info!("✅ Database initialized at: {}", database_path.display());
            info!("   Tables created: jobs, recommendations");
        }

        JobCommand::Add {
            employer,
            title,
            address,
            location,
            lat,
            lng,
            job_type,
            salary,
            description,
        } => {
            let posting = NewJob {
                title,
                description,
                job_type,
                location,
                lat,
                lng,
                address,
                salary,
            };
            match jobs.create(&employer, &posting).await {
                Ok(job) => {
                    info!("✅ Job created:");
                    info!("   ID: {}", job.id);
                    info!("   Title: {}", job.title);
                    info!("   Location: {}", job.location);
                }
                Err(e) => {
                    error!("❌ Failed to create job: {}", e);
                }
            }
        }

        JobCommand::Import { csv_file } => {
            if !csv_file.exists() {
                warn!("❌ CSV file not found: {}", csv_file.display());
                return Ok(());
            }

            let content = tokio::fs::read_to_string(&csv_file)
                .await
                .with_context(|| format!("Failed to read {}", csv_file.display()))?;
            let mut reader = csv::Reader::from_reader(content.as_bytes());

            let mut success_count = 0;
            let mut error_count = 0;

            for result in reader.deserialize::<ImportRow>() {
                match result {
                    Ok(row) => {
                        let (employer_id, posting) = row.into_posting();
                        if employer_id.is_empty() {
                            error_count += 1;
                            warn!("⚠️  Skipping row without employer_id");
                            continue;
                        }
                        match jobs.create(&employer_id, &posting).await {
                            Ok(job) => {
                                success_count += 1;
                                if job.coordinates().is_none() {
                                    warn!("⚠️  Added without usable location: {}", job.title);
                                } else {
                                    info!("✅ Added: {}", job.title);
                                }
                            }
                            Err(e) => {
                                error_count += 1;
                                warn!("❌ Failed to add {}: {}", posting.title, e);
                            }
                        }
                    }
                    Err(e) => {
                        error_count += 1;
                        warn!("❌ CSV parsing error: {}", e);
                    }
                }
            }

            info!("Import completed:");
            info!("  ✅ Success: {}", success_count);
            info!("  ❌ Errors:  {}", error_count);
        }

        JobCommand::List => {
            let all = jobs.list_all().await?;
            if all.is_empty() {
                info!("No jobs found.");
            } else {
                info!(
                    "{:<38} {:<8} {:<12} {:<30} {:<20}",
                    "ID", "Status", "Type", "Title", "Created"
                );
                info!("{}", "-".repeat(110));
                for job in all {
                    info!(
                        "{:<38} {:<8} {:<12} {:<30} {:<20}",
                        job.id,
                        job.status,
                        job.job_type,
                        job.title,
                        job.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        JobCommand::Nearby {
            lat,
            lng,
            auto,
            location,
            job_type,
            page,
        } => {
            let store = Arc::new(Store::new(DiscoveryState::default()));

            if auto {
                let source = Arc::new(IpGeolocationSource::new(&config.ip_lookup_url)?);
                let tracker = LocationTracker::new(LocationAcquirer::new(source), store.clone());
                let state = tracker.refresh().await;
                if let Some(message) = &state.location_error {
                    warn!("📍 {}", message);
                }
            } else if let (Some(lat), Some(lng)) = (lat, lng) {
                let coords = Coordinates::new(lat, lng);
                if !coords.is_valid() {
                    anyhow::bail!("Coordinates out of range: {}, {}", lat, lng);
                }
                let generation = store.dispatch(Action::LocationRequested).location_generation;
                store.dispatch(Action::LocationResolved {
                    generation,
                    coords,
                });
            }

            store.dispatch(Action::FilterChanged(JobFilter {
                location: non_blank(location.as_deref()),
                job_type: non_blank(job_type.as_deref()),
                open_only: true,
            }));
            let state = store.dispatch(Action::PageChanged(page));

            let ranked = rank_jobs(state.user_location, jobs.list_all().await?, &state.filter);
            let result = paginate(ranked, state.page, config.page_size);

            match state.user_location {
                Some(user) => info!("Jobs near {}:", user),
                None => info!("Location unknown, jobs are not sorted by distance:"),
            }
            for item in &result.items {
                info!(
                    "{:>8}  {:<30} {:<12} {}",
                    item.distance_text.as_deref().unwrap_or("--"),
                    item.job.title,
                    item.job.job_type,
                    item.job.address
                );
            }
            info!(
                "Page {}/{} ({} jobs)",
                result.page, result.total_pages, result.total
            );
        }

        JobCommand::Route { job_id, lat, lng } => {
            let from = Coordinates::new(lat, lng);
            if !from.is_valid() {
                anyhow::bail!("Coordinates out of range: {}, {}", lat, lng);
            }
            let job = jobs
                .find_by_id(&job_id)
                .await?
                .with_context(|| format!("Job not found: {}", job_id))?;
            let Some(destination) = job.coordinates() else {
                warn!("❌ Job {} has no usable location: {}", job.id, job.location);
                return Ok(());
            };

            let store = Store::new(DiscoveryState::default());
            let generation = store.dispatch(Action::RouteRequested).route_generation;
            let planner = RoutePlanner::new(RoutingClient::new(&config.routing_url)?);
            let plan = planner.plan(from, destination).await;
            let state = store.dispatch(Action::RouteResolved { generation, plan });

            match state.route {
                Some(RoutePlan::Routed(route)) => {
                    info!("🚗 {} → {}", from, job.title);
                    info!("   Distance: {}", route.distance_text);
                    info!("   Duration: {}", route.duration_text);
                    info!("   Path points: {}", route.geometry.path().len());
                }
                Some(RoutePlan::Centered { center }) => {
                    info!("Route unavailable. Job is at {}", center);
                    info!(
                        "   Straight-line distance: {}",
                        format_distance(from.distance_km(&center))
                    );
                }
                None => {}
            }
        }

        JobCommand::Close { job_id, employer } => {
            match jobs.set_status(&job_id, &employer, JobStatus::Closed).await {
                Ok(job) => info!("✅ Job closed: {}", job.title),
                Err(e) => error!("❌ Failed to close job: {}", e),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nearby_with_negative_coordinates() {
        let cli = JobCli::try_parse_from([
            "job-manager",
            "nearby",
            "--lat",
            "-33.86",
            "--lng",
            "151.2",
            "--page",
            "2",
        ])
        .unwrap();
        match cli.command {
            JobCommand::Nearby { lat, lng, auto, page, .. } => {
                assert_eq!(lat, Some(-33.86));
                assert_eq!(lng, Some(151.2));
                assert!(!auto);
                assert_eq!(page, 2);
            }
            _ => panic!("expected nearby"),
        }
    }

    #[test]
    fn test_auto_conflicts_with_explicit_coordinates() {
        assert!(JobCli::try_parse_from([
            "job-manager", "nearby", "--auto", "--lat", "1", "--lng", "2"
        ])
        .is_err());
        assert!(JobCli::try_parse_from(["job-manager", "nearby", "--lat", "1"]).is_err());
    }

    #[test]
    fn test_import_row_to_posting() {
        let data = "employer_id,title,address,location,job_type,salary,description\n\
                    e1,Phục vụ,Quận 1,[10.7769° N; 106.7009° E],,,\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let row: ImportRow = reader.deserialize().next().unwrap().unwrap();
        let (employer, posting) = row.into_posting();
        assert_eq!(employer, "e1");
        assert_eq!(posting.job_type, None);
        assert_eq!(posting.salary, None);
        assert_eq!(posting.location.as_deref(), Some("[10.7769° N; 106.7009° E]"));
    }
}
