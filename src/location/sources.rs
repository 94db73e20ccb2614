// src/location/sources.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{LocationError, PermissionStatus, Platform, Position, PositionOptions, PositionSource};
use crate::geo::Coordinates;

/// A position supplied up front, e.g. from command line flags
pub struct FixedPositionSource {
    coords: Coordinates,
    platform: Platform,
}

impl FixedPositionSource {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            coords,
            platform: Platform::Native,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, LocationError> {
        if !self.coords.is_valid() {
            return Err(LocationError::Unavailable(format!(
                "invalid coordinates {}, {}",
                self.coords.lat, self.coords.lng
            )));
        }
        Ok(Position {
            coords: self.coords,
            accuracy_meters: Some(0.0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}

/// Approximate position from the caller's public IP (ip-api.com JSON format).
///
/// City-level only: high-accuracy requests report `Unavailable`, which sends the
/// acquirer straight to the low-accuracy tier.
pub struct IpGeolocationSource {
    client: reqwest::Client,
    lookup_url: String,
}

impl IpGeolocationSource {
    pub fn new(lookup_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            lookup_url: lookup_url.to_string(),
        })
    }
}

#[async_trait]
impl PositionSource for IpGeolocationSource {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    async fn permission_status(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self, options: &PositionOptions) -> Result<Position, LocationError> {
        if options.high_accuracy {
            return Err(LocationError::Unavailable(
                "IP lookup cannot provide high accuracy".to_string(),
            ));
        }

        let response = self
            .client
            .get(&self.lookup_url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    LocationError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            warn!("IP lookup returned HTTP {}", response.status());
            return Err(LocationError::Unavailable(format!(
                "lookup returned HTTP {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if body.status != "success" {
            return Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        let coords = body
            .lat
            .zip(body.lon)
            .map(|(lat, lng)| Coordinates::new(lat, lng))
            .filter(Coordinates::is_valid)
            .ok_or_else(|| LocationError::Unavailable("lookup returned no coordinates".into()))?;

        info!(
            "IP geolocation resolved to {} ({})",
            coords,
            body.city.as_deref().unwrap_or("unknown city")
        );

        Ok(Position {
            coords,
            accuracy_meters: None,
        })
    }
}
