// src/routing/mod.rs
//! Driving directions from an OSRM-compatible routing service, with a
//! centre-on-destination fallback when no route can be obtained.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geo::Coordinates;
use crate::utils::{format_distance, format_duration};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Routing request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Routing service returned HTTP {0}")]
    Status(u16),

    #[error("Routing service answered {code}: {message}")]
    Service { code: String, message: String },

    #[error("Routing service returned no route")]
    NoRoute,
}

/// GeoJSON LineString, positions in `[lng, lat]` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteGeometry {
    /// Polyline points as coordinates
    pub fn path(&self) -> Vec<Coordinates> {
        self.coordinates
            .iter()
            .map(|[lng, lat]| Coordinates::new(*lat, *lng))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteInfo {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub distance_text: String,
    pub duration_text: String,
    pub geometry: RouteGeometry,
}

/// What the map should show for a selected job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutePlan {
    Routed(RouteInfo),
    Centered { center: Coordinates },
}

impl RoutePlan {
    pub fn is_routed(&self) -> bool {
        matches!(self, RoutePlan::Routed(_))
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: RouteGeometry,
    distance: f64,
    duration: f64,
}

pub struct RoutingClient {
    client: reqwest::Client,
    base_url: String,
}

impl RoutingClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn route_url(&self, from: Coordinates, to: Coordinates) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, from.lng, from.lat, to.lng, to.lat
        )
    }

    pub async fn driving_route(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> std::result::Result<RouteInfo, RoutingError> {
        let url = self.route_url(from, to);
        debug!("Requesting route: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // OSRM reports NoRoute/InvalidQuery as 400 with a JSON body
        let body: OsrmResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(RoutingError::Status(status.as_u16())),
            Err(e) => return Err(RoutingError::Request(e)),
        };

        if body.code != "Ok" {
            return Err(RoutingError::Service {
                message: body.message.unwrap_or_default(),
                code: body.code,
            });
        }
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let route = body.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;

        Ok(RouteInfo {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            distance_text: format_distance(route.distance / 1000.0),
            duration_text: format_duration(route.duration),
            geometry: route.geometry,
        })
    }
}

/// Turns routing failures into a map centred on the destination. No retries:
/// the user retries by selecting the job again.
pub struct RoutePlanner {
    client: RoutingClient,
}

impl RoutePlanner {
    pub fn new(client: RoutingClient) -> Self {
        Self { client }
    }

    pub async fn plan(&self, from: Coordinates, to: Coordinates) -> RoutePlan {
        match self.client.driving_route(from, to).await {
            Ok(route) => {
                info!(
                    "Route found: {:.0} m, {:.0} s",
                    route.distance_meters, route.duration_seconds
                );
                RoutePlan::Routed(route)
            }
            Err(e) => {
                warn!("Routing failed, centering on destination {}: {}", to, e);
                RoutePlan::Centered { center: to }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_url_uses_lng_lat_order() {
        let client = RoutingClient::new("https://router.example.org/").unwrap();
        let url = client.route_url(
            Coordinates::new(21.0285, 105.8542),
            Coordinates::new(21.03, 105.85),
        );
        assert_eq!(
            url,
            "https://router.example.org/route/v1/driving/105.8542,21.0285;105.85,21.03?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn test_geometry_path_swaps_axes() {
        let geometry = RouteGeometry {
            geometry_type: "LineString".to_string(),
            coordinates: vec![[105.85, 21.03], [105.86, 21.04]],
        };
        assert_eq!(
            geometry.path(),
            vec![Coordinates::new(21.03, 105.85), Coordinates::new(21.04, 105.86)]
        );
    }

    #[test]
    fn test_plan_serializes_with_kind_tag() {
        let plan = RoutePlan::Centered {
            center: Coordinates::new(1.0, 2.0),
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["kind"], "centered");
        assert_eq!(json["center"]["lat"], 1.0);
    }
}
