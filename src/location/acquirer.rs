// src/location/acquirer.rs
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    LocationError, PermissionStatus, Platform, Position, PositionOptions, PositionSource,
};

/// High-accuracy first, then low-accuracy with cached-position tolerance.
///
/// Permission denial and missing geolocation support end the attempt at once.
pub struct LocationAcquirer {
    source: Arc<dyn PositionSource>,
    high: PositionOptions,
    low: PositionOptions,
}

impl LocationAcquirer {
    pub fn new(source: Arc<dyn PositionSource>) -> Self {
        Self {
            source,
            high: PositionOptions::high_accuracy(),
            low: PositionOptions::low_accuracy(),
        }
    }

    pub fn with_tiers(mut self, high: PositionOptions, low: PositionOptions) -> Self {
        self.high = high;
        self.low = low;
        self
    }

    pub async fn acquire(&self) -> Result<Position, LocationError> {
        self.ensure_permission().await?;

        match self.attempt(&self.high).await {
            Ok(position) => Ok(position),
            Err(e) if e.allows_fallback() => {
                warn!("High accuracy position failed ({}), trying low accuracy", e);
                self.attempt(&self.low).await
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_permission(&self) -> Result<(), LocationError> {
        let status = self.source.permission_status().await;
        debug!("Location permission status: {:?}", status);

        let status = match (self.source.platform(), status) {
            (Platform::Native, PermissionStatus::Prompt) => {
                info!("Requesting native location permission");
                match self.source.request_permission().await {
                    // Dismissing the prompt counts as a refusal
                    PermissionStatus::Prompt => PermissionStatus::Denied,
                    other => other,
                }
            }
            // Browsers prompt on the position call itself
            (_, other) => other,
        };

        match status {
            PermissionStatus::Granted | PermissionStatus::Prompt => Ok(()),
            PermissionStatus::Denied => Err(LocationError::PermissionDenied),
            PermissionStatus::Unsupported => Err(LocationError::Unsupported),
        }
    }

    async fn attempt(&self, options: &PositionOptions) -> Result<Position, LocationError> {
        match tokio::time::timeout(options.timeout, self.source.current_position(options)).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        }
    }
}
