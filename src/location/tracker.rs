// src/location/tracker.rs
use std::sync::Arc;
use tracing::{info, warn};

use super::{LocationAcquirer, LocationError, PermissionStatus};
use crate::state::{Action, DiscoveryState, Store};

/// Keeps the user location in the discovery store up to date
pub struct LocationTracker {
    acquirer: LocationAcquirer,
    store: Arc<Store>,
}

impl LocationTracker {
    pub fn new(acquirer: LocationAcquirer, store: Arc<Store>) -> Self {
        Self { acquirer, store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub async fn refresh(&self) -> DiscoveryState {
        let generation = self
            .store
            .dispatch(Action::LocationRequested)
            .location_generation;

        match self.acquirer.acquire().await {
            Ok(position) => {
                info!("User location updated: {}", position.coords);
                self.store.dispatch(Action::LocationResolved {
                    generation,
                    coords: position.coords,
                })
            }
            Err(e) => {
                warn!("Location acquisition failed: {}", e);
                self.store.dispatch(Action::LocationFailed {
                    generation,
                    message: e.user_message().to_string(),
                })
            }
        }
    }

    /// App came back to the foreground
    pub async fn on_resume(&self) -> DiscoveryState {
        self.refresh().await
    }

    pub async fn on_permission_change(&self, status: PermissionStatus) -> DiscoveryState {
        if status == PermissionStatus::Denied {
            // Also invalidates any request still in flight
            let generation = self
                .store
                .dispatch(Action::LocationRequested)
                .location_generation;
            return self.store.dispatch(Action::LocationFailed {
                generation,
                message: LocationError::PermissionDenied.user_message().to_string(),
            });
        }
        self.refresh().await
    }
}
