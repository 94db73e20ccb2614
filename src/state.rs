// src/state.rs
//! Explicit discovery state driven through a reducer.
//!
//! Location and route requests carry a generation number. A response whose
//! generation is older than the latest request is dropped, so a slow stale
//! response can never overwrite a newer one.

use std::sync::Mutex;

use crate::discovery::JobFilter;
use crate::geo::Coordinates;
use crate::routing::RoutePlan;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryState {
    pub user_location: Option<Coordinates>,
    pub location_error: Option<String>,
    pub location_loading: bool,
    pub location_generation: u64,
    pub filter: JobFilter,
    pub page: usize,
    pub route: Option<RoutePlan>,
    pub route_loading: bool,
    pub route_generation: u64,
}

impl Default for DiscoveryState {
    fn default() -> Self {
        Self {
            user_location: None,
            location_error: None,
            location_loading: false,
            location_generation: 0,
            filter: JobFilter::default(),
            page: 1,
            route: None,
            route_loading: false,
            route_generation: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    LocationRequested,
    LocationResolved { generation: u64, coords: Coordinates },
    LocationFailed { generation: u64, message: String },
    FilterChanged(JobFilter),
    PageChanged(usize),
    RouteRequested,
    RouteResolved { generation: u64, plan: RoutePlan },
    RouteClosed,
}

pub fn reduce(mut state: DiscoveryState, action: Action) -> DiscoveryState {
    match action {
        Action::LocationRequested => {
            state.location_generation += 1;
            state.location_loading = true;
        }
        Action::LocationResolved { generation, coords } => {
            if generation == state.location_generation {
                state.user_location = Some(coords);
                state.location_error = None;
                state.location_loading = false;
            }
        }
        Action::LocationFailed {
            generation,
            message,
        } => {
            if generation == state.location_generation {
                state.location_loading = false;
                // A stale but present location beats an error banner
                if state.user_location.is_none() {
                    state.location_error = Some(message);
                }
            }
        }
        Action::FilterChanged(filter) => {
            if filter != state.filter {
                state.filter = filter;
                state.page = 1;
            }
        }
        Action::PageChanged(page) => {
            state.page = page.max(1);
        }
        Action::RouteRequested => {
            state.route_generation += 1;
            state.route_loading = true;
        }
        Action::RouteResolved { generation, plan } => {
            if generation == state.route_generation {
                state.route = Some(plan);
                state.route_loading = false;
            }
        }
        Action::RouteClosed => {
            state.route_generation += 1;
            state.route = None;
            state.route_loading = false;
        }
    }
    state
}

/// Thread-safe holder for [`DiscoveryState`]
#[derive(Debug, Default)]
pub struct Store {
    state: Mutex<DiscoveryState>,
}

impl Store {
    pub fn new(state: DiscoveryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Apply an action and return the resulting state
    pub fn dispatch(&self, action: Action) -> DiscoveryState {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let next = reduce(guard.clone(), action);
        *guard = next.clone();
        next
    }

    pub fn snapshot(&self) -> DiscoveryState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
