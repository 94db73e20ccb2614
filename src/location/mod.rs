// src/location/mod.rs
//! User location acquisition.
//!
//! A [`PositionSource`] abstracts the platform geolocation facility (native
//! permission flow or browser-style permissions query). [`LocationAcquirer`]
//! layers the high-accuracy → low-accuracy fallback on top of it and
//! [`LocationTracker`] feeds results into the discovery store.

pub mod acquirer;
pub mod sources;
pub mod tracker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::geo::Coordinates;

pub use acquirer::LocationAcquirer;
pub use sources::{FixedPositionSource, IpGeolocationSource};
pub use tracker::LocationTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Native,
    Web,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Prompt,
    Denied,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// How old a cached position may be and still be accepted
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub fn high_accuracy() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }

    pub fn low_accuracy() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_secs(20),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub coords: Coordinates,
    pub accuracy_meters: Option<f64>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Timed out waiting for a position")]
    Timeout,

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Geolocation is not supported on this device")]
    Unsupported,
}

impl LocationError {
    /// Whether the low-accuracy tier should still be attempted
    pub fn allows_fallback(&self) -> bool {
        matches!(self, LocationError::Timeout | LocationError::Unavailable(_))
    }

    /// Text shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Bạn đã từ chối quyền truy cập vị trí. Vui lòng bật quyền vị trí trong cài đặt để xem việc làm gần bạn."
            }
            LocationError::Timeout => {
                "Không thể xác định vị trí của bạn kịp thời. Vui lòng thử lại."
            }
            LocationError::Unavailable(_) => {
                "Không thể xác định vị trí hiện tại. Vui lòng kiểm tra GPS hoặc kết nối mạng."
            }
            LocationError::Unsupported => "Thiết bị của bạn không hỗ trợ định vị.",
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn permission_status(&self) -> PermissionStatus;

    /// Native platforms only: show the OS permission prompt
    async fn request_permission(&self) -> PermissionStatus;

    async fn current_position(&self, options: &PositionOptions) -> Result<Position, LocationError>;
}
