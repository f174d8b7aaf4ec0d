//! Device location lookup.
//!
//! [`locate`] asks the platform for foreground permission and then for a single position fix.
//! It never touches map or selection state; callers apply the outcome themselves (see
//! [`crate::ParkMapState::finish_locate`]).

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use poll_promise::Promise;
use thiserror::Error;

use crate::projection::Coordinate;

/// The answer to a foreground location permission request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    /// The app may query the position.
    Granted,
    /// The user declined.
    Denied,
}

/// Why a location lookup failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The user declined location access. No position query was made.
    #[error("Location permission was denied.")]
    PermissionDenied,

    /// The position query failed, for example on a timeout or hardware error.
    #[error("{0}")]
    PositionUnavailable(String),
}

/// The platform location service.
///
/// Timeouts and rate limiting are the implementation's responsibility.
#[async_trait]
pub trait LocationService: Send + Sync {
    /// Requests foreground location permission.
    async fn request_permission(&self) -> Permission;

    /// Queries the current position once.
    async fn current_position(&self) -> eyre::Result<Coordinate>;
}

/// Resolves the device position: permission first, then one position query.
///
/// Single-shot. Nothing is retried and the lookup cannot be cancelled.
pub async fn locate(service: &dyn LocationService) -> Result<Coordinate, LocationError> {
    debug!("Requesting location permission");
    if service.request_permission().await == Permission::Denied {
        info!("Location permission denied");
        return Err(LocationError::PermissionDenied);
    }

    match service.current_position().await {
        Ok(position) => {
            info!("Located device at ({:.5}, {:.5})", position.lat, position.lon);
            Ok(position)
        }
        Err(e) => {
            info!("Position unavailable: {e:#}");
            Err(LocationError::PositionUnavailable(e.to_string()))
        }
    }
}

/// Runs [`locate`] on a background thread so that a UI can poll for the result.
pub fn spawn_locate(
    service: Arc<dyn LocationService>,
) -> Promise<Result<Coordinate, LocationError>> {
    Promise::spawn_thread("locate", move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LocationError::PositionUnavailable(e.to_string()))?;
        runtime.block_on(locate(service.as_ref()))
    })
}

/// Identifies one call to [`crate::ParkMapState::begin_locate`]. Only the newest ticket's
/// outcome is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocateTicket(pub(crate) u64);

/// A location service with a fixed answer, for desktops without positioning hardware.
#[derive(Clone, Debug)]
pub struct FixedLocationService {
    permission: Permission,
    position: Option<Coordinate>,
}

impl FixedLocationService {
    /// Grants permission and always reports `position`.
    pub fn new(position: Coordinate) -> Self {
        Self {
            permission: Permission::Granted,
            position: Some(position),
        }
    }

    /// Grants permission but never gets a fix.
    pub fn unavailable() -> Self {
        Self {
            permission: Permission::Granted,
            position: None,
        }
    }

    /// Always denies permission.
    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            position: None,
        }
    }
}

#[async_trait]
impl LocationService for FixedLocationService {
    async fn request_permission(&self) -> Permission {
        self.permission
    }

    async fn current_position(&self) -> eyre::Result<Coordinate> {
        self.position
            .ok_or_else(|| eyre::eyre!("No position fix available"))
    }
}
