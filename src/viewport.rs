//! The viewport controller: the single owner of the current map region.

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::projection::Coordinate;

/// Span, in degrees, of the region used when focusing on a single place.
pub const FOCUS_SPAN: f64 = 0.005;

/// Duration of the animated transition issued by [`Viewport::focus_on`].
pub const FOCUS_ANIMATION: Duration = Duration::from_millis(500);

/// Area labels are shown once the latitude span drops below this value.
pub const NAMES_VISIBLE_THRESHOLD: f64 = 0.05;

/// The region shown before anything else has happened: downtown Vancouver.
pub const FALLBACK_CENTER: Coordinate = Coordinate::new(49.2827, -123.1207);

/// Span of the fallback region.
pub const FALLBACK_SPAN: f64 = 0.1;

/// Error returned when a region would have a non-positive span.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("region spans must be positive, got {lat_span} x {lon_span}")]
pub struct InvalidRegion {
    /// The rejected latitude span.
    pub lat_span: f64,
    /// The rejected longitude span.
    pub lon_span: f64,
}

/// A rectangular map viewport, described by its center and its extent in degrees.
///
/// Both spans are always strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    center: Coordinate,
    lat_span: f64,
    lon_span: f64,
}

impl Region {
    /// Creates a region, rejecting spans that are not strictly positive (or NaN).
    pub fn new(center: Coordinate, lat_span: f64, lon_span: f64) -> Result<Self, InvalidRegion> {
        if lat_span > 0.0 && lon_span > 0.0 {
            Ok(Self {
                center,
                lat_span,
                lon_span,
            })
        } else {
            Err(InvalidRegion { lat_span, lon_span })
        }
    }

    /// The region shown at startup.
    pub fn fallback() -> Self {
        Self {
            center: FALLBACK_CENTER,
            lat_span: FALLBACK_SPAN,
            lon_span: FALLBACK_SPAN,
        }
    }

    /// The center of the region.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// The north-south extent in degrees.
    pub fn lat_span(&self) -> f64 {
        self.lat_span
    }

    /// The east-west extent in degrees.
    pub fn lon_span(&self) -> f64 {
        self.lon_span
    }

    /// Linearly interpolates between two regions. Spans are interpolated in log space so that
    /// zooming feels uniform.
    pub fn lerp(&self, other: &Region, t: f64) -> Region {
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *other;
        }
        let mix = |a: f64, b: f64| a + (b - a) * t;
        let mix_log = |a: f64, b: f64| (a.ln() + (b.ln() - a.ln()) * t).exp();
        Region {
            center: Coordinate::new(
                mix(self.center.lat, other.center.lat),
                mix(self.center.lon, other.center.lon),
            ),
            lat_span: mix_log(self.lat_span, other.lat_span),
            lon_span: mix_log(self.lon_span, other.lon_span),
        }
    }
}

#[derive(Deserialize)]
struct RawRegion {
    center: Coordinate,
    lat_span: f64,
    lon_span: f64,
}

impl TryFrom<RawRegion> for Region {
    type Error = InvalidRegion;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        Region::new(raw.center, raw.lat_span, raw.lon_span)
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::fallback()
    }
}

/// The part of the map renderer the viewport talks to.
pub trait RenderSurface {
    /// Starts an animated transition to `region`. Fire-and-forget: once the surface settles it
    /// reports the region it actually shows through [`Viewport::set_region`].
    fn animate_to_region(&mut self, region: Region, duration: Duration);
}

/// A transition requested by [`Viewport::focus_on`] that has not been handed to a surface yet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    /// Where the surface should end up.
    pub target: Region,
    /// How long the transition should take.
    pub duration: Duration,
}

/// Owns the current [`Region`] and derives label visibility from it.
#[derive(Clone, Debug)]
pub struct Viewport {
    region: Region,
    names_threshold: f64,
    animation_duration: Duration,
    pending: Option<Animation>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Region::fallback(), NAMES_VISIBLE_THRESHOLD, FOCUS_ANIMATION)
    }
}

impl Viewport {
    /// Creates a viewport showing `region`.
    pub fn new(region: Region, names_threshold: f64, animation_duration: Duration) -> Self {
        Self {
            region,
            names_threshold,
            animation_duration,
            pending: None,
        }
    }

    /// The current region.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Replaces the current region. Called with the region reported by the renderer after the
    /// user pans or zooms, or after an animation settles.
    pub fn set_region(&mut self, region: Region) {
        debug!(
            "Region changed to ({:.5}, {:.5}) span {:.5} x {:.5}",
            region.center.lat, region.center.lon, region.lat_span, region.lon_span
        );
        self.region = region;
    }

    /// Centers the viewport on `center` with a square `span`, and queues an animated transition
    /// for the renderer.
    ///
    /// The owned region changes immediately, so [`Viewport::names_visible`] is already consistent
    /// with the target while the animation is still running. A span that is not strictly
    /// positive is replaced with [`FOCUS_SPAN`].
    pub fn focus_on(&mut self, center: Coordinate, span: f64) {
        let region = Region::new(center, span, span).unwrap_or_else(|e| {
            warn!("{e}, focusing with the default span instead");
            Region {
                center,
                lat_span: FOCUS_SPAN,
                lon_span: FOCUS_SPAN,
            }
        });

        self.set_region(region);
        // A newer target supersedes one that was never delivered.
        self.pending = Some(Animation {
            target: region,
            duration: self.animation_duration,
        });
    }

    /// Whether area labels should be drawn. No hysteresis: labels flicker if the span hovers
    /// around the threshold.
    pub fn names_visible(&self) -> bool {
        names_visible(&self.region, self.names_threshold)
    }

    /// The transition waiting to be handed to a renderer, if any.
    pub fn pending_animation(&self) -> Option<&Animation> {
        self.pending.as_ref()
    }

    /// Hands the pending transition, if any, to `surface`. Returns `true` if a command was sent.
    pub fn dispatch(&mut self, surface: &mut dyn RenderSurface) -> bool {
        match self.pending.take() {
            Some(animation) => {
                surface.animate_to_region(animation.target, animation.duration);
                true
            }
            None => false,
        }
    }
}

/// Labels are visible strictly below the threshold.
pub fn names_visible(region: &Region, threshold: f64) -> bool {
    region.lat_span < threshold
}
