//! User-facing alerts produced by state transitions.

use std::fmt;

/// A message to show to the user, such as a check-in confirmation or a location failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Presence was set for the named area.
    CheckedIn {
        /// Name of the area.
        area: String,
    },

    /// Presence was cleared for the named area.
    CheckedOut {
        /// Name of the area.
        area: String,
    },

    /// The user declined location access.
    PermissionDenied,

    /// The position query failed; carries the raw error text.
    LocationUnavailable {
        /// The error reported by the location service.
        message: String,
    },
}

impl Notification {
    /// Short title for an alert dialog.
    pub fn title(&self) -> &'static str {
        match self {
            Notification::CheckedIn { .. } => "Checked In",
            Notification::CheckedOut { .. } => "Checked Out",
            Notification::PermissionDenied => "Permission Denied",
            Notification::LocationUnavailable { .. } => "Error",
        }
    }

    /// The alert body.
    pub fn body(&self) -> String {
        match self {
            Notification::CheckedIn { area } => format!("You have checked in at {area}"),
            Notification::CheckedOut { area } => format!("You have checked out from {area}"),
            Notification::PermissionDenied => "Location permission was denied.".to_string(),
            Notification::LocationUnavailable { message } => message.clone(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_in_names_the_area() {
        let n = Notification::CheckedIn {
            area: "Stanley Park".to_string(),
        };
        assert_eq!(n.title(), "Checked In");
        assert_eq!(n.to_string(), "Checked In: You have checked in at Stanley Park");
    }

    #[test]
    fn location_error_keeps_raw_text() {
        let n = Notification::LocationUnavailable {
            message: "GPS timed out".to_string(),
        };
        assert_eq!(n.title(), "Error");
        assert_eq!(n.body(), "GPS timed out");
    }
}
