//! The selection and presence state machine.
//!
//! ```text
//! NoSelection --select(a)--> Selected(a, out)
//! Selected(_, _) --select(b)--> Selected(b, out)
//! Selected(a, out) --check_in--> Selected(a, in)
//! Selected(a, in) --check_out--> Selected(a, out)
//! any --clear--> NoSelection
//! ```
//!
//! Presence never survives a change of the selected area, and transitions that are not listed
//! above are silent no-ops.

use std::sync::Arc;

use log::{debug, info};

use crate::catalog::Area;
use crate::notification::Notification;

/// Which area is selected, and whether the user is checked in there.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SelectionState {
    /// Nothing is selected.
    #[default]
    NoSelection,

    /// An area is selected.
    Selected {
        /// The selected area.
        area: Arc<Area>,
        /// Whether the user is checked in at `area`.
        checked_in: bool,
    },
}

impl SelectionState {
    /// The selected area, if any.
    pub fn selected(&self) -> Option<&Arc<Area>> {
        match self {
            SelectionState::NoSelection => None,
            SelectionState::Selected { area, .. } => Some(area),
        }
    }

    /// `true` only while an area is selected and the user checked in there.
    pub fn is_checked_in(&self) -> bool {
        matches!(self, SelectionState::Selected { checked_in: true, .. })
    }

    /// Selects `area` and clears presence, even when `area` is already selected.
    pub fn select(&mut self, area: Arc<Area>) {
        debug!("Selected area {} ({})", area.id, area.name);
        *self = SelectionState::Selected {
            area,
            checked_in: false,
        };
    }

    /// Drops the selection, and with it any presence.
    pub fn clear(&mut self) {
        *self = SelectionState::NoSelection;
    }

    /// Checks in at the selected area. Does nothing when nothing is selected or the user is
    /// already checked in.
    pub fn check_in(&mut self) -> Option<Notification> {
        match self {
            SelectionState::Selected { area, checked_in } if !*checked_in => {
                *checked_in = true;
                info!("Checked in at {}", area.name);
                Some(Notification::CheckedIn {
                    area: area.name.clone(),
                })
            }
            _ => None,
        }
    }

    /// Checks out of the selected area. Does nothing unless checked in.
    pub fn check_out(&mut self) -> Option<Notification> {
        match self {
            SelectionState::Selected { area, checked_in } if *checked_in => {
                *checked_in = false;
                info!("Checked out from {}", area.name);
                Some(Notification::CheckedOut {
                    area: area.name.clone(),
                })
            }
            _ => None,
        }
    }

    /// The single check-in button: checks out when checked in, checks in otherwise.
    pub fn toggle_presence(&mut self) -> Option<Notification> {
        if self.is_checked_in() {
            self.check_out()
        } else {
            self.check_in()
        }
    }

    /// Label for the check-in button, or `None` when the button should be hidden.
    pub fn toggle_label(&self) -> Option<String> {
        match self {
            SelectionState::NoSelection => None,
            SelectionState::Selected {
                area,
                checked_in: true,
            } => Some(format!("Check Out from {}", area.name)),
            SelectionState::Selected {
                area,
                checked_in: false,
            } => Some(format!("Check In at {}", area.name)),
        }
    }
}
