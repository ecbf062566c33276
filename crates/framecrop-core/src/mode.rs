//! The two-state editing mode machine.
//!
//! Leaving crop mode always commits the crop first, so the image shown
//! right after the switch is already the cropped result.

use serde::{Deserialize, Serialize};

/// Which interaction set is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Free transform: drag, bounding-box resize/rotate, wheel zoom.
    #[default]
    Edit,
    /// Edge-handle resizing of the crop rectangle.
    Crop,
}

/// What has to happen before the mode value may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    /// Target equals the current mode.
    Stay,
    /// Edit -> Crop: reconcile the crop rectangle with the current bounds.
    EnterCrop,
    /// Crop -> Edit: run the crop commit, then flip.
    CommitAndExit,
}

impl EditMode {
    pub fn toggled(self) -> Self {
        match self {
            EditMode::Edit => EditMode::Crop,
            EditMode::Crop => EditMode::Edit,
        }
    }

    /// Transition required to move from `self` to `target`.
    pub fn transition_to(self, target: EditMode) -> ModeTransition {
        match (self, target) {
            (EditMode::Edit, EditMode::Crop) => ModeTransition::EnterCrop,
            (EditMode::Crop, EditMode::Edit) => ModeTransition::CommitAndExit,
            _ => ModeTransition::Stay,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "edit" => Some(EditMode::Edit),
            "crop" => Some(EditMode::Crop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditMode::Edit => "edit",
            EditMode::Crop => "crop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_edit() {
        assert_eq!(EditMode::default(), EditMode::Edit);
    }

    #[test]
    fn test_transitions() {
        assert_eq!(
            EditMode::Edit.transition_to(EditMode::Crop),
            ModeTransition::EnterCrop
        );
        assert_eq!(
            EditMode::Crop.transition_to(EditMode::Edit),
            ModeTransition::CommitAndExit
        );
        assert_eq!(EditMode::Crop.transition_to(EditMode::Crop), ModeTransition::Stay);
        assert_eq!(EditMode::Edit.transition_to(EditMode::Edit), ModeTransition::Stay);
    }

    #[test]
    fn test_toggle_roundtrip() {
        assert_eq!(EditMode::Edit.toggled().toggled(), EditMode::Edit);
    }

    #[test]
    fn test_names() {
        for mode in [EditMode::Edit, EditMode::Crop] {
            assert_eq!(EditMode::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(EditMode::from_name("both"), None);
    }
}
