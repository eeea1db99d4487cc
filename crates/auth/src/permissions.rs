use serde::{Deserialize, Serialize};

/// An action an actor may request against a project or one of its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Edit,
    Delete,
    Invite,
    Manage,
    ViewAnalytics,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Read,
        Action::Create,
        Action::Edit,
        Action::Delete,
        Action::Invite,
        Action::Manage,
        Action::ViewAnalytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Invite => "invite",
            Self::Manage => "manage",
            Self::ViewAnalytics => "view_analytics",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-collaborator permission flags.
///
/// Flags are independent of the collaborator's role label; the role only
/// supplies defaults at invite time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    pub edit_documents: bool,
    pub create_documents: bool,
    pub delete_documents: bool,
    pub invite_collaborators: bool,
    pub manage_project: bool,
    pub view_analytics: bool,
}

impl PermissionSet {
    pub const fn all() -> Self {
        Self {
            edit_documents: true,
            create_documents: true,
            delete_documents: true,
            invite_collaborators: true,
            manage_project: true,
            view_analytics: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            edit_documents: false,
            create_documents: false,
            delete_documents: false,
            invite_collaborators: false,
            manage_project: false,
            view_analytics: false,
        }
    }

    /// Whether an active member holding this set may perform `action`.
    ///
    /// `Read` needs no flag: active membership alone grants it.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => true,
            Action::Create => self.create_documents,
            Action::Edit => self.edit_documents,
            Action::Delete => self.delete_documents,
            Action::Invite => self.invite_collaborators,
            Action::Manage => self.manage_project,
            Action::ViewAnalytics => self.view_analytics,
        }
    }

    /// Actions this set grants, in declaration order.
    pub fn granted(&self) -> Vec<Action> {
        Action::ALL.into_iter().filter(|a| self.allows(*a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_still_reads() {
        let none = PermissionSet::none();
        assert_eq!(none.granted(), vec![Action::Read]);
    }

    #[test]
    fn flags_map_one_to_one() {
        let set = PermissionSet {
            edit_documents: true,
            ..PermissionSet::none()
        };
        assert!(set.allows(Action::Edit));
        assert!(!set.allows(Action::Create));
        assert!(!set.allows(Action::Delete));
    }

    #[test]
    fn missing_flags_deserialize_as_false() {
        let set: PermissionSet = serde_json::from_str(r#"{"invite_collaborators": true}"#).unwrap();
        assert!(set.invite_collaborators);
        assert!(!set.manage_project);
    }
}
