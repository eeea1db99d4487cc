use serde::{Deserialize, Serialize};

use crate::permissions::PermissionSet;

/// Informational role label for a collaborator.
///
/// Authorization never reads the role; it reads the collaborator's
/// [`PermissionSet`]. The role only picks the defaults used when an invite does
/// not spell out its own flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    #[default]
    Viewer,
    Editor,
    Admin,
}

impl CollaboratorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "viewer" => Some(Self::Viewer),
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn default_permissions(&self) -> PermissionSet {
        match self {
            Self::Viewer => PermissionSet::none(),
            Self::Editor => PermissionSet {
                edit_documents: true,
                create_documents: true,
                ..PermissionSet::none()
            },
            Self::Admin => PermissionSet::all(),
        }
    }
}

impl core::fmt::Display for CollaboratorRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for role in [CollaboratorRole::Viewer, CollaboratorRole::Editor, CollaboratorRole::Admin] {
            assert_eq!(CollaboratorRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(CollaboratorRole::parse("owner"), None);
    }

    #[test]
    fn editor_defaults_cannot_invite() {
        let perms = CollaboratorRole::Editor.default_permissions();
        assert!(perms.edit_documents);
        assert!(!perms.invite_collaborators);
    }
}
