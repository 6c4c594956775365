//! Group state as reported by the session.

use super::id::GroupId;

/// Full state of a group, as returned by a metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub id: GroupId,
    pub display_name: String,
    /// True while only admins may send into the group.
    pub restricted: bool,
    pub member_count: usize,
}

impl ResourceSnapshot {
    /// Human-readable lock status.
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        if self.restricted {
            "admin-only"
        } else {
            "open"
        }
    }
}

/// Partial group change pushed by the session.
///
/// Updates only carry the attributes that changed, so `restricted` is absent
/// when something else about the group (its name, say) was edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUpdate {
    pub id: GroupId,
    pub restricted: Option<bool>,
    pub display_name: Option<String>,
}

impl ResourceUpdate {
    /// Update that only toggles the restricted flag.
    pub fn restricted(id: impl Into<GroupId>, restricted: bool) -> Self {
        Self {
            id: id.into(),
            restricted: Some(restricted),
            display_name: None,
        }
    }
}
