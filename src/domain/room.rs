//! Meeting room entity and its write inputs.

use super::{Patch, RoomId};

/// Longest accepted room name, in characters.
pub const ROOM_NAME_MAX_CHARS: usize = 100;

/// A bookable meeting room as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Store-assigned identifier.
    pub id: RoomId,
    /// Unique, non-empty display name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
}

/// Input for creating a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    /// Requested name; validated before insert.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Partial update of a room.
///
/// `name` may be absent or a value; an explicit null is rejected by
/// validation. `description` accepts all three states and `Null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPatch {
    /// New name.
    pub name: Patch<String>,
    /// New description.
    pub description: Patch<String>,
}

impl RoomPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.name.is_present() && !self.description.is_present()
    }
}

impl Room {
    /// Applies a validated patch, leaving absent fields untouched.
    ///
    /// An explicit null `name` is ignored here; validation rejects it
    /// before a patch reaches the store.
    #[must_use]
    pub fn patched(self, patch: RoomPatch) -> Self {
        let Self {
            id,
            name,
            description,
        } = self;
        let name = match patch.name {
            Patch::Value(new_name) => new_name,
            Patch::Absent | Patch::Null => name,
        };
        Self {
            id,
            name,
            description: patch.description.apply_nullable(description),
        }
    }
}
