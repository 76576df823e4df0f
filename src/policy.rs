//! Who may do what to a cat record.
//!
//! [`can_act`] is a pure function of the principal, the action and the
//! owner of the record being touched. It never looks at the store.

use uuid::Uuid;

use crate::middleware::Principal;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListAll,
    GetById,
    ListByBoundingBox,
    ListOwned,
    Create,
    /// Update a record the principal owns
    Update,
    /// Delete a record the principal owns
    Delete,
    UpdateAny,
    DeleteAny,
    /// Change the `owner` field of a record
    ReassignOwner,
}

impl Action {
    pub fn is_public_read(self) -> bool {
        matches!(self, Action::ListAll | Action::GetById | Action::ListByBoundingBox)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    NotPermitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn check(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

pub fn can_act(principal: Option<&Principal>, action: Action, resource_owner: Option<Uuid>) -> Decision {
    if action.is_public_read() {
        return Decision::Allow;
    }

    let Some(principal) = principal else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    match principal.role {
        Role::Admin => Decision::Allow,
        Role::User => match action {
            Action::ListOwned | Action::Create => Decision::Allow,
            Action::Update | Action::Delete if resource_owner == Some(principal.id) => Decision::Allow,
            Action::Update
            | Action::Delete
            | Action::UpdateAny
            | Action::DeleteAny
            | Action::ReassignOwner => Decision::Deny(DenyReason::NotPermitted),
            Action::ListAll | Action::GetById | Action::ListByBoundingBox => Decision::Allow,
        },
    }
}
