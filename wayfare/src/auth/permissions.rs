//! Ownership and admin checks used by handlers.
//!
//! The acting user always comes from the authenticated session, never from the request
//! body, so these checks only compare the caller against a resource's owner.

use crate::{
    api::models::{auth::Principal, users::CurrentUser},
    errors::{Error, Result},
    types::{AgencyId, Operation, UserId},
};

fn forbidden(action: Operation, resource: &str) -> Error {
    Error::Forbidden {
        action,
        resource: resource.to_string(),
    }
}

pub fn require_admin(user: &CurrentUser, action: Operation, resource: &str) -> Result<()> {
    if user.is_admin { Ok(()) } else { Err(forbidden(action, resource)) }
}

/// Only the owner may act, admins included.
pub fn require_owner(user: &CurrentUser, owner: UserId, action: Operation, resource: &str) -> Result<()> {
    if user.id == owner { Ok(()) } else { Err(forbidden(action, resource)) }
}

pub fn require_owner_or_admin(user: &CurrentUser, owner: UserId, action: Operation, resource: &str) -> Result<()> {
    if user.id == owner || user.is_admin {
        Ok(())
    } else {
        Err(forbidden(action, resource))
    }
}

/// The agency that owns the resource, or a platform admin.
pub fn require_agency_or_admin(principal: &Principal, owner: AgencyId, action: Operation, resource: &str) -> Result<()> {
    match principal {
        Principal::Agency(agency) if agency.id == owner => Ok(()),
        Principal::User(user) if user.is_admin => Ok(()),
        _ => Err(forbidden(action, resource)),
    }
}
