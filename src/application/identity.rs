//! The identity contract between this crate and its embedding host.
//!
//! Authentication itself lives outside; the host resolves whoever is making
//! the current request and hands the result in. Rating submission needs any
//! present identity, admin mutations need one with the admin flag set.

use uuid::Uuid;

/// An authenticated caller as resolved by the embedding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub is_admin: bool,
}

impl Identity {
    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            is_admin: false,
        }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, is_admin: true }
    }
}

/// Supplies the identity attached to the current request, if any.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<Identity>;
}
