//! # Ledger - users, boxes and access requests
//!
//! The ledger is the whole persisted state of the bot. It is a plain value:
//! every operation here is synchronous and in-memory, and the caller
//! ([`crate::storage::Store`]) decides when to write it back to disk.
//!
//! ## Ownership rules
//!
//! - A box has exactly one owner, who may remove it and answer access requests.
//! - Eaters are users the owner granted access to. They may show, eat from and
//!   set the box as their default, but never remove it.
//! - A user's default box is the implicit target of `get`, `eat`, `feed`,
//!   `show` and `show_name`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use super::grid::{Grid, GridError};
use super::names::NamePool;

/// Telegram chat id.
pub type UserId = i64;
pub type BoxId = u32;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user {0} is not registered")]
    NotRegistered(UserId),

    #[error("box '{0}' not found")]
    BoxNotFound(String),

    #[error("box '{0}' belongs to someone else")]
    NotOwner(String),

    #[error("user already has access to box '{0}'")]
    AlreadyHasAccess(String),

    #[error("a request for box '{0}' is already pending")]
    AlreadyRequested(String),

    #[error("no default box set")]
    NoDefaultBox,

    #[error("access request {0} not found")]
    RequestNotFound(Uuid),

    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub owns: Vec<BoxId>,
    #[serde(default)]
    pub eats: Vec<BoxId>,
    #[serde(default)]
    pub default: Option<BoxId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacaronBox {
    pub id: BoxId,
    pub name: String,
    pub owner: UserId,
    #[serde(default)]
    pub eaters: Vec<UserId>,
    pub grid: Grid,
}

impl MacaronBox {
    pub fn can_access(&self, user: UserId) -> bool {
        self.owner == user || self.eaters.contains(&user)
    }
}

/// A pending request to eat from somebody else's box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    pub id: Uuid,
    pub requester: UserId,
    pub box_id: BoxId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Granted {
        requester: UserId,
        box_id: BoxId,
        box_name: String,
    },
    Denied {
        requester: UserId,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub users: BTreeMap<UserId, User>,
    #[serde(default)]
    pub boxes: Vec<MacaronBox>,
    #[serde(default)]
    pub requests: Vec<AccessRequest>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, id: UserId) -> Result<&User, LedgerError> {
        self.users.get(&id).ok_or(LedgerError::NotRegistered(id))
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User, LedgerError> {
        self.users.get_mut(&id).ok_or(LedgerError::NotRegistered(id))
    }

    pub fn is_registered(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Register `id` if unknown. Returns `true` when a new user was created.
    pub fn register_user(&mut self, id: UserId) -> bool {
        if self.users.contains_key(&id) {
            return false;
        }
        self.users.insert(id, User::default());
        true
    }

    pub fn box_by_id(&self, id: BoxId) -> Option<&MacaronBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn box_by_id_mut(&mut self, id: BoxId) -> Option<&mut MacaronBox> {
        self.boxes.iter_mut().find(|b| b.id == id)
    }

    pub fn box_by_name(&self, name: &str) -> Option<&MacaronBox> {
        self.boxes.iter().find(|b| b.name == name)
    }

    /// Box `name` if `user` owns or eats from it.
    pub fn accessible_box(&self, user: UserId, name: &str) -> Result<&MacaronBox, LedgerError> {
        self.user(user)?;
        self.box_by_name(name)
            .filter(|b| b.can_access(user))
            .ok_or_else(|| LedgerError::BoxNotFound(name.to_string()))
    }

    pub fn default_box(&self, user: UserId) -> Result<&MacaronBox, LedgerError> {
        let id = self.user(user)?.default.ok_or(LedgerError::NoDefaultBox)?;
        self.box_by_id(id).ok_or(LedgerError::NoDefaultBox)
    }

    pub fn default_box_mut(&mut self, user: UserId) -> Result<&mut MacaronBox, LedgerError> {
        let id = self.user(user)?.default.ok_or(LedgerError::NoDefaultBox)?;
        self.box_by_id_mut(id).ok_or(LedgerError::NoDefaultBox)
    }

    pub fn owned_boxes(&self, user: UserId) -> Result<Vec<&MacaronBox>, LedgerError> {
        let u = self.user(user)?;
        Ok(u.owns.iter().filter_map(|id| self.box_by_id(*id)).collect())
    }

    pub fn eaten_boxes(&self, user: UserId) -> Result<Vec<&MacaronBox>, LedgerError> {
        let u = self.user(user)?;
        Ok(u.eats.iter().filter_map(|id| self.box_by_id(*id)).collect())
    }

    fn next_box_id(&self) -> BoxId {
        self.boxes.last().map(|b| b.id + 1).unwrap_or(0)
    }

    /// Create a full `rows` x `cols` box owned by `owner` and make it their default.
    pub fn create_box<R: Rng + ?Sized>(
        &mut self,
        owner: UserId,
        rows: usize,
        cols: usize,
        names: &mut NamePool,
        rng: &mut R,
    ) -> Result<&MacaronBox, LedgerError> {
        let grid = Grid::new(rows, cols)?;
        self.register_user(owner);
        let id = self.next_box_id();
        let name = names.box_name(id, rng);
        self.boxes.push(MacaronBox {
            id,
            name,
            owner,
            eaters: Vec::new(),
            grid,
        });
        let user = self.user_mut(owner)?;
        user.owns.push(id);
        user.default = Some(id);
        self.box_by_id(id).ok_or(LedgerError::NoDefaultBox)
    }

    /// Make `name` the default box of `user`. The box must be accessible to them.
    pub fn set_default(&mut self, user: UserId, name: &str) -> Result<BoxId, LedgerError> {
        let id = self.accessible_box(user, name)?.id;
        self.user_mut(user)?.default = Some(id);
        Ok(id)
    }

    /// Queue a request from `requester` to eat from box `name`. Returns the new
    /// request and the owner who has to answer it.
    pub fn request_access(
        &mut self,
        requester: UserId,
        name: &str,
    ) -> Result<(AccessRequest, UserId), LedgerError> {
        self.user(requester)?;
        let b = self
            .box_by_name(name)
            .ok_or_else(|| LedgerError::BoxNotFound(name.to_string()))?;
        if b.can_access(requester) {
            return Err(LedgerError::AlreadyHasAccess(b.name.clone()));
        }
        if self.requests.iter().any(|r| r.requester == requester && r.box_id == b.id) {
            return Err(LedgerError::AlreadyRequested(b.name.clone()));
        }
        let request = AccessRequest {
            id: Uuid::new_v4(),
            requester,
            box_id: b.id,
        };
        let owner = b.owner;
        self.requests.push(request.clone());
        Ok((request, owner))
    }

    pub fn request(&self, id: Uuid) -> Option<&AccessRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Owner of the box a pending request targets, if both still exist.
    pub fn request_owner(&self, id: Uuid) -> Option<UserId> {
        self.request(id)
            .and_then(|r| self.box_by_id(r.box_id))
            .map(|b| b.owner)
    }

    /// Grant or deny a pending request. The request is removed either way.
    pub fn resolve_request(&mut self, id: Uuid, granted: bool) -> Result<Resolution, LedgerError> {
        let pos = self
            .requests
            .iter()
            .position(|r| r.id == id)
            .ok_or(LedgerError::RequestNotFound(id))?;
        let request = self.requests.remove(pos);
        let requester = request.requester;

        if !granted {
            return Ok(Resolution::Denied { requester });
        }
        // Box removed while the request was pending
        let Some(b) = self.box_by_id_mut(request.box_id) else {
            return Ok(Resolution::Denied { requester });
        };
        if !b.eaters.contains(&requester) && b.owner != requester {
            b.eaters.push(requester);
        }
        let box_name = b.name.clone();
        let box_id = b.id;

        self.register_user(requester);
        let user = self.user_mut(requester)?;
        if !user.eats.contains(&box_id) && !user.owns.contains(&box_id) {
            user.eats.push(box_id);
        }
        if user.default.is_none() {
            user.default = Some(box_id);
        }
        Ok(Resolution::Granted {
            requester,
            box_id,
            box_name,
        })
    }

    /// Remove box `name`. Only its owner may do this.
    pub fn remove_box(&mut self, name: &str, requester: UserId) -> Result<MacaronBox, LedgerError> {
        self.user(requester)?;
        let pos = self
            .boxes
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| LedgerError::BoxNotFound(name.to_string()))?;
        if self.boxes[pos].owner != requester {
            return Err(LedgerError::NotOwner(name.to_string()));
        }
        let removed = self.boxes.remove(pos);

        for (uid, user) in self.users.iter_mut() {
            if *uid != removed.owner && !removed.eaters.contains(uid) {
                continue;
            }
            user.owns.retain(|id| *id != removed.id);
            user.eats.retain(|id| *id != removed.id);
            if user.default == Some(removed.id) {
                user.default = None;
            }
        }
        self.requests.retain(|r| r.box_id != removed.id);
        Ok(removed)
    }
}
