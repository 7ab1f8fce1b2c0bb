//! Access policy for catalog entities.
//!
//! Each rule is a plain predicate over the request's [`Caller`] and the kind
//! of [`Access`] requested. Reads are open to everyone; the rules only differ
//! in who may write. Rules are combined with [`all_of`], which stops at the
//! first rejection.
//!
//! Anonymous writers are rejected with [`CoreError::Unauthorized`]; known
//! callers lacking privilege or ownership get [`CoreError::Forbidden`].

use crate::error::CoreError;
use crate::types::DbId;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: DbId,
    pub username: String,
    pub is_staff: bool,
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(Identity),
}

impl Caller {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Anonymous => None,
            Caller::User(identity) => Some(identity),
        }
    }

    /// Return the identity, or reject the request as unauthenticated.
    pub fn require_identity(&self) -> Result<&Identity, CoreError> {
        self.identity().ok_or_else(|| {
            CoreError::Unauthorized("Authentication credentials were not provided".into())
        })
    }
}

/// The kind of operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// list / retrieve
    Read,
    /// create / update / delete
    Write,
}

/// A composable access rule.
pub type Rule<'a> = &'a dyn Fn(&Caller, Access) -> Result<(), CoreError>;

/// Anyone may read; only authenticated callers may write.
pub fn authenticated_or_read_only(caller: &Caller, access: Access) -> Result<(), CoreError> {
    if access == Access::Read {
        return Ok(());
    }
    caller.require_identity().map(|_| ())
}

/// Anyone may read; only authenticated staff accounts may write.
pub fn staff_or_read_only(caller: &Caller, access: Access) -> Result<(), CoreError> {
    if access == Access::Read {
        return Ok(());
    }
    let identity = caller.require_identity()?;
    if !identity.is_staff {
        return Err(CoreError::Forbidden("Staff privileges required".into()));
    }
    Ok(())
}

/// Build a rule allowing writes only by the recorded owner `owner_id`.
pub fn owner_or_read_only(owner_id: DbId) -> impl Fn(&Caller, Access) -> Result<(), CoreError> {
    move |caller, access| {
        if access == Access::Read {
            return Ok(());
        }
        let identity = caller.require_identity()?;
        if identity.user_id != owner_id {
            return Err(CoreError::Forbidden(
                "Only the owner may modify this product".into(),
            ));
        }
        Ok(())
    }
}

/// Evaluate every rule in order, returning the first rejection.
pub fn all_of(rules: &[Rule<'_>], caller: &Caller, access: Access) -> Result<(), CoreError> {
    rules.iter().try_for_each(|rule| rule(caller, access))
}

/// Category mutations: staff-or-read-only.
pub fn check_category_access(caller: &Caller, access: Access) -> Result<(), CoreError> {
    staff_or_read_only(caller, access)
}

/// Product creation: any authenticated caller.
pub fn check_product_create(caller: &Caller) -> Result<(), CoreError> {
    authenticated_or_read_only(caller, Access::Write)
}

/// Access to an existing product owned by `owner_id`.
pub fn check_product_access(
    caller: &Caller,
    owner_id: DbId,
    access: Access,
) -> Result<(), CoreError> {
    let owner_rule = owner_or_read_only(owner_id);
    let rules: [Rule<'_>; 2] = [&authenticated_or_read_only, &owner_rule];
    all_of(&rules, caller, access)
}
