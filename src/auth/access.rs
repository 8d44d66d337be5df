//! Who may do what. Every role and ownership decision in the service is read
//! from [`RULES`]; route gates and handlers must not branch on roles directly.

use crate::{
    error::{AppError, AppResult},
    users::repo_types::Role,
};

use super::extractors::CurrentUser;

pub const ROLE_DENIED: &str = "Access denied. Insufficient permissions.";
pub const TASK_NOT_OWNED: &str = "Access denied. You can only update your own tasks.";
pub const PROFILE_NOT_OWNED: &str = "Access denied. You can only update your own profile.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Task,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    List,
    Read,
    Update,
    /// Update through the admin route, targeting any user by id.
    UpdateAny,
}

/// Which records a role may touch for a given action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Denied,
    Own,
    All,
}

struct Rule {
    resource: Resource,
    action: Action,
    role: Role,
    reach: Reach,
}

const fn rule(resource: Resource, action: Action, role: Role, reach: Reach) -> Rule {
    Rule {
        resource,
        action,
        role,
        reach,
    }
}

const RULES: &[Rule] = &[
    // tasks model work done by basic users; admins supervise
    rule(Resource::Task, Action::Create, Role::Basic, Reach::Own),
    rule(Resource::Task, Action::Create, Role::Admin, Reach::Denied),
    rule(Resource::Task, Action::List, Role::Basic, Reach::Own),
    rule(Resource::Task, Action::List, Role::Admin, Reach::All),
    rule(Resource::Task, Action::Update, Role::Basic, Reach::Own),
    rule(Resource::Task, Action::Update, Role::Admin, Reach::All),
    rule(Resource::Profile, Action::Read, Role::Basic, Reach::Own),
    rule(Resource::Profile, Action::Read, Role::Admin, Reach::Own),
    rule(Resource::Profile, Action::Update, Role::Basic, Reach::Own),
    rule(Resource::Profile, Action::Update, Role::Admin, Reach::Own),
    rule(Resource::Profile, Action::UpdateAny, Role::Basic, Reach::Denied),
    rule(Resource::Profile, Action::UpdateAny, Role::Admin, Reach::All),
];

/// Missing rules deny.
pub fn reach(resource: Resource, action: Action, role: Role) -> Reach {
    RULES
        .iter()
        .find(|r| r.resource == resource && r.action == action && r.role == role)
        .map(|r| r.reach)
        .unwrap_or(Reach::Denied)
}

/// Coarse check used before a handler knows which record is involved.
pub fn ensure_allowed(resource: Resource, action: Action, caller: &CurrentUser) -> AppResult<Reach> {
    match reach(resource, action, caller.role) {
        Reach::Denied => Err(AppError::Forbidden(ROLE_DENIED)),
        reach => Ok(reach),
    }
}

/// Ownership gate: the caller may act on a record owned by `owner_id`.
pub fn ensure_owner_or_elevated(
    resource: Resource,
    action: Action,
    caller: &CurrentUser,
    owner_id: i64,
) -> AppResult<()> {
    match ensure_allowed(resource, action, caller)? {
        Reach::All => Ok(()),
        Reach::Own if owner_id == caller.id => Ok(()),
        _ => Err(AppError::Forbidden(match resource {
            Resource::Task => TASK_NOT_OWNED,
            Resource::Profile => PROFILE_NOT_OWNED,
        })),
    }
}

/// Owner filter for listings: `None` means every owner.
pub fn list_scope(resource: Resource, caller: &CurrentUser) -> AppResult<Option<i64>> {
    match ensure_allowed(resource, Action::List, caller)? {
        Reach::All => Ok(None),
        _ => Ok(Some(caller.id)),
    }
}
