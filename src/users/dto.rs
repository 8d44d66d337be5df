use serde::{Deserialize, Serialize};

use super::repo_types::{Role, User};
use crate::{
    auth::credentials::ProfileChanges,
    error::AppResult,
    validation::{Checks, Patch, Presence},
};

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            username: u.username,
            email: u.email,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdatedResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// Body of `PUT /api/users/me` and `PUT /api/users/:id`. `role` is only
/// honoured on the admin route.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Patch<String>,
    #[serde(default)]
    pub last_name: Patch<String>,
    #[serde(default)]
    pub username: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub password: Patch<String>,
    #[serde(default)]
    pub role: Patch<String>,
}

impl UpdateProfileRequest {
    /// Validates the present fields and turns them into store changes.
    /// `allow_role` is false for self-service updates, which drop `role`
    /// without looking at it.
    pub fn into_changes(self, allow_role: bool) -> AppResult<ProfileChanges> {
        let mut checks = Checks::new();

        let first_name = trimmed(self.first_name);
        let last_name = trimmed(self.last_name);
        let username = trimmed(self.username);
        let email = trimmed(self.email);

        match &first_name {
            Patch::Value(v) => checks.name("firstName", "First name", v, Presence::Optional),
            Patch::Null => checks.null("firstName", "First name"),
            Patch::Absent => {}
        }
        match &last_name {
            Patch::Value(v) => checks.name("lastName", "Last name", v, Presence::Optional),
            Patch::Null => checks.null("lastName", "Last name"),
            Patch::Absent => {}
        }
        match &username {
            Patch::Value(v) => checks.username(v, Presence::Optional),
            Patch::Null => checks.null("username", "Username"),
            Patch::Absent => {}
        }
        match &email {
            Patch::Value(v) => checks.email(v, Presence::Optional),
            Patch::Null => checks.null("email", "Email"),
            Patch::Absent => {}
        }
        match &self.password {
            Patch::Value(v) => checks.password(v, Presence::Optional),
            Patch::Null => checks.null("password", "Password"),
            Patch::Absent => {}
        }

        let mut role = None;
        if allow_role {
            match self.role {
                Patch::Value(v) => {
                    checks.role(&v);
                    role = Role::try_from(v).ok();
                }
                Patch::Null => checks.null("role", "Role"),
                Patch::Absent => {}
            }
        }

        checks.finish()?;
        Ok(ProfileChanges {
            first_name: first_name.into_option(),
            last_name: last_name.into_option(),
            username: username.into_option(),
            email: email.into_option(),
            password: self.password.into_option(),
            role,
        })
    }
}

fn trimmed(p: Patch<String>) -> Patch<String> {
    p.map(|v| v.trim().to_string())
}
