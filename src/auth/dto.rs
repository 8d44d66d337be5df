use serde::{Deserialize, Serialize};

use super::credentials::Profile;
use crate::{
    error::AppResult,
    users::{dto::PublicUser, repo_types::Role},
    validation::{Checks, Patch, Presence},
};

/// Request body for user registration. Missing keys deserialize as empty
/// strings so they are reported per field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Patch<String>,
}

impl RegisterRequest {
    /// Validates and normalizes the payload; returns the profile and the
    /// plaintext password.
    pub fn into_profile(self) -> AppResult<(Profile, String)> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();

        let mut checks = Checks::new();
        checks.name("firstName", "First name", &first_name, Presence::Required);
        checks.name("lastName", "Last name", &last_name, Presence::Required);
        checks.username(&username, Presence::Required);
        checks.email(&email, Presence::Required);
        checks.password(&self.password, Presence::Required);
        match &self.role {
            Patch::Value(role) => checks.role(role),
            Patch::Null => checks.null("role", "Role"),
            Patch::Absent => {}
        }
        checks.finish()?;

        // anyone may ask for admin at sign-up
        let role = match self.role {
            Patch::Value(r) if r == "admin" => Role::Admin,
            _ => Role::default(),
        };

        Ok((
            Profile {
                first_name,
                last_name,
                username,
                email,
                role,
            },
            self.password,
        ))
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&mut self) -> AppResult<()> {
        self.username = self.username.trim().to_string();
        let mut checks = Checks::new();
        checks.required("username", "Username", &self.username);
        checks.required("password", "Password", &self.password);
        checks.finish()
    }
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: PublicUser,
}
