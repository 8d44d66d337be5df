//! In-memory stores and a router harness for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::jwt::JwtKeys,
    error::{AppError, AppResult, FieldError, UniqueField},
    state::AppState,
    tasks::{
        repo::TaskStore,
        repo_types::{SortOrder, Task, TaskOwner, TaskQuery, TaskWithOwner},
    },
    users::{
        repo::UserStore,
        repo_types::{NewUser, User, UserChanges},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    last_tick: Option<OffsetDateTime>,
}

impl Tables {
    /// Strictly increasing so creation order is always recoverable.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    fn check_unique(&self, username: &str, email: &str, except: Option<i64>) -> AppResult<()> {
        let others = || self.users.iter().filter(|u| Some(u.id) != except);
        if others().any(|u| u.username == username) {
            return Err(AppError::Duplicate(UniqueField::Username));
        }
        if others().any(|u| u.email == email) {
            return Err(AppError::Duplicate(UniqueField::Email));
        }
        Ok(())
    }
}

/// Both stores behind one lock, enforcing the same constraints as the schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut t = self.tables();
        t.check_unique(&user.username, &user.email, None)?;
        let now = t.tick();
        let created = User {
            id: t.users.len() as i64 + 1,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> AppResult<Option<User>> {
        let mut t = self.tables();
        let Some(current) = t.users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };
        let username = changes.username.unwrap_or(current.username);
        let email = changes.email.unwrap_or(current.email);
        t.check_unique(&username, &email, Some(id))?;

        let now = t.tick();
        let updated = User {
            id,
            first_name: changes.first_name.unwrap_or(current.first_name),
            last_name: changes.last_name.unwrap_or(current.last_name),
            username,
            email,
            password_hash: changes.password_hash.unwrap_or(current.password_hash),
            role: changes.role.unwrap_or(current.role),
            created_at: current.created_at,
            updated_at: now,
        };
        if let Some(slot) = t.users.iter_mut().find(|u| u.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, user_id: i64, body: &str) -> AppResult<Task> {
        let mut t = self.tables();
        if !t.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::InvalidReference);
        }
        if body.trim().is_empty() {
            return Err(AppError::StoreValidation(vec![FieldError::new(
                "body",
                "violates check constraint \"tasks_body_check\"",
            )]));
        }
        let now = t.tick();
        let task = Task {
            id: t.tasks.len() as i64 + 1,
            body: body.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        t.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>> {
        Ok(self.tables().tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn update_body(&self, id: i64, body: &str) -> AppResult<Option<Task>> {
        let mut t = self.tables();
        let now = t.tick();
        Ok(t.tasks.iter_mut().find(|task| task.id == id).map(|task| {
            task.body = body.to_string();
            task.updated_at = now;
            task.clone()
        }))
    }

    async fn list(&self, query: &TaskQuery) -> AppResult<(Vec<TaskWithOwner>, i64)> {
        let t = self.tables();
        let mut matching: Vec<&Task> = t
            .tasks
            .iter()
            .filter(|task| query.owner.map_or(true, |owner| task.user_id == owner))
            .collect();
        matching.sort_by_key(|task| (task.created_at, task.id));
        if query.sort == SortOrder::Newest {
            matching.reverse();
        }
        let total = matching.len() as i64;

        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .filter_map(|task| {
                let owner = t.users.iter().find(|u| u.id == task.user_id)?;
                Some(TaskWithOwner {
                    task: task.clone(),
                    user: TaskOwner {
                        id: owner.id,
                        first_name: owner.first_name.clone(),
                        last_name: owner.last_name.clone(),
                        username: owner.username.clone(),
                        email: owner.email.clone(),
                    },
                })
            })
            .collect();
        Ok((page, total))
    }
}

pub struct Registered {
    pub id: i64,
    pub token: String,
}

/// The full router over a fresh [`MemoryStore`].
pub struct TestApp {
    router: Router,
    jwt: JwtKeys,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let jwt = state.jwt.clone();
        Self {
            router: build_app(state),
            jwt,
        }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Bytes) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    fn parse(bytes: &Bytes) -> Value {
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes).unwrap()
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_json(Method::GET, uri, token, None).await;
        (status, Self::parse(&bytes))
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, bytes) = self.send_json(Method::POST, uri, token, Some(body)).await;
        (status, Self::parse(&bytes))
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, bytes) = self.send_json(Method::PUT, uri, token, Some(body)).await;
        (status, Self::parse(&bytes))
    }

    /// Unparsed response, for byte-level comparisons.
    pub async fn post_raw(&self, uri: &str, body: Value) -> (StatusCode, Bytes) {
        self.send_json(Method::POST, uri, None, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_json(Method::DELETE, uri, token, None).await;
        (status, Self::parse(&bytes))
    }

    /// Sends `text` verbatim as a JSON body.
    pub async fn send_text(&self, method: &str, uri: &str, text: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::from_bytes(method.as_bytes()).unwrap())
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(text.to_string()))
            .unwrap();
        let (status, bytes) = self.send(req).await;
        (status, Self::parse(&bytes))
    }

    /// Registers `username` with password `password123` and first name `Test`.
    pub async fn register(&self, username: &str, role: &str) -> Registered {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "firstName": "Test",
                    "lastName": "User",
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password123",
                    "role": role
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
        Registered {
            id: body["user"]["id"].as_i64().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub fn token_for(&self, user_id: i64) -> String {
        self.jwt.issue(user_id).unwrap()
    }

    /// Issued a day ago, well past the test TTL.
    pub fn expired_token(&self, user_id: i64) -> String {
        self.jwt
            .issue_at(user_id, OffsetDateTime::now_utc() - Duration::days(1))
            .unwrap()
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn task_for_unknown_owner_is_invalid_reference() {
        let store = MemoryStore::default();
        let err = TaskStore::create(&store, 999, "orphan").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid reference.");
    }
}
