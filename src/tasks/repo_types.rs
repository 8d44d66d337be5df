use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Public profile of a task's owner, embedded in listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOwner {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskWithOwner {
    #[serde(flatten)]
    pub task: Task,
    pub user: TaskOwner,
}

/// Flat join row, split into [`TaskWithOwner`].
#[derive(Debug, FromRow)]
pub struct TaskWithOwnerRow {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl From<TaskWithOwnerRow> for TaskWithOwner {
    fn from(r: TaskWithOwnerRow) -> Self {
        Self {
            user: TaskOwner {
                id: r.user_id,
                first_name: r.first_name,
                last_name: r.last_name,
                username: r.username,
                email: r.email,
            },
            task: Task {
                id: r.id,
                body: r.body,
                user_id: r.user_id,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    /// Anything other than `oldest` sorts newest first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("oldest") => SortOrder::Oldest,
            _ => SortOrder::Newest,
        }
    }

    pub(crate) fn sql(&self) -> &'static str {
        match self {
            SortOrder::Newest => "DESC",
            SortOrder::Oldest => "ASC",
        }
    }
}

/// One page of a task listing.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    /// `None` lists every owner's tasks.
    pub owner: Option<i64>,
    pub sort: SortOrder,
    pub limit: i64,
    pub offset: i64,
}
