use serde::{Deserialize, Serialize};

use super::repo_types::{SortOrder, Task, TaskWithOwner};
use crate::{error::AppResult, validation::Checks};

pub const PAGE_SIZE: i64 = 10;

/// Body of `POST /api/tasks` and `PUT /api/tasks/:id`.
#[derive(Debug, Deserialize)]
pub struct TaskBodyRequest {
    #[serde(default)]
    pub body: String,
}

impl TaskBodyRequest {
    /// Returns the trimmed body.
    pub fn into_body(self) -> AppResult<String> {
        let body = self.body.trim().to_string();
        let mut checks = Checks::new();
        checks.required("body", "Task body", &body);
        checks.finish()?;
        Ok(body)
    }
}

/// Query of `GET /api/tasks`. Both values are read leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub sort: Option<String>,
}

impl ListQuery {
    /// Missing, unparsable or non-positive pages read as page 1.
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    pub fn sort(&self) -> SortOrder {
        SortOrder::parse(self.sort.as_deref())
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: &'static str,
    pub task: Task,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_tasks: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = (total + limit - 1) / limit;
        Self {
            current_page: page,
            total_pages,
            total_tasks: total,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskWithOwner>,
    pub pagination: Pagination,
}
