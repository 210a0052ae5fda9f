use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthorName, CommentDetail, UserSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        ProjectStatus::Todo,
        ProjectStatus::InProgress,
        ProjectStatus::Review,
        ProjectStatus::Done,
        ProjectStatus::Blocked,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Todo => "TODO",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Review => "REVIEW",
            ProjectStatus::Done => "DONE",
            ProjectStatus::Blocked => "BLOCKED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid status: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: String,
    pub priority: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentCommentRow {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComment {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<AuthorName>,
}

impl From<RecentCommentRow> for RecentComment {
    fn from(r: RecentCommentRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            created_at: r.created_at,
            author: r.author_id.map(|_| AuthorName {
                name: r.author_name,
                email: r.author_email,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectCount {
    pub users: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectCreator {
    #[serde(flatten)]
    pub user: UserSummary,
    pub role: String,
}

/// Shape returned by list, create and update.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOverview {
    #[serde(flatten)]
    pub project: Project,
    pub creator: Option<UserSummary>,
    pub users: Vec<ProjectMember>,
    pub comments: Vec<RecentComment>,
    #[serde(rename = "_count")]
    pub count: ProjectCount,
}

/// Shape returned by get: every comment of the project with its thread.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub creator: Option<ProjectCreator>,
    pub users: Vec<ProjectMember>,
    pub comments: Vec<CommentDetail>,
    #[serde(rename = "_count")]
    pub count: ProjectCount,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub comments_count: i64,
    pub users_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProject {
    pub message: String,
    pub deleted_project: DeletedProjectSummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: i64,
    pub total_comments: i64,
    pub active_projects: i64,
    pub completed_projects: i64,
}
