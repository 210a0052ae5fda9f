use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthorName, ProjectRef, UserSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on insert. Optional references are stored as NULL when absent.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub title: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub parent_comment_id: Option<Uuid>,
}

/// Query string of `GET /comments`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    pub project_id: Option<String>,
    pub parent_comment_id: Option<String>,
}

/// Resolved list filter. `parent_comment_id == None` selects root comments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub project_id: Option<Uuid>,
    pub parent_comment_id: Option<Uuid>,
}

/// Comment with its author, project and parent joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_image: Option<String>,
    pub project_name: Option<String>,
    pub parent_title: Option<String>,
    pub parent_author_id: Option<Uuid>,
    pub parent_author_name: Option<String>,
    pub parent_author_email: Option<String>,
    pub child_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentSummary {
    pub id: Uuid,
    pub title: String,
    pub author: Option<AuthorName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCount {
    pub child_comments: i64,
}

/// A direct reply, embedded one level deep under its parent.
#[derive(Debug, Clone, Serialize)]
pub struct ChildComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserSummary>,
}

/// Shape returned by list and get: includes the replies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetail {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserSummary>,
    pub parent_comment: Option<ParentSummary>,
    pub child_comments: Vec<ChildComment>,
    pub project: Option<ProjectRef>,
    #[serde(rename = "_count")]
    pub count: CommentCount,
}

/// Shape returned by create and update: no replies list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserSummary>,
    pub parent_comment: Option<ParentSummary>,
    pub project: Option<ProjectRef>,
    #[serde(rename = "_count")]
    pub count: CommentCount,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedComment {
    pub message: String,
    pub deleted_id: Uuid,
}

impl CommentRow {
    fn author(&self) -> Option<UserSummary> {
        self.comment.author_id.map(|id| UserSummary {
            id,
            name: self.author_name.clone(),
            email: self.author_email.clone(),
            image: self.author_image.clone(),
        })
    }

    fn project(&self) -> Option<ProjectRef> {
        match (self.comment.project_id, &self.project_name) {
            (Some(id), Some(name)) => Some(ProjectRef {
                id,
                name: name.clone(),
            }),
            _ => None,
        }
    }

    fn parent(&self) -> Option<ParentSummary> {
        match (self.comment.parent_comment_id, &self.parent_title) {
            (Some(id), Some(title)) => Some(ParentSummary {
                id,
                title: title.clone(),
                author: self.parent_author_id.map(|_| AuthorName {
                    name: self.parent_author_name.clone(),
                    email: self.parent_author_email.clone(),
                }),
            }),
            _ => None,
        }
    }

    pub fn into_detail(self, child_comments: Vec<ChildComment>) -> CommentDetail {
        CommentDetail {
            author: self.author(),
            parent_comment: self.parent(),
            project: self.project(),
            count: CommentCount {
                child_comments: self.child_count,
            },
            child_comments,
            comment: self.comment,
        }
    }

    pub fn into_summary(self) -> CommentSummary {
        CommentSummary {
            author: self.author(),
            parent_comment: self.parent(),
            project: self.project(),
            count: CommentCount {
                child_comments: self.child_count,
            },
            comment: self.comment,
        }
    }

    pub fn into_child(self) -> ChildComment {
        ChildComment {
            author: self.author(),
            comment: self.comment,
        }
    }
}
