use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CommentDetail, CommentFilter, CommentSummary, DeletedComment, NewComment,
};
use crate::repo::{CommentRepository, ProjectRepository, UserRepository};
use crate::services::thread::{self, MAX_THREAD_DEPTH};
use crate::validation::{CommentInput, Patch};

#[derive(Clone)]
pub struct CommentService {
    comments: CommentRepository,
    projects: ProjectRepository,
    users: UserRepository,
}

impl CommentService {
    pub fn new(
        comments: CommentRepository,
        projects: ProjectRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            comments,
            projects,
            users,
        }
    }

    /// Without a parent filter only root comments are listed.
    pub async fn list(&self, filter: CommentFilter) -> Result<Vec<CommentDetail>> {
        let rows = self.comments.list_rows(filter).await?;
        let children = self.comments.list_children_of(&thread::ids(&rows)).await?;
        Ok(thread::assemble(rows, children))
    }

    pub async fn get(&self, id: Uuid) -> Result<CommentDetail> {
        let row = self
            .comments
            .find_row(id)
            .await?
            .ok_or(AppError::NotFound("Comment"))?;
        let children = self.comments.list_children_of(&[id]).await?;

        thread::assemble(vec![row], children)
            .pop()
            .ok_or(AppError::NotFound("Comment"))
    }

    pub async fn create(&self, input: CommentInput) -> Result<CommentSummary> {
        self.check_author(&input.author_id).await?;
        self.check_project(&input.project_id).await?;
        if let Some(parent_id) = input.parent_comment_id.as_set() {
            if !self.comments.exists(*parent_id).await? {
                return Err(AppError::NotFound("Parent comment"));
            }
        }

        let comment = self
            .comments
            .create(&NewComment {
                title: input.title,
                content: input.content,
                author_id: input.author_id.into_option(),
                project_id: input.project_id.into_option(),
                parent_comment_id: input.parent_comment_id.into_option(),
            })
            .await?;

        info!(
            comment_id = %comment.id,
            parent_id = ?comment.parent_comment_id,
            "Comment created"
        );

        self.summary(comment.id).await
    }

    /// Full replace of the editable fields. Optional ids left out of the
    /// payload keep their stored value; explicit nulls clear them.
    pub async fn update(&self, id: Uuid, input: CommentInput) -> Result<CommentSummary> {
        let existing = self.comments.get_by_id(id).await?;

        self.check_author(&input.author_id).await?;
        self.check_project(&input.project_id).await?;
        if let Some(parent_id) = input.parent_comment_id.as_set() {
            self.check_new_parent(id, *parent_id).await?;
        }

        let comment = self
            .comments
            .update(
                id,
                &NewComment {
                    title: input.title,
                    content: input.content,
                    author_id: input.author_id.apply(existing.author_id),
                    project_id: input.project_id.apply(existing.project_id),
                    parent_comment_id: input
                        .parent_comment_id
                        .apply(existing.parent_comment_id),
                },
            )
            .await?;

        info!(comment_id = %comment.id, "Comment updated");

        self.summary(comment.id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeletedComment> {
        self.comments.get_by_id(id).await?;

        let children = self.comments.count_children(id).await?;
        if children > 0 {
            info!(comment_id = %id, children, "Deleting comment together with its replies");
        }

        self.comments.delete(id).await?;
        info!(comment_id = %id, "Comment deleted");

        Ok(DeletedComment {
            message: "Comment deleted".to_string(),
            deleted_id: id,
        })
    }

    async fn summary(&self, id: Uuid) -> Result<CommentSummary> {
        let row = self
            .comments
            .find_row(id)
            .await?
            .ok_or(AppError::NotFound("Comment"))?;
        Ok(row.into_summary())
    }

    async fn check_author(&self, author_id: &Patch<Uuid>) -> Result<()> {
        if let Some(author_id) = author_id.as_set() {
            if !self.users.exists(*author_id).await? {
                return Err(AppError::NotFound("User"));
            }
        }
        Ok(())
    }

    async fn check_project(&self, project_id: &Patch<Uuid>) -> Result<()> {
        if let Some(project_id) = project_id.as_set() {
            if !self.projects.exists(*project_id).await? {
                return Err(AppError::NotFound("Project"));
            }
        }
        Ok(())
    }

    /// A comment cannot become a reply to itself or to one of its own replies.
    async fn check_new_parent(&self, id: Uuid, parent_id: Uuid) -> Result<()> {
        let mut current = Some(parent_id);
        for depth in 0..MAX_THREAD_DEPTH {
            let Some(ancestor) = current else {
                return Ok(());
            };
            if ancestor == id {
                return Err(AppError::invalid(
                    "parentCommentId",
                    "A comment cannot reply to itself or to one of its replies",
                ));
            }
            current = match self.comments.parent_of(ancestor).await? {
                Some(next) => next,
                None if depth == 0 => return Err(AppError::NotFound("Parent comment")),
                None => None,
            };
        }
        if current.is_none() {
            return Ok(());
        }

        Err(AppError::invalid(
            "parentCommentId",
            format!("Reply chain deeper than {} levels", MAX_THREAD_DEPTH),
        ))
    }
}
