use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, CommentFilter, CommentRow, NewComment};

/// Comment columns plus author, project, parent and reply count.
const COMMENT_ROW_SELECT: &str = r#"
    SELECT c.id, c.title, c.content, c.author_id, c.project_id, c.parent_comment_id,
           c.created_at, c.updated_at,
           a.name AS author_name, a.email AS author_email, a.image AS author_image,
           p.name AS project_name,
           pc.title AS parent_title,
           pc.author_id AS parent_author_id,
           pa.name AS parent_author_name, pa.email AS parent_author_email,
           (SELECT COUNT(*) FROM comments cc WHERE cc.parent_comment_id = c.id) AS child_count
    FROM comments c
    LEFT JOIN users a ON a.id = c.author_id
    LEFT JOIN projects p ON p.id = c.project_id
    LEFT JOIN comments pc ON pc.id = c.parent_comment_id
    LEFT JOIN users pa ON pa.id = pc.author_id
"#;

#[derive(Clone)]
pub struct CommentRepository {
    pool: Arc<SqlitePool>,
}

impl CommentRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &NewComment) -> Result<Comment> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, title, content, author_id, project_id, parent_comment_id,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.author_id)
        .bind(input.project_id)
        .bind(input.parent_comment_id)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(comment)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(comment)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Comment> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound("Comment"))
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }

    /// Parent id of a comment; `None` when the comment does not exist.
    pub async fn parent_of(&self, id: Uuid) -> Result<Option<Option<Uuid>>> {
        let parent = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT parent_comment_id FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(parent)
    }

    pub async fn find_row(&self, id: Uuid) -> Result<Option<CommentRow>> {
        let mut query = QueryBuilder::<Sqlite>::new(COMMENT_ROW_SELECT);
        query.push(" WHERE c.id = ").push_bind(id);

        let row = query
            .build_query_as::<CommentRow>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row)
    }

    /// Comments matching the filter, newest first.
    pub async fn list_rows(&self, filter: CommentFilter) -> Result<Vec<CommentRow>> {
        let mut query = QueryBuilder::<Sqlite>::new(COMMENT_ROW_SELECT);

        match filter.parent_comment_id {
            Some(parent_id) => {
                query.push(" WHERE c.parent_comment_id = ").push_bind(parent_id);
            }
            None => {
                query.push(" WHERE c.parent_comment_id IS NULL");
            }
        }
        if let Some(project_id) = filter.project_id {
            query.push(" AND c.project_id = ").push_bind(project_id);
        }
        query.push(" ORDER BY c.created_at DESC, c.rowid DESC");

        let rows = query
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows)
    }

    /// Every comment attached to a project, replies included, newest first.
    pub async fn list_rows_by_project(&self, project_id: Uuid) -> Result<Vec<CommentRow>> {
        let mut query = QueryBuilder::<Sqlite>::new(COMMENT_ROW_SELECT);
        query
            .push(" WHERE c.project_id = ")
            .push_bind(project_id)
            .push(" ORDER BY c.created_at DESC, c.rowid DESC");

        let rows = query
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows)
    }

    /// Direct replies of all given comments, oldest first.
    pub async fn list_children_of(&self, parent_ids: &[Uuid]) -> Result<Vec<CommentRow>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(COMMENT_ROW_SELECT);
        query.push(" WHERE c.parent_comment_id IN (");
        let mut ids = query.separated(", ");
        for id in parent_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        query.push(" ORDER BY c.created_at ASC, c.rowid ASC");

        let rows = query
            .build_query_as::<CommentRow>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows)
    }

    /// Replace every editable field. Callers resolve "keep" values beforehand.
    pub async fn update(&self, id: Uuid, input: &NewComment) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET title = $2,
                content = $3,
                author_id = $4,
                project_id = $5,
                parent_comment_id = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.author_id)
        .bind(input.project_id)
        .bind(input.parent_comment_id)
        .bind(Utc::now())
        .fetch_optional(self.pool.as_ref())
        .await?;

        comment.ok_or(AppError::NotFound("Comment"))
    }

    /// Delete a comment. Replies are removed by the foreign key cascade.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment"));
        }

        Ok(())
    }

    pub async fn count_children(&self, id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments WHERE parent_comment_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    pub async fn count_by_project(&self, project_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }

    pub async fn count_all(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
