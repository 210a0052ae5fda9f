use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Project, ProjectMember, ProjectStatus, RecentCommentRow};
use crate::validation::ProjectInput;

#[derive(Clone)]
pub struct ProjectRepository {
    pool: Arc<SqlitePool>,
}

impl ProjectRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &ProjectInput, creator_id: Option<Uuid>) -> Result<Project> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, description, image, status, priority,
                                  start_date, end_date, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.status.as_str())
        .bind(input.priority)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(creator_id)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(project)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(project)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Project> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound("Project"))
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(projects)
    }

    /// Projects created by or assigned to a user, newest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE creator_id = $1
               OR id IN (SELECT project_id FROM project_users WHERE user_id = $1)
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(projects)
    }

    /// Replace every editable field. The creator is left untouched.
    pub async fn update(&self, id: Uuid, input: &ProjectInput) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $2,
                description = $3,
                image = $4,
                status = $5,
                priority = $6,
                start_date = $7,
                end_date = $8,
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.status.as_str())
        .bind(input.priority)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(Utc::now())
        .fetch_optional(self.pool.as_ref())
        .await?;

        project.ok_or(AppError::NotFound("Project"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project"));
        }

        Ok(())
    }

    pub async fn list_members(&self, project_id: Uuid) -> Result<Vec<ProjectMember>> {
        let members = sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT u.id, u.name, u.email, u.role
            FROM users u
            INNER JOIN project_users pu ON pu.user_id = u.id
            WHERE pu.project_id = $1
            ORDER BY pu.created_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(members)
    }

    pub async fn count_members(&self, project_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_users WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    /// Assign a user to a project. Assigning twice is a no-op.
    pub async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_users (project_id, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM project_users WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(self.pool.as_ref())
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project member"));
        }

        Ok(())
    }

    pub async fn recent_comments(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RecentCommentRow>> {
        let rows = sqlx::query_as::<_, RecentCommentRow>(
            r#"
            SELECT c.id, c.title, c.created_at, c.author_id,
                   u.name AS author_name, u.email AS author_email
            FROM comments c
            LEFT JOIN users u ON u.id = c.author_id
            WHERE c.project_id = $1
            ORDER BY c.created_at DESC, c.rowid DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    pub async fn count_all(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    pub async fn count_by_status(&self, status: ProjectStatus) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
