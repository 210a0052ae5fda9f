use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Config;
use crate::repo::{CommentRepository, ProjectRepository, UserRepository};
use crate::services::{CommentService, ProjectService, SentinelUser};

#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub projects: ProjectRepository,
    pub comments: CommentRepository,
    pub comment_service: CommentService,
    pub project_service: ProjectService,
    pub pool: Arc<SqlitePool>,
}

impl AppState {
    pub fn new(pool: SqlitePool, sentinel: SentinelUser) -> Self {
        let pool = Arc::new(pool);
        let users = UserRepository::new(pool.clone());
        let projects = ProjectRepository::new(pool.clone());
        let comments = CommentRepository::new(pool.clone());

        Self {
            comment_service: CommentService::new(
                comments.clone(),
                projects.clone(),
                users.clone(),
            ),
            project_service: ProjectService::new(
                projects.clone(),
                comments.clone(),
                users.clone(),
                sentinel,
            ),
            users,
            projects,
            comments,
            pool,
        }
    }

    /// Open the pool, apply migrations and wire the repositories.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self::new(pool, config.sentinel.clone()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
