use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    DashboardStats, DeletedProject, DeletedProjectSummary, Project, ProjectCount, ProjectCreator,
    ProjectDetail, ProjectOverview, ProjectStatus, RecentComment, User, UserSummary,
};
use crate::repo::{CommentRepository, ProjectRepository, UserRepository};
use crate::services::thread;
use crate::validation::ProjectInput;

/// Number of comments embedded in a project overview.
pub const RECENT_COMMENTS_LIMIT: i64 = 5;

/// Placeholder account used as creator when no session user is known.
#[derive(Debug, Clone)]
pub struct SentinelUser {
    pub email: String,
    pub name: String,
}

impl Default for SentinelUser {
    fn default() -> Self {
        Self {
            email: "temp@example.com".to_string(),
            name: "Temporary User".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ProjectService {
    projects: ProjectRepository,
    comments: CommentRepository,
    users: UserRepository,
    sentinel: SentinelUser,
}

impl ProjectService {
    pub fn new(
        projects: ProjectRepository,
        comments: CommentRepository,
        users: UserRepository,
        sentinel: SentinelUser,
    ) -> Self {
        Self {
            projects,
            comments,
            users,
            sentinel,
        }
    }

    pub async fn list(&self) -> Result<Vec<ProjectOverview>> {
        let projects = self.projects.list_all().await?;
        self.overviews(projects).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ProjectOverview>> {
        self.users.get_by_id(user_id).await?;
        let projects = self.projects.list_for_user(user_id).await?;
        self.overviews(projects).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ProjectDetail> {
        let project = self.projects.get_by_id(id).await?;

        let creator = match project.creator_id {
            Some(creator_id) => self.users.find_by_id(creator_id).await?.map(|user| {
                let role = user.role.clone();
                ProjectCreator {
                    user: user.into(),
                    role,
                }
            }),
            None => None,
        };
        let users = self.projects.list_members(id).await?;
        let rows = self.comments.list_rows_by_project(id).await?;
        let children = self.comments.list_children_of(&thread::ids(&rows)).await?;
        let count = ProjectCount {
            users: users.len() as i64,
            comments: rows.len() as i64,
        };

        Ok(ProjectDetail {
            project,
            creator,
            users,
            comments: thread::assemble(rows, children),
            count,
        })
    }

    /// `creator` is the session user; without one the sentinel user is
    /// provisioned on first use and reused afterwards.
    pub async fn create(&self, input: ProjectInput, creator: Option<User>) -> Result<ProjectOverview> {
        let creator_id = match creator {
            Some(user) => user.id,
            None => {
                self.users
                    .find_or_create_by_email(&self.sentinel.email, &self.sentinel.name)
                    .await?
                    .id
            }
        };

        let project = self.projects.create(&input, Some(creator_id)).await?;
        info!(project_id = %project.id, creator_id = %creator_id, "Project created");

        self.overview(project).await
    }

    /// Status may move between any two values.
    pub async fn update(&self, id: Uuid, input: ProjectInput) -> Result<ProjectOverview> {
        self.projects.get_by_id(id).await?;

        let project = self.projects.update(id, &input).await?;
        info!(project_id = %id, status = %project.status, "Project updated");

        self.overview(project).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeletedProject> {
        let project = self.projects.get_by_id(id).await?;
        let comments_count = self.comments.count_by_project(id).await?;
        let users_count = self.projects.count_members(id).await?;

        self.projects.delete(id).await?;
        info!(project_id = %id, comments = comments_count, "Project deleted");

        Ok(DeletedProject {
            message: "Project deleted".to_string(),
            deleted_project: DeletedProjectSummary {
                id: project.id,
                name: project.name,
                comments_count,
                users_count,
            },
        })
    }

    pub async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        self.projects.get_by_id(project_id).await?;
        self.users.get_by_id(user_id).await?;
        self.projects.add_member(project_id, user_id).await?;
        info!(project_id = %project_id, user_id = %user_id, "User assigned to project");
        Ok(())
    }

    pub async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> Result<()> {
        self.projects.get_by_id(project_id).await?;
        self.users.get_by_id(user_id).await?;
        self.projects.remove_member(project_id, user_id).await?;
        info!(project_id = %project_id, user_id = %user_id, "User removed from project");
        Ok(())
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        Ok(DashboardStats {
            total_projects: self.projects.count_all().await?,
            total_comments: self.comments.count_all().await?,
            active_projects: self.projects.count_by_status(ProjectStatus::InProgress).await?,
            completed_projects: self.projects.count_by_status(ProjectStatus::Done).await?,
        })
    }

    async fn overviews(&self, projects: Vec<Project>) -> Result<Vec<ProjectOverview>> {
        let mut overviews = Vec::with_capacity(projects.len());
        for project in projects {
            overviews.push(self.overview(project).await?);
        }
        Ok(overviews)
    }

    async fn overview(&self, project: Project) -> Result<ProjectOverview> {
        let creator = match project.creator_id {
            Some(creator_id) => self
                .users
                .find_by_id(creator_id)
                .await?
                .map(UserSummary::from),
            None => None,
        };
        let users = self.projects.list_members(project.id).await?;
        let comments = self
            .projects
            .recent_comments(project.id, RECENT_COMMENTS_LIMIT)
            .await?
            .into_iter()
            .map(RecentComment::from)
            .collect();
        let count = ProjectCount {
            users: users.len() as i64,
            comments: self.comments.count_by_project(project.id).await?,
        };

        Ok(ProjectOverview {
            project,
            creator,
            users,
            comments,
            count,
        })
    }
}
