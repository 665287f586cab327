use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::resources::ProjectDetails;

use super::types::{GitLabGroup, GitLabPipeline, GitLabProject};

/// Page size used for every listing.
pub const PAGE_SIZE: u32 = 100;

/// One page of a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }

    pub fn at(page: u32) -> Self {
        Self {
            page,
            per_page: PAGE_SIZE,
        }
    }
}

/// Items of one page plus the cursor for the next one.
///
/// `next_page == None` is the only end-of-listing signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

/// Server-side filters for a pipeline listing.
///
/// Listings always come back oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineQuery {
    pub created_before: Option<DateTime<Utc>>,
}

/// Remote operations the traversal engine needs from GitLab.
///
/// Group identifiers may be numeric IDs or full paths; listings take the
/// numeric ID of an already-resolved group.
pub trait GitLabApi: Send + Sync {
    fn get_group(&self, group_id_or_path: &str) -> impl Future<Output = Result<GitLabGroup>> + Send;

    /// `archived = Some(true)` restricts the listing to archived projects;
    /// `None` sends no filter.
    fn list_group_projects(
        &self,
        group_id: u64,
        page: PageRequest,
        archived: Option<bool>,
    ) -> impl Future<Output = Result<Page<GitLabProject>>> + Send;

    /// All subgroups below the group, at every depth.
    fn list_descendant_groups(
        &self,
        group_id: u64,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<GitLabGroup>>> + Send;

    /// Immediate children of the group only.
    fn list_subgroups(
        &self,
        group_id: u64,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<GitLabGroup>>> + Send;

    fn list_project_pipelines(
        &self,
        project_id_or_path: &str,
        page: PageRequest,
        query: PipelineQuery,
    ) -> impl Future<Output = Result<Page<GitLabPipeline>>> + Send;

    fn delete_pipeline(
        &self,
        project_id_or_path: &str,
        pipeline_id: u64,
    ) -> impl Future<Output = Result<()>> + Send;

    fn archive_project(
        &self,
        project_id_or_path: &str,
    ) -> impl Future<Output = Result<ProjectDetails>> + Send;

    fn get_project(
        &self,
        project_id_or_path: &str,
    ) -> impl Future<Output = Result<ProjectDetails>> + Send;
}
