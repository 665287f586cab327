use chrono::{DateTime, Utc};
use log::{info, warn};

use super::core::{require_identifier, GitLabProvider};
use crate::error::{GitLabMcpError, Result, ResultExt};
use crate::providers::gitlab::api::{GitLabApi, PipelineQuery};
use crate::providers::gitlab::cancel::CancelToken;
use crate::providers::gitlab::pagination::collect_all_pages;
use crate::providers::gitlab::types::GitLabPipeline;
use crate::resources::{PipelineDeletionError, PipelineDeletionSummary, PipelineSummary};

const DAYS_PER_YEAR: f64 = 365.25;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Age of a pipeline at `now` as `(whole days, years rounded to 2 decimals)`.
///
/// Returns `(-1, -1.0)` when the creation time is unknown or in the future.
pub fn pipeline_age(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> (i64, f64) {
    let Some(created_at) = created_at else {
        return (-1, -1.0);
    };

    let elapsed = now.signed_duration_since(created_at);
    if elapsed < chrono::Duration::zero() {
        return (-1, -1.0);
    }

    #[allow(clippy::cast_precision_loss)]
    let days = elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
    let years = (days / DAYS_PER_YEAR * 100.0).round() / 100.0;

    (elapsed.num_days(), years)
}

/// Keeps pipelines created strictly before `cutoff` whose age is known.
fn select_old_pipelines(
    pipelines: Vec<GitLabPipeline>,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<PipelineSummary> {
    pipelines
        .into_iter()
        .filter_map(|pipeline| {
            let created_at = pipeline.created_at?;
            if created_at >= cutoff {
                return None;
            }

            let (age_days, age_years) = pipeline_age(Some(created_at), now);
            if age_days < 0 {
                return None;
            }

            Some(PipelineSummary {
                id: pipeline.id,
                iid: pipeline.iid,
                project_id: pipeline.project_id,
                status: pipeline.status,
                source: pipeline.source,
                ref_: pipeline.ref_,
                sha: pipeline.sha,
                web_url: pipeline.web_url,
                created_at: Some(created_at),
                updated_at: pipeline.updated_at,
                age_days,
                age_years,
            })
        })
        .collect()
}

impl<A: GitLabApi> GitLabProvider<A> {
    /// Lists a project's pipelines created strictly before `cutoff`, oldest
    /// first.
    ///
    /// The cutoff is also sent to GitLab as a filter, but every pipeline is
    /// re-checked locally. Pipelines without a creation time are left out.
    ///
    /// # Errors
    ///
    /// Fails on a blank project identifier, on any page fetch error, or on
    /// cancellation. No partial list is returned.
    pub async fn list_old_pipelines(
        &self,
        project_id_or_path: &str,
        cutoff: impl Into<DateTime<Utc>>,
        cancel: &CancelToken,
    ) -> Result<Vec<PipelineSummary>> {
        let project = require_identifier("project_id_or_path", project_id_or_path)?;
        let cutoff = cutoff.into();

        let query = PipelineQuery {
            created_before: Some(cutoff),
        };

        let api = &self.api;
        let pipelines = collect_all_pages(cancel, move |page| {
            api.list_project_pipelines(project, page, query)
        })
        .await
        .operation("list project pipelines")?;

        let fetched = pipelines.len();
        let old = select_old_pipelines(pipelines, cutoff, Utc::now());
        info!(
            "Project {project}: {} of {fetched} pipelines created before {}",
            old.len(),
            cutoff.to_rfc3339()
        );

        Ok(old)
    }

    /// Deletes every pipeline [`list_old_pipelines`](Self::list_old_pipelines)
    /// returns, oldest first.
    ///
    /// A failed delete is logged and recorded in `failed`; the batch carries on.
    ///
    /// # Errors
    ///
    /// Fails if the candidate listing fails. On cancellation the error is
    /// `Cancelled` with the summary accumulated so far.
    pub async fn delete_old_pipelines(
        &self,
        project_id_or_path: &str,
        cutoff: impl Into<DateTime<Utc>>,
        cancel: &CancelToken,
    ) -> Result<PipelineDeletionSummary> {
        let candidates = self
            .list_old_pipelines(project_id_or_path, cutoff, cancel)
            .await?;
        let project = project_id_or_path.trim();

        let mut summary = PipelineDeletionSummary {
            total_candidates: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            return Ok(summary);
        }

        for pipeline in candidates {
            if cancel.is_cancelled() {
                warn!(
                    "Pipeline deletion in project {project} cancelled after {}/{} candidates",
                    summary.deleted_ids.len() + summary.failed.len(),
                    summary.total_candidates
                );
                return Err(GitLabMcpError::Cancelled {
                    partial: Some(summary),
                });
            }

            match self.api.delete_pipeline(project, pipeline.id).await {
                Ok(()) => summary.deleted_ids.push(pipeline.id),
                Err(e) => {
                    warn!(
                        "Error deleting pipeline {} in project {project}: {e}",
                        pipeline.id
                    );
                    summary.failed.push(PipelineDeletionError {
                        pipeline_id: pipeline.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Deleted {}/{} pipelines in project {project}",
            summary.deleted_ids.len(),
            summary.total_candidates
        );

        Ok(summary)
    }
}
