use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::auth::Token;
use crate::config::Config;
use crate::error::GitLabMcpError;
use crate::output::{self, Spinner};
use crate::providers::gitlab::{CancelToken, GitLabClient, GitLabProvider};
use crate::resources::GroupProjects;
use crate::server::{cutoff_from_years, serve_http, serve_stdio, McpServer, TOOLS};

#[derive(Parser)]
#[command(name = "gitlab-mcp-server")]
#[command(author, version, about = "GitLab group and pipeline housekeeping over MCP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, env = "GITLAB_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitLab instance base URL
    #[arg(short, long, global = true, env = "GITLAB_SERVER_URL")]
    url: Option<String>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP tools over stdin/stdout, or over HTTP with --http
    Serve {
        #[arg(long)]
        http: bool,

        /// HTTP listen address when using --http
        #[arg(long, default_value = ":8000", requires = "http")]
        addr: String,
    },

    /// List the projects of a group and, unless --direct, all its subgroups
    Projects {
        #[arg(short, long)]
        group: String,

        /// Only archived projects (ignored with --direct)
        #[arg(long)]
        archived: bool,

        #[arg(long)]
        direct: bool,
    },

    /// List the immediate subgroups of a group
    Subgroups {
        #[arg(short, long)]
        group: String,
    },

    /// List, or delete, pipelines older than a number of years
    Pipelines {
        #[arg(short = 'P', long)]
        project: String,

        #[arg(short = 'y', long, value_parser = clap::value_parser!(u32).range(1..))]
        older_than_years: u32,

        #[arg(long)]
        delete: bool,

        /// Required together with --delete
        #[arg(long)]
        confirm: bool,
    },

    /// Show a project, or archive it
    Project {
        #[arg(short = 'P', long)]
        project: String,

        #[arg(long)]
        archive: bool,
    },
}

impl Cli {
    fn provider(&self, config: &Config) -> Result<GitLabProvider> {
        let raw_token = self
            .token
            .clone()
            .or_else(|| config.gitlab.token.clone())
            .context("GITLAB_ACCESS_TOKEN environment variable not set")?;
        let token = Token::parse(&raw_token)?;

        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(&config.gitlab.base_url);
        info!("Using GitLab server: {url}");

        let client =
            GitLabClient::with_options(url, Some(token), &config.gitlab.client_options())?;
        Ok(GitLabProvider::new(client))
    }

    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce() -> String) -> Result<()> {
        let rendered = match self.format {
            Format::Table => table(),
            Format::Json if self.pretty => serde_json::to_string_pretty(value)?,
            Format::Json => serde_json::to_string(value)?,
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, rendered)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Results written to: {}", output_path.display());
        } else {
            println!("{rendered}");
        }

        Ok(())
    }

    async fn execute_serve(&self, config: &Config, http: bool, addr: &str) -> Result<()> {
        let provider = self.provider(config)?;
        let server = McpServer::new(provider, config.server.name.clone());

        for tool in TOOLS {
            info!("Registered MCP tool {} - {}", tool.name, tool.description);
        }

        if http {
            info!("Serving MCP over HTTP on {addr}");
            serve_http(server, addr).await?;
            return Ok(());
        }

        info!("Serving MCP over stdio");
        serve_stdio(server).await?;
        info!("stdin closed, shutting down");
        Ok(())
    }

    async fn execute_projects(
        &self,
        config: &Config,
        group: &str,
        archived: bool,
        direct: bool,
        cancel: &CancelToken,
    ) -> Result<()> {
        let provider = self.provider(config)?;
        let spinner = Spinner::start(format!("Listing projects in {group}"));

        if direct {
            let projects = match provider.list_direct_projects(group, cancel).await {
                Ok(projects) => projects,
                Err(e) => {
                    spinner.fail("Listing projects failed");
                    return Err(e.into());
                }
            };
            spinner.finish(format!("Found {} direct projects", projects.len()));

            let listing = GroupProjects {
                projects,
                skipped_subgroups: Vec::new(),
            };
            return self.emit(&listing.projects, || {
                output::render_group_projects(group, &listing)
            });
        }

        let listing = match provider.list_all_projects(group, archived, cancel).await {
            Ok(listing) => listing,
            Err(e) => {
                spinner.fail("Listing projects failed");
                return Err(e.into());
            }
        };
        spinner.finish(format!(
            "Found {} projects ({} subgroups skipped)",
            listing.projects.len(),
            listing.skipped_subgroups.len()
        ));

        self.emit(&listing, || output::render_group_projects(group, &listing))
    }

    async fn execute_subgroups(
        &self,
        config: &Config,
        group: &str,
        cancel: &CancelToken,
    ) -> Result<()> {
        let provider = self.provider(config)?;
        let spinner = Spinner::start(format!("Listing subgroups of {group}"));

        let subgroups = match provider.list_subgroups(group, cancel).await {
            Ok(subgroups) => subgroups,
            Err(e) => {
                spinner.fail("Listing subgroups failed");
                return Err(e.into());
            }
        };
        spinner.finish(format!("Found {} subgroups", subgroups.len()));

        self.emit(&subgroups, || output::render_subgroups(group, &subgroups))
    }

    async fn execute_pipelines(
        &self,
        config: &Config,
        project: &str,
        years: u32,
        delete: bool,
        confirm: bool,
        cancel: &CancelToken,
    ) -> Result<()> {
        let provider = self.provider(config)?;
        let cutoff = cutoff_from_years(Utc::now(), years)?;

        if delete && !confirm {
            eprintln!("Deletion not performed: pass --confirm together with --delete to delete pipelines.");
        }

        if !(delete && confirm) {
            let spinner = Spinner::start(format!("Listing pipelines in {project}"));
            let pipelines = match provider.list_old_pipelines(project, cutoff, cancel).await {
                Ok(pipelines) => pipelines,
                Err(e) => {
                    spinner.fail("Listing pipelines failed");
                    return Err(e.into());
                }
            };
            spinner.finish(format!(
                "Found {} pipelines older than {years} years",
                pipelines.len()
            ));
            return self.emit(&pipelines, || {
                output::render_pipelines(project, cutoff, &pipelines)
            });
        }

        let spinner = Spinner::start(format!("Deleting old pipelines in {project}"));
        match provider.delete_old_pipelines(project, cutoff, cancel).await {
            Ok(summary) => {
                spinner.finish(format!(
                    "Deleted {}/{} pipelines",
                    summary.deleted_ids.len(),
                    summary.total_candidates
                ));
                self.emit(&summary, || output::render_deletion(project, &summary))
            }
            Err(GitLabMcpError::Cancelled {
                partial: Some(summary),
            }) => {
                spinner.fail("Deletion cancelled");
                self.emit(&summary, || output::render_deletion(project, &summary))?;
                bail!(
                    "Pipeline deletion cancelled after {} of {} candidates",
                    summary.deleted_ids.len() + summary.failed.len(),
                    summary.total_candidates
                )
            }
            Err(e) => {
                spinner.fail("Deletion failed");
                Err(e.into())
            }
        }
    }

    async fn execute_project(&self, config: &Config, project: &str, archive: bool) -> Result<()> {
        let provider = self.provider(config)?;
        let spinner = Spinner::start(if archive {
            format!("Archiving {project}")
        } else {
            format!("Fetching {project}")
        });

        let result = if archive {
            provider.archive_project(project).await
        } else {
            provider.get_project(project).await
        };
        let details = match result {
            Ok(details) => details,
            Err(e) => {
                spinner.fail("Request failed");
                return Err(e.into());
            }
        };
        spinner.finish(&details.path_with_namespace);

        self.emit(&details, || output::render_project(&details))
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        if let Commands::Serve { http, addr } = &self.command {
            return self.execute_serve(&config, *http, addr).await;
        }

        let cancel = CancelToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping after the current request");
                on_interrupt.cancel();
            }
        });

        match &self.command {
            Commands::Serve { .. } => Ok(()),
            Commands::Projects {
                group,
                archived,
                direct,
            } => {
                self.execute_projects(&config, group, *archived, *direct, &cancel)
                    .await
            }
            Commands::Subgroups { group } => self.execute_subgroups(&config, group, &cancel).await,
            Commands::Pipelines {
                project,
                older_than_years,
                delete,
                confirm,
            } => {
                self.execute_pipelines(
                    &config,
                    project,
                    *older_than_years,
                    *delete,
                    *confirm,
                    &cancel,
                )
                .await
            }
            Commands::Project { project, archive } => {
                self.execute_project(&config, project, *archive).await
            }
        }
    }
}
