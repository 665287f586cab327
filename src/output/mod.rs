mod progress;
mod render;
mod styling;
mod tables;

pub use progress::Spinner;
pub use render::{
    render_deletion, render_group_projects, render_pipelines, render_project, render_subgroups,
};
use styling::{dim, title};

/// Prints the banner to stderr; stdout is reserved for results and the MCP stream.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        title("🦊 gitlab-mcp"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitLab group and pipeline housekeeping over MCP")
    );
}
