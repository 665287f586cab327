mod core;
mod groups;
mod pipelines;
mod projects;

pub use self::core::GitLabProvider;
