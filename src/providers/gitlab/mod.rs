mod api;
mod cancel;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod pagination;
mod provider;
mod types;

pub use api::GitLabApi;
pub use cancel::CancelToken;
pub use client::{ClientOptions, GitLabClient};
pub use provider::GitLabProvider;
