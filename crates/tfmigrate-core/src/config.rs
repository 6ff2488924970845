//! Remote store configuration
//!
//! Resolved from the environment snapshot, with command-line overrides
//! applied on top. Nothing here is validated eagerly: a run that ends up a
//! no-op never needs a token or a project.

use tfmigrate_core_types::Sensitive;

use crate::errors::{MigrateError, Result};
use crate::snapshot::EnvSnapshot;

/// API token for the remote store
pub const TOKEN_VAR: &str = "CIRCLE_TOKEN";
/// Explicit project slug, `<vcs>/<org>/<repo>`
pub const PROJECT_SLUG_VAR: &str = "CIRCLE_PROJECT_SLUG";
/// Built-in CircleCI job variables used when no slug is given
pub const PROJECT_USERNAME_VAR: &str = "CIRCLE_PROJECT_USERNAME";
pub const PROJECT_REPONAME_VAR: &str = "CIRCLE_PROJECT_REPONAME";

pub const DEFAULT_API_URL: &str = "https://circleci.com/api/v1.1";
const DEFAULT_VCS: &str = "github";

/// Where and as whom to reach the remote store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    api_url: String,
    project: Option<String>,
    token: Option<Sensitive<String>>,
}

impl StoreConfig {
    /// Read token and project from the snapshot
    pub fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        let project = snapshot.get(PROJECT_SLUG_VAR).map(str::to_string).or_else(|| {
            let user = snapshot.get(PROJECT_USERNAME_VAR)?;
            let repo = snapshot.get(PROJECT_REPONAME_VAR)?;
            Some(format!("{}/{}/{}", DEFAULT_VCS, user, repo))
        });

        Self {
            api_url: DEFAULT_API_URL.to_string(),
            project,
            token: snapshot
                .get(TOKEN_VAR)
                .map(|t| Sensitive::new(t.to_string())),
        }
    }

    /// Override the API base URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the project slug when one is given
    pub fn with_project(mut self, project: Option<String>) -> Self {
        if let Some(project) = project.filter(|p| !p.is_empty()) {
            self.project = Some(project);
        }
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// # Errors
    ///
    /// Returns `MissingProject` when no slug could be resolved.
    pub fn project(&self) -> Result<&str> {
        self.project.as_deref().ok_or(MigrateError::MissingProject)
    }

    /// # Errors
    ///
    /// Returns `MissingCredential` when `CIRCLE_TOKEN` is unset.
    pub fn token(&self) -> Result<&Sensitive<String>> {
        self.token.as_ref().ok_or_else(|| MigrateError::MissingCredential {
            var: TOKEN_VAR.to_string(),
        })
    }
}
