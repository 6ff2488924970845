//! CircleCI project environment variables as a keyed store
//!
//! Writes go to `POST {api}/project/{slug}/envvar`, deletes to
//! `DELETE {api}/project/{slug}/envvar/{name}`. The token travels as the
//! `circle-token` query parameter. Values written here become visible to
//! later jobs only, never to the job that wrote them.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use tfmigrate_core::config::StoreConfig;
use tfmigrate_core::store::{DeleteOutcome, KeyedStore};

use crate::errors::{self, Result};

const TOKEN_PARAM: &str = "circle-token";

#[derive(Debug, Serialize)]
struct EnvVar<'a> {
    name: &'a str,
    value: &'a str,
}

/// Blocking client for one project's environment variables
#[derive(Debug, Clone)]
pub struct CircleCiStore {
    client: Client,
    config: StoreConfig,
}

impl CircleCiStore {
    /// Build a client for the configured project
    ///
    /// Credentials are checked per request, so a store can be built for a
    /// run that never reaches the network.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be constructed.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(errors::transport)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn envvar_url(&self) -> Result<String> {
        Ok(format!(
            "{}/project/{}/envvar",
            self.config.api_url(),
            self.config.project()?
        ))
    }
}

impl KeyedStore for CircleCiStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        let token = self.config.token()?;
        let url = self.envvar_url()?;

        let response = self
            .client
            .post(url)
            .query(&[(TOKEN_PARAM, token.expose().as_str())])
            .json(&EnvVar { name: key, value })
            .send()
            .map_err(errors::transport)?;

        let status = response.status();
        tracing::debug!(
            store_key = key,
            http_status = status.as_u16(),
            "envvar written"
        );
        if status == StatusCode::CREATED {
            return Ok(());
        }
        Err(errors::store_rejected(status, response.text().unwrap_or_default()))
    }

    fn delete(&self, key: &str) -> Result<DeleteOutcome> {
        let token = self.config.token()?;
        let url = format!("{}/{}", self.envvar_url()?, key);

        let response = self
            .client
            .delete(url)
            .query(&[(TOKEN_PARAM, token.expose().as_str())])
            .send()
            .map_err(errors::transport)?;

        let status = response.status();
        tracing::debug!(
            store_key = key,
            http_status = status.as_u16(),
            "envvar deleted"
        );
        match status {
            StatusCode::OK => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            _ => Err(errors::delete_failed(
                status,
                response.text().unwrap_or_default(),
            )),
        }
    }
}
