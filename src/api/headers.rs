//! Notification headers attached to successful mutations.
//!
//! Clients read `X-{app}-alert` as a message key and `X-{app}-params` as its
//! argument, e.g. `personRegistryApp.person.created` with the new id.

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::models::PersonId;
use crate::service::IndexSync;

const ENTITY_NAME: &str = "person";

/// Header carrying the reason a create was refused.
pub const FAILURE_HEADER: &str = "failure";

#[derive(Debug, Error)]
#[error("application name '{0}' cannot be used in a header")]
pub struct InvalidAppName(pub String);

#[derive(Debug, Clone)]
pub struct AlertHeaders {
    alert: HeaderName,
    params: HeaderName,
    index_sync: HeaderName,
    created: HeaderValue,
    updated: HeaderValue,
    deleted: HeaderValue,
}

impl AlertHeaders {
    pub fn new(app_name: &str) -> Result<Self, InvalidAppName> {
        let name = |suffix: &str| {
            HeaderName::from_bytes(format!("x-{}-{}", app_name, suffix).as_bytes())
                .map_err(|_| InvalidAppName(app_name.to_string()))
        };
        let message = |action: &str| {
            HeaderValue::from_str(&format!("{}.{}.{}", app_name, ENTITY_NAME, action))
                .map_err(|_| InvalidAppName(app_name.to_string()))
        };

        Ok(Self {
            alert: name("alert")?,
            params: name("params")?,
            index_sync: name("index-sync")?,
            created: message("created")?,
            updated: message("updated")?,
            deleted: message("deleted")?,
        })
    }

    pub fn entity_created(&self, id: PersonId, sync: &IndexSync) -> HeaderMap {
        self.alert(&self.created, id, sync)
    }

    pub fn entity_updated(&self, id: PersonId, sync: &IndexSync) -> HeaderMap {
        self.alert(&self.updated, id, sync)
    }

    pub fn entity_deleted(&self, id: PersonId, sync: &IndexSync) -> HeaderMap {
        self.alert(&self.deleted, id, sync)
    }

    fn alert(&self, message: &HeaderValue, id: PersonId, sync: &IndexSync) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(self.alert.clone(), message.clone());
        headers.insert(self.params.clone(), HeaderValue::from(id.0));
        headers.insert(
            self.index_sync.clone(),
            HeaderValue::from_static(sync.as_str()),
        );
        headers
    }
}
