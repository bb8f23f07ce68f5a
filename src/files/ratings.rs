//! Rating normalization
//!
//! Raw ratings arrive as service key -> JSON value. The variant of each
//! [`Rating`] comes from the service's declared type, never from the value.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::api::{ServiceDirectory, ServiceInfo};

/// One rating a file has on one rating service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rating {
    /// Star rating; `None` when the file is unrated
    Numerical {
        service_key: String,
        service: ServiceInfo,
        value: Option<u32>,
    },
    /// Like/dislike; `None` when the file is unrated
    Like {
        service_key: String,
        service: ServiceInfo,
        value: Option<bool>,
    },
    /// Counter, always present
    IncDec {
        service_key: String,
        service: ServiceInfo,
        value: i64,
    },
}

impl Rating {
    pub fn service_key(&self) -> &str {
        match self {
            Rating::Numerical { service_key, .. }
            | Rating::Like { service_key, .. }
            | Rating::IncDec { service_key, .. } => service_key,
        }
    }

    pub fn service(&self) -> &ServiceInfo {
        match self {
            Rating::Numerical { service, .. }
            | Rating::Like { service, .. }
            | Rating::IncDec { service, .. } => service,
        }
    }
}

/// Type each raw rating by its service; entries for unknown or non-rating
/// services are dropped.
pub fn normalize_ratings(raw: &BTreeMap<String, Value>, services: &ServiceDirectory) -> Vec<Rating> {
    raw.iter()
        .filter_map(|(service_key, value)| {
            let Some(service) = services.get(service_key) else {
                trace!(service_key = %service_key, "Dropping rating for unknown service");
                return None;
            };
            let service_key = service_key.clone();
            let service_type = service.service_type;
            let service = service.clone();

            if service_type.is_numerical_rating() {
                let value = value.as_u64().and_then(|v| u32::try_from(v).ok());
                Some(Rating::Numerical { service_key, service, value })
            } else if service_type.is_like_rating() {
                Some(Rating::Like { service_key, service, value: value.as_bool() })
            } else if service_type.is_incdec_rating() {
                let value = value.as_i64().unwrap_or(0);
                Some(Rating::IncDec { service_key, service, value })
            } else {
                trace!(
                    service_key = %service_key,
                    service_type = ?service_type,
                    "Dropping rating for non-rating service"
                );
                None
            }
        })
        .collect()
}
