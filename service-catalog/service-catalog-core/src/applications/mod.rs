//! Service access applications and their audit workflow.
//!
//! A record starts `Pending` and is decided exactly once, to `Approved` or
//! `Rejected`. Approval issues an app key and secret.

use crate::error::ApplicationError;
use crate::ids::{ApplicationIdGenerator, IdGenerator, TokenGenerator};
use crate::services::ServiceRecord;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const SPATIAL_CATEGORY: &str = "Spatiotemporal Data Service";
pub const SPATIAL_PROTOCOLS: [&str; 4] = ["WMTS", "WMS", "WFS", "XYZ"];
pub const DEFAULT_APPLICANT: &str = "System Administrator";
pub const DEFAULT_SOURCE: &str = "Service Market";

pub const ENDPOINT_BASE_URL: &str = "https://api.spatial-cloud.com";

const APPLY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MAX_ID_ATTEMPTS: usize = 32;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditDecision {
    Approve,
    Reject,
}

impl AuditDecision {
    pub fn status(&self) -> ApplicationStatus {
        match self {
            AuditDecision::Approve => ApplicationStatus::Approved,
            AuditDecision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// How long access is requested for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessDuration {
    ThreeDays,
    SevenDays,
    #[default]
    OneMonth,
    Permanent,
    Custom(u32),
}

impl AccessDuration {
    pub fn label(&self) -> String {
        match self {
            AccessDuration::ThreeDays => "3 days".to_string(),
            AccessDuration::SevenDays => "7 days".to_string(),
            AccessDuration::OneMonth => "1 month".to_string(),
            AccessDuration::Permanent => "permanent".to_string(),
            AccessDuration::Custom(days) => format!("{} days", days),
        }
    }

    /// Accepts `3d`, `7d`, `1m`, `permanent` or a plain day count.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "3d" => Some(AccessDuration::ThreeDays),
            "7d" => Some(AccessDuration::SevenDays),
            "1m" => Some(AccessDuration::OneMonth),
            "permanent" => Some(AccessDuration::Permanent),
            other => other.trim_end_matches('d').parse().ok().map(AccessDuration::Custom),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub duration: String,
    pub status: ApplicationStatus,
    pub apply_time: String,
    pub protocols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_opinion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<String>,
}

/// A ready-to-call access URL for an approved application.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    pub label: String,
    pub url: String,
}

impl ApplicationRecord {
    /// Access URLs carrying the issued app key. Spatial services get the OGC
    /// capability documents; anything else gets the RESTful query URL.
    /// Empty until the record is approved with a key.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let Some(key) = self.app_key.as_deref() else {
            return Vec::new();
        };
        if self.status != ApplicationStatus::Approved {
            return Vec::new();
        }
        let name = &self.service_name;
        let endpoint = |label: &str, url: String| Endpoint {
            label: label.to_string(),
            url,
        };
        if self.category == SPATIAL_CATEGORY {
            vec![
                endpoint(
                    "WMTS (Web Map Tile Service)",
                    format!("{ENDPOINT_BASE_URL}/wmts/{name}/1.0.0/WMTSCapabilities.xml?key={key}"),
                ),
                endpoint(
                    "WMS (Web Map Service)",
                    format!("{ENDPOINT_BASE_URL}/wms/{name}?request=GetCapabilities&key={key}"),
                ),
                endpoint(
                    "WFS (Web Feature Service)",
                    format!("{ENDPOINT_BASE_URL}/wfs/{name}?request=GetCapabilities&key={key}"),
                ),
            ]
        } else {
            vec![endpoint(
                "RESTful API Endpoint",
                format!("{ENDPOINT_BASE_URL}/v1/data/{name}/query?key={key}"),
            )]
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ApplyRequest {
    pub duration: AccessDuration,
    /// Empty means "whatever the service offers".
    pub protocols: Vec<String>,
    pub applicant: Option<String>,
    pub source: Option<String>,
}

/// Protocols a service can be requested with.
pub fn service_protocols(service: &ServiceRecord) -> Vec<String> {
    if service.category == SPATIAL_CATEGORY {
        return SPATIAL_PROTOCOLS.iter().map(|p| p.to_string()).collect();
    }
    if service.service_type.is_empty() {
        vec!["RESTful".to_string()]
    } else {
        vec![service.service_type.clone()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub all: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Newest-first list of applications plus the generators used to issue ids
/// and credentials.
pub struct ApplicationLedger {
    records: Vec<ApplicationRecord>,
    ids: Arc<dyn IdGenerator>,
    keys: Arc<dyn IdGenerator>,
    secrets: Arc<dyn IdGenerator>,
}

impl ApplicationLedger {
    pub fn new(records: Vec<ApplicationRecord>) -> Self {
        Self::with_generators(
            records,
            Arc::new(ApplicationIdGenerator::new()),
            Arc::new(TokenGenerator::app_key()),
            Arc::new(TokenGenerator::app_secret()),
        )
    }

    pub fn with_generators(
        records: Vec<ApplicationRecord>,
        ids: Arc<dyn IdGenerator>,
        keys: Arc<dyn IdGenerator>,
        secrets: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            records,
            ids,
            keys,
            secrets,
        }
    }

    pub fn records(&self) -> &[ApplicationRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ApplicationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn fresh_id(&self) -> Result<String, ApplicationError> {
        let mut last = String::new();
        for _ in 0..MAX_ID_ATTEMPTS {
            last = self.ids.next_id();
            if self.get(&last).is_none() {
                return Ok(last);
            }
        }
        Err(ApplicationError::IdCollision(last))
    }

    /// Submit a pending application for `service`.
    pub fn apply(
        &mut self,
        service: &ServiceRecord,
        request: ApplyRequest,
    ) -> Result<ApplicationRecord, ApplicationError> {
        if request.duration == AccessDuration::Custom(0) {
            return Err(ApplicationError::InvalidDuration);
        }
        let protocols = if request.protocols.is_empty() {
            service_protocols(service)
        } else {
            request.protocols
        };
        let record = ApplicationRecord {
            id: self.fresh_id()?,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            category: service.category.clone(),
            service_type: service.service_type.clone(),
            duration: request.duration.label(),
            status: ApplicationStatus::Pending,
            apply_time: Local::now().format(APPLY_TIME_FORMAT).to_string(),
            protocols,
            applicant: Some(request.applicant.unwrap_or_else(|| DEFAULT_APPLICANT.to_string())),
            source: Some(request.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string())),
            audit_opinion: None,
            app_key: None,
            app_secret: None,
        };
        self.records.insert(0, record.clone());
        tracing::info!(id = %record.id, service = %record.service_id, "application submitted");
        Ok(record)
    }

    /// Decide a pending application. Decided records cannot be audited again.
    pub fn audit(
        &mut self,
        id: &str,
        decision: AuditDecision,
        opinion: Option<String>,
    ) -> Result<&ApplicationRecord, ApplicationError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ApplicationError::NotFound(id.to_string()))?;
        let current = self.records[idx].status;
        if current.is_terminal() {
            tracing::warn!(id, status = %current, "audit refused, application already decided");
            return Err(ApplicationError::AlreadyDecided {
                id: id.to_string(),
                status: current,
            });
        }

        let (key, secret) = match decision {
            AuditDecision::Approve => (Some(self.keys.next_id()), Some(self.secrets.next_id())),
            AuditDecision::Reject => (None, None),
        };
        let record = &mut self.records[idx];
        record.status = decision.status();
        record.audit_opinion = opinion;
        if key.is_some() {
            record.app_key = key;
            record.app_secret = secret;
        }
        tracing::info!(id, status = %record.status, "application audited");
        Ok(&self.records[idx])
    }

    /// Applicant view: status tab plus search over service name and id.
    pub fn filter(&self, tab: Option<ApplicationStatus>, search: &str) -> Vec<&ApplicationRecord> {
        let needle = search.to_lowercase();
        self.records
            .iter()
            .filter(|r| tab.map_or(true, |s| r.status == s))
            .filter(|r| {
                r.service_name.to_lowercase().contains(&needle) || r.id.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Auditor view: search over service name and applicant.
    pub fn search_for_audit(&self, search: &str) -> Vec<&ApplicationRecord> {
        let needle = search.to_lowercase();
        self.records
            .iter()
            .filter(|r| {
                r.service_name.to_lowercase().contains(&needle)
                    || r
                        .applicant
                        .as_deref()
                        .map_or(false, |a| a.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn stats(&self) -> ApplicationStats {
        let mut stats = ApplicationStats {
            all: self.records.len(),
            ..Default::default()
        };
        for record in &self.records {
            match record.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Approved => stats.approved += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }
}
