//! Service records and the read-side joins against directory ids.

use crate::storage::directory::VIRTUAL_ROOT_ID;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Online,
    Offline,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Online => "online",
            ServiceStatus::Offline => "offline",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ServiceStatus::Online => ServiceStatus::Offline,
            ServiceStatus::Offline => ServiceStatus::Online,
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published (or draft) service. `dir_id` points into the directory forest.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub dir_id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub version: String,
    pub status: ServiceStatus,
    pub create_time: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceRecord {
    pub fn is_online(&self) -> bool {
        self.status == ServiceStatus::Online
    }
}

/// Badge count for a directory.
///
/// The virtual root counts every online service. Any other node counts the
/// services filed directly under it, whatever their status; services in
/// child directories are not included.
pub fn count_descendant_services(node_id: &str, records: &[ServiceRecord]) -> usize {
    if node_id == VIRTUAL_ROOT_ID {
        return records.iter().filter(|r| r.is_online()).count();
    }
    records.iter().filter(|r| r.dir_id == node_id).count()
}

/// Market view badge: like [`count_descendant_services`] but drafts never count.
pub fn count_online_services(node_id: &str, records: &[ServiceRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.is_online())
        .filter(|r| node_id == VIRTUAL_ROOT_ID || r.dir_id == node_id)
        .count()
}

/// `(online, offline)` totals.
pub fn status_totals(records: &[ServiceRecord]) -> (usize, usize) {
    let online = records.iter().filter(|r| r.is_online()).count();
    (online, records.len() - online)
}

#[derive(Clone, Debug)]
pub struct ServiceFilter {
    pub directory_id: String,
    pub search: String,
    pub drafts_only: bool,
    pub online_only: bool,
}

impl Default for ServiceFilter {
    fn default() -> Self {
        Self {
            directory_id: VIRTUAL_ROOT_ID.to_string(),
            search: String::new(),
            drafts_only: false,
            online_only: false,
        }
    }
}

impl ServiceFilter {
    pub fn matches(&self, record: &ServiceRecord) -> bool {
        if self.drafts_only && record.status != ServiceStatus::Offline {
            return false;
        }
        if self.online_only && !record.is_online() {
            return false;
        }
        if !self.search.is_empty()
            && !record.name.to_lowercase().contains(&self.search.to_lowercase())
        {
            return false;
        }
        self.directory_id == VIRTUAL_ROOT_ID || record.dir_id == self.directory_id
    }
}

pub fn filter_services<'a>(records: &'a [ServiceRecord], filter: &ServiceFilter) -> Vec<&'a ServiceRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

pub fn toggle_online(records: &[ServiceRecord], id: &str) -> Vec<ServiceRecord> {
    records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if r.id == id {
                r.status = r.status.toggled();
            }
            r
        })
        .collect()
}

/// Batch online/offline. Unknown ids are ignored.
pub fn set_status(records: &[ServiceRecord], ids: &[String], status: ServiceStatus) -> Vec<ServiceRecord> {
    let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
    records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if ids.contains(r.id.as_str()) {
                r.status = status;
            }
            r
        })
        .collect()
}

pub fn remove_services(records: &[ServiceRecord], ids: &[String]) -> Vec<ServiceRecord> {
    let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
    records
        .iter()
        .filter(|r| !ids.contains(r.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, dir: &str, status: ServiceStatus) -> ServiceRecord {
        ServiceRecord {
            id: id.to_string(),
            name: format!("Service {}", id),
            category: "spatial".to_string(),
            dir_id: dir.to_string(),
            service_type: "WMS".to_string(),
            version: "V1.0".to_string(),
            status,
            create_time: "2024-05-10 15:30".to_string(),
            tags: Vec::new(),
            description: None,
        }
    }

    #[test]
    fn counts_are_direct_matches_only() {
        // parent "p" has child "x"; only the child is referenced
        let services = vec![
            record("1", "x", ServiceStatus::Online),
            record("2", "y", ServiceStatus::Online),
        ];
        assert_eq!(count_descendant_services("p", &services), 0);
        assert_eq!(count_descendant_services("x", &services), 1);
    }

    #[test]
    fn virtual_root_counts_online() {
        let services = vec![
            record("1", "x", ServiceStatus::Online),
            record("2", "x", ServiceStatus::Offline),
            record("3", "y", ServiceStatus::Online),
        ];
        assert_eq!(count_descendant_services(VIRTUAL_ROOT_ID, &services), 2);
        // drafts still count toward their own directory
        assert_eq!(count_descendant_services("x", &services), 2);
        assert_eq!(count_online_services("x", &services), 1);
        assert_eq!(count_online_services(VIRTUAL_ROOT_ID, &services), 2);
        assert_eq!(status_totals(&services), (2, 1));
    }

    #[test]
    fn filter_by_directory_search_and_tab() {
        let mut services = vec![
            record("1", "ogc", ServiceStatus::Online),
            record("2", "ogc", ServiceStatus::Offline),
            record("3", "rest", ServiceStatus::Online),
        ];
        services[2].name = "Hubei Imagery".to_string();

        let all = filter_services(&services, &ServiceFilter::default());
        assert_eq!(all.len(), 3);

        let ogc = ServiceFilter { directory_id: "ogc".into(), ..Default::default() };
        assert_eq!(filter_services(&services, &ogc).len(), 2);

        let drafts = ServiceFilter { drafts_only: true, ..Default::default() };
        let found = filter_services(&services, &drafts);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");

        let search = ServiceFilter { search: "IMAGERY".into(), ..Default::default() };
        assert_eq!(filter_services(&services, &search)[0].id, "3");

        let market = ServiceFilter { online_only: true, ..Default::default() };
        assert_eq!(filter_services(&services, &market).len(), 2);
    }

    #[test]
    fn status_changes_return_new_values() {
        let services = vec![
            record("1", "ogc", ServiceStatus::Online),
            record("2", "ogc", ServiceStatus::Offline),
        ];
        let toggled = toggle_online(&services, "1");
        assert_eq!(toggled[0].status, ServiceStatus::Offline);
        assert_eq!(services[0].status, ServiceStatus::Online);

        let online = set_status(&services, &["2".to_string(), "zz".to_string()], ServiceStatus::Online);
        assert!(online.iter().all(|r| r.is_online()));

        let left = remove_services(&services, &["1".to_string()]);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "2");
    }

    #[test]
    fn json_uses_console_field_names() {
        let json = serde_json::to_value(record("1", "ogc", ServiceStatus::Online)).unwrap();
        assert_eq!(json["dirId"], "ogc");
        assert_eq!(json["type"], "WMS");
        assert_eq!(json["status"], "online");
        assert_eq!(json["createTime"], "2024-05-10 15:30");
    }
}
