//! Top-level catalog state: the directory forest, the service records and the
//! application ledger, owned in one place.
//!
//! Mutations go through the pure directory functions and only replace the
//! held forest when they succeed, so a failed call leaves the store exactly as
//! it was.

use crate::applications::{
    ApplicationLedger, ApplicationRecord, ApplyRequest, AuditDecision,
};
use crate::error::TreeError;
use crate::events::{CatalogEvent, EventBus};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::services::{self, ServiceFilter, ServiceRecord, ServiceStatus};
use crate::storage::directory::{self, DirectoryNode, PathEntry};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::broadcast;

const MAX_ID_ATTEMPTS: usize = 8;

/// Which badge numbers a tree view shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountMode {
    /// Development panel: direct matches of any status.
    #[default]
    Development,
    /// Market panel: online services only.
    Market,
}

pub struct CatalogStore {
    directories: Vec<DirectoryNode>,
    services: Vec<ServiceRecord>,
    applications: ApplicationLedger,
    ids: Arc<dyn IdGenerator>,
    events: EventBus,
    dirty: bool,
}

impl CatalogStore {
    pub fn new(
        directories: Vec<DirectoryNode>,
        services: Vec<ServiceRecord>,
        applications: Vec<ApplicationRecord>,
    ) -> Self {
        Self::with_generators(
            directories,
            services,
            ApplicationLedger::new(applications),
            Arc::new(UuidGenerator),
        )
    }

    pub fn with_generators(
        directories: Vec<DirectoryNode>,
        services: Vec<ServiceRecord>,
        applications: ApplicationLedger,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            directories,
            services,
            applications,
            ids,
            events: EventBus::new(),
            dirty: false,
        }
    }

    pub fn directories(&self) -> &[DirectoryNode] {
        &self.directories
    }

    pub fn services(&self) -> &[ServiceRecord] {
        &self.services
    }

    pub fn applications(&self) -> &ApplicationLedger {
        &self.applications
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Whether anything changed since the last [`CatalogStore::clear_dirty`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn publish(&mut self, event: CatalogEvent) {
        self.mark_dirty();
        let delivered = self.events.send(event);
        tracing::trace!(delivered, "catalog event published");
    }

    pub fn find_directory(&self, id: &str) -> Option<&DirectoryNode> {
        directory::find_node(&self.directories, id)
    }

    pub fn directory_paths(&self) -> Vec<PathEntry> {
        directory::flatten_paths(&self.directories)
    }

    pub fn directory_count(&self, id: &str) -> usize {
        services::count_descendant_services(id, &self.services)
    }

    pub fn forest_with_counts(&self, mode: CountMode) -> Vec<DirectoryNode> {
        let records = &self.services;
        match mode {
            CountMode::Development => directory::with_counts(&self.directories, &|id: &str| {
                services::count_descendant_services(id, records)
            }),
            CountMode::Market => directory::with_counts(&self.directories, &|id: &str| {
                services::count_online_services(id, records)
            }),
        }
    }

    /// Create a directory under `parent` (or at the top level) and return its id.
    pub fn add_directory(&mut self, parent: Option<&str>, label: impl Into<String>) -> Result<String> {
        let label = label.into();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            let node = DirectoryNode::new(id.clone(), label.clone());
            match directory::insert_node(&self.directories, parent, node) {
                Ok(forest) => {
                    self.directories = forest;
                    tracing::info!(%id, parent = ?parent, %label, "directory created");
                    self.publish(CatalogEvent::DirectoryCreated {
                        id: id.clone(),
                        parent: parent.map(str::to_string),
                    });
                    return Ok(id);
                }
                Err(TreeError::DuplicateId(_)) | Err(TreeError::ReservedId(_)) => {
                    tracing::debug!(%id, "generated directory id taken, retrying");
                }
                Err(e) => {
                    tracing::warn!(parent = ?parent, error = %e, "directory not created");
                    return Err(e.into());
                }
            }
        }
        Err(anyhow!("could not allocate a fresh directory id"))
    }

    pub fn rename_directory(&mut self, id: &str, label: impl Into<String>) -> Result<()> {
        self.directories = directory::rename_node(&self.directories, id, label)?;
        tracing::info!(id, "directory renamed");
        self.publish(CatalogEvent::DirectoryRenamed { id: id.to_string() });
        Ok(())
    }

    /// Remove a directory and its subtree. Returns the removed ids; an unknown
    /// id removes nothing. Services filed under removed directories are kept.
    pub fn delete_directory(&mut self, id: &str) -> Vec<String> {
        let removed = directory::descendant_ids(&self.directories, id);
        if removed.is_empty() {
            tracing::debug!(id, "delete ignored, directory already gone");
            return removed;
        }
        self.directories = directory::delete_subtree(&self.directories, id);
        tracing::info!(id, removed = removed.len(), "directory deleted");
        self.publish(CatalogEvent::DirectoryDeleted { ids: removed.clone() });
        removed
    }

    /// Drag-and-drop `dragged` to sit right after `target`.
    pub fn move_directory(&mut self, dragged: &str, target: &str) -> Result<()> {
        let forest = match directory::reparent(&self.directories, dragged, target) {
            Ok(forest) => forest,
            Err(e) => {
                tracing::warn!(dragged, target_id = target, error = %e, "move refused");
                return Err(e.into());
            }
        };
        if forest != self.directories {
            self.directories = forest;
            tracing::info!(dragged, target_id = target, "directory moved");
            self.publish(CatalogEvent::DirectoryMoved {
                id: dragged.to_string(),
                after: target.to_string(),
            });
        }
        Ok(())
    }

    pub fn services_in(&self, filter: &ServiceFilter) -> Vec<&ServiceRecord> {
        services::filter_services(&self.services, filter)
    }

    pub fn toggle_service_online(&mut self, id: &str) -> Result<ServiceStatus> {
        let status = self
            .services
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.status.toggled())
            .ok_or_else(|| anyhow!("service '{}' not found", id))?;
        self.services = services::toggle_online(&self.services, id);
        tracing::info!(id, %status, "service status toggled");
        self.publish(CatalogEvent::ServiceStatusChanged { ids: vec![id.to_string()] });
        Ok(status)
    }

    pub fn set_services_status(&mut self, ids: &[String], status: ServiceStatus) {
        if ids.is_empty() {
            return;
        }
        self.services = services::set_status(&self.services, ids, status);
        tracing::info!(count = ids.len(), %status, "batch status change");
        self.publish(CatalogEvent::ServiceStatusChanged { ids: ids.to_vec() });
    }

    pub fn remove_services(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.services = services::remove_services(&self.services, ids);
        tracing::info!(count = ids.len(), "services removed");
        self.publish(CatalogEvent::ServicesRemoved { ids: ids.to_vec() });
    }

    pub fn apply_for_service(&mut self, service_id: &str, request: ApplyRequest) -> Result<ApplicationRecord> {
        let service = self
            .services
            .iter()
            .find(|s| s.id == service_id)
            .ok_or_else(|| anyhow!("service '{}' not found", service_id))?;
        let record = self.applications.apply(service, request)?;
        self.publish(CatalogEvent::ApplicationSubmitted { id: record.id.clone() });
        Ok(record)
    }

    pub fn audit_application(
        &mut self,
        id: &str,
        decision: AuditDecision,
        opinion: Option<String>,
    ) -> Result<ApplicationRecord> {
        let record = self.applications.audit(id, decision, opinion)?.clone();
        self.publish(CatalogEvent::ApplicationAudited {
            id: record.id.clone(),
            status: record.status,
        });
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::ApplicationStatus;
    use crate::error::ApplicationError;
    use crate::ids::SequenceGenerator;
    use crate::seed;
    use crate::storage::directory::VIRTUAL_ROOT_ID;

    fn store() -> CatalogStore {
        CatalogStore::with_generators(
            seed::directories(),
            seed::services(),
            ApplicationLedger::with_generators(
                seed::applications(),
                Arc::new(SequenceGenerator::new("APP")),
                Arc::new(SequenceGenerator::new("ak")),
                Arc::new(SequenceGenerator::new("sk")),
            ),
            Arc::new(SequenceGenerator::new("dir")),
        )
    }

    #[test]
    fn add_directory_under_parent_and_root() {
        let mut store = store();
        let id = store.add_directory(Some("ogc"), "WPS Processing").unwrap();
        assert_eq!(id, "dir-1");
        let ogc = store.find_directory("ogc").unwrap();
        assert_eq!(ogc.children.last().unwrap().label, "WPS Processing");
        assert!(store.is_dirty());

        let top = store.add_directory(None, "Archive").unwrap();
        assert_eq!(store.directories().last().unwrap().id, top);
        let also_top = store.add_directory(Some(VIRTUAL_ROOT_ID), "Scratch").unwrap();
        assert_eq!(store.directories().last().unwrap().id, also_top);
    }

    #[test]
    fn add_directory_retries_taken_ids() {
        let forest = vec![DirectoryNode::new("dir-1", "Taken")];
        let mut store = CatalogStore::with_generators(
            forest,
            Vec::new(),
            ApplicationLedger::new(Vec::new()),
            Arc::new(SequenceGenerator::new("dir")),
        );
        let id = store.add_directory(None, "Fresh").unwrap();
        assert_eq!(id, "dir-2");
    }

    #[test]
    fn add_directory_under_missing_parent_leaves_store_alone() {
        let mut store = store();
        let before = store.directories().to_vec();
        let err = store.add_directory(Some("ghost"), "X").unwrap_err();
        assert_eq!(
            err.downcast_ref::<TreeError>(),
            Some(&TreeError::NodeNotFound("ghost".into()))
        );
        assert_eq!(store.directories(), before.as_slice());
        assert!(!store.is_dirty());
    }

    #[test]
    fn rename_and_paths() {
        let mut store = store();
        store.rename_directory("wms", "Web Map Service").unwrap();
        assert!(store
            .directory_paths()
            .iter()
            .any(|p| p.label == "OGC Standard Services / Web Map Service"));
        assert!(store.rename_directory("ghost", "x").is_err());
    }

    #[test]
    fn delete_reports_removed_ids_and_keeps_services() {
        let mut store = store();
        let services_before = store.services().len();
        let removed = store.delete_directory("rest");
        assert_eq!(removed[0], "rest");
        assert_eq!(removed.len(), 5);
        assert!(store.find_directory("rest_stat").is_none());
        assert_eq!(store.services().len(), services_before);
        assert_eq!(store.directory_count("rest_stat"), 2);

        store.clear_dirty();
        assert!(store.delete_directory("rest").is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn move_publishes_only_real_changes() {
        let mut store = store();
        let mut rx = store.subscribe();
        store.move_directory("iot", "ogc").unwrap();
        let roots: Vec<_> = store.directories().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(roots[..2], ["ogc", "iot"]);
        assert_eq!(
            rx.try_recv().unwrap(),
            CatalogEvent::DirectoryMoved { id: "iot".into(), after: "ogc".into() }
        );

        store.move_directory("iot", "iot").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cyclic_move_is_refused() {
        let mut store = store();
        let before = store.directories().to_vec();
        let err = store.move_directory("ogc", "wms").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TreeError>(),
            Some(TreeError::CyclicMove { .. })
        ));
        assert_eq!(store.directories(), before.as_slice());
    }

    #[test]
    fn counts_by_mode() {
        let store = store();
        let dev = store.forest_with_counts(CountMode::Development);
        let market = store.forest_with_counts(CountMode::Market);
        let ogc_dev = dev.iter().find(|d| d.id == "ogc").unwrap();
        let ogc_market = market.iter().find(|d| d.id == "ogc").unwrap();
        // three online services plus one draft filed directly under "ogc"
        assert_eq!(ogc_dev.count, Some(4));
        assert_eq!(ogc_market.count, Some(3));
        assert_eq!(store.directory_count(VIRTUAL_ROOT_ID), 8);
        assert_eq!(store.directory_count("wms"), 0);
    }

    #[test]
    fn service_status_changes() {
        let mut store = store();
        assert_eq!(store.toggle_service_online("1").unwrap(), ServiceStatus::Offline);
        assert!(store.toggle_service_online("nope").is_err());

        let drafts: Vec<String> = store
            .services_in(&ServiceFilter { drafts_only: true, ..Default::default() })
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(drafts.len(), 4);
        store.set_services_status(&drafts, ServiceStatus::Online);
        assert!(store.services().iter().all(|s| s.is_online()));

        store.remove_services(&["1".to_string(), "3".to_string()]);
        assert_eq!(store.services().len(), 9);
    }

    #[test]
    fn apply_and_audit_through_store() {
        let mut store = store();
        let mut rx = store.subscribe();
        let record = store.apply_for_service("5", ApplyRequest::default()).unwrap();
        assert_eq!(store.applications().records()[0].id, record.id);
        assert_eq!(rx.try_recv().unwrap(), CatalogEvent::ApplicationSubmitted { id: "APP-1".into() });

        let approved = store
            .audit_application(&record.id, AuditDecision::Approve, None)
            .unwrap();
        assert_eq!(approved.status, ApplicationStatus::Approved);
        assert_eq!(approved.app_key.as_deref(), Some("ak-1"));

        let err = store
            .audit_application("APP-20260130-005", AuditDecision::Reject, None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApplicationError>(),
            Some(ApplicationError::AlreadyDecided { .. })
        ));
        assert!(store.apply_for_service("missing", ApplyRequest::default()).is_err());
    }
}
