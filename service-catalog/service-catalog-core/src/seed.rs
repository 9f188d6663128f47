//! Built-in catalog contents the console starts with, and loading a forest
//! from a JSON file.

use crate::applications::{ApplicationRecord, ApplicationStatus, SPATIAL_CATEGORY};
use crate::services::{ServiceRecord, ServiceStatus};
use crate::storage::catalog::CatalogStore;
use crate::storage::directory::{insert_node, DirectoryNode};
use anyhow::{Context, Result};
use std::path::Path;

const BUSINESS_CATEGORY: &str = "Business Data Service";

const DIRECTORIES: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "ogc",
        "OGC Standard Services",
        &[
            ("wms", "WMS Map Service"),
            ("wfs", "WFS Feature Service"),
            ("wmts", "WMTS Tile Service"),
            ("tms", "TMS Tile Service"),
            ("wcs", "WCS Coverage Service"),
        ],
    ),
    (
        "rest",
        "RESTful Business Services",
        &[
            ("rest_query", "Multidimensional Query"),
            ("rest_download", "Data Download"),
            ("rest_stat", "Statistical Analysis"),
            ("rest_meta", "Metadata API"),
        ],
    ),
    (
        "analysis",
        "Spatiotemporal Analysis Tools",
        &[
            ("buffer", "Buffer Analysis"),
            ("overlay", "Overlay Analysis"),
            ("topology", "Topology Check"),
            ("inter", "Spatial Interpolation"),
        ],
    ),
    (
        "industry",
        "Industry Thematic Services",
        &[
            ("env", "Ecological Monitoring"),
            ("traffic", "Smart Traffic Sensing"),
            ("urban", "Urban Planning"),
            ("emergency", "Emergency Command"),
        ],
    ),
    (
        "cloud",
        "Cloud-Native Services",
        &[
            ("cog", "COG Cloud-Optimized Raster"),
            ("mvt", "MVT Vector Tiles"),
            ("flatgeobuf", "FlatGeobuf Serialization"),
        ],
    ),
    ("iot", "Real-Time IoT Services", &[]),
    ("internal", "Internal Support Services", &[]),
];

pub fn directories() -> Vec<DirectoryNode> {
    DIRECTORIES
        .iter()
        .map(|(id, label, children)| {
            DirectoryNode::new(*id, *label).with_children(
                children
                    .iter()
                    .map(|(cid, clabel)| DirectoryNode::new(*cid, *clabel))
                    .collect(),
            )
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn service(
    id: &str,
    name: &str,
    category: &str,
    dir_id: &str,
    service_type: &str,
    version: &str,
    status: ServiceStatus,
    create_time: &str,
    tags: &[&str],
    description: &str,
) -> ServiceRecord {
    ServiceRecord {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        dir_id: dir_id.to_string(),
        service_type: service_type.to_string(),
        version: version.to_string(),
        status,
        create_time: create_time.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: Some(description.to_string()),
    }
}

pub fn services() -> Vec<ServiceRecord> {
    use ServiceStatus::{Offline, Online};
    vec![
        service("1", "Hubei 2m Satellite Imagery", SPATIAL_CATEGORY, "ogc", "WMTS", "V1.0", Online,
            "2024-05-10 15:30", &["Remote Sensing", "Base Geography"],
            "Province-wide 2m satellite imagery tiles over standard WMTS."),
        service("3", "Huangshi 2025 Standard Map", SPATIAL_CATEGORY, "ogc", "WMS", "V2.0", Online,
            "2024-05-12 09:15", &["Administrative", "Standard Map"],
            "2025 standard administrative map of Huangshi with county-level boundaries."),
        service("5", "Hubei Counties", SPATIAL_CATEGORY, "ogc", "WFS", "V1.0", Online,
            "2024-05-14 14:50", &["Feature Query", "Land Use"],
            "County-level administrative features for Hubei."),
        service("7", "National 16m Mosaic", SPATIAL_CATEGORY, "cloud", "COG", "V1.0", Online,
            "2024-05-16 08:30", &["Cloud Native", "Large Imagery"],
            "National 16m satellite mosaic published as COG."),
        service("9", "Weather Data Download", BUSINESS_CATEGORY, "rest", "Retrieval", "V1.0", Online,
            "2024-05-18 13:25", &["Live Weather", "Download"],
            "Temperature, humidity and rainfall from provincial weather stations."),
        service("11", "Consumer Behaviour Analysis", BUSINESS_CATEGORY, "rest", "Analysis", "V1.0", Online,
            "2024-05-20 10:00", &["Big Data", "Consumption"],
            "Monthly spending trends aggregated from order history."),
        service("13", "Provincial Population Statistics", BUSINESS_CATEGORY, "rest_stat", "Statistics", "V1.1", Online,
            "2024-06-01 09:00", &["Socioeconomic", "Census"],
            "Yearly population structure, density and migration by county."),
        service("15", "Traffic Violation Monitoring", BUSINESS_CATEGORY, "rest_query", "Query", "V2.0", Online,
            "2024-06-05 14:30", &["Smart City", "Traffic"],
            "Traffic violation records and accident hotspots."),
        service("draft-1", "City Economic Indicators", BUSINESS_CATEGORY, "rest_stat", "Statistics", "V0.9-Alpha", Offline,
            "2025-01-10 11:20", &["Economy", "Internal Test"],
            "Draft: real-time aggregation of internal economic indicators."),
        service("draft-2", "Geological Hazard Sites", SPATIAL_CATEGORY, "ogc", "WFS", "V1.0-Draft", Offline,
            "2025-01-12 16:45", &["Geohazard", "Early Warning"],
            "Draft: hazard site features, pending data verification."),
        service("draft-3", "Forestry Resources Map", SPATIAL_CATEGORY, "cloud", "COG", "V1.2-Beta", Offline,
            "2025-01-14 09:30", &["Forestry", "Ecology"],
            "Draft: forest cover extracted from recent imagery."),
    ]
}

#[allow(clippy::too_many_arguments)]
fn application(
    id: &str,
    service_id: &str,
    service_name: &str,
    category: &str,
    service_type: &str,
    duration: &str,
    status: ApplicationStatus,
    apply_time: &str,
    source: &str,
    applicant: &str,
    decision: Option<(&str, &str, &str)>,
) -> ApplicationRecord {
    ApplicationRecord {
        id: id.to_string(),
        service_id: service_id.to_string(),
        service_name: service_name.to_string(),
        category: category.to_string(),
        service_type: service_type.to_string(),
        duration: duration.to_string(),
        status,
        apply_time: apply_time.to_string(),
        protocols: vec![service_type.to_string()],
        applicant: Some(applicant.to_string()),
        source: Some(source.to_string()),
        audit_opinion: decision.map(|d| d.0.to_string()),
        app_key: decision.map(|d| d.1.to_string()),
        app_secret: decision.map(|d| d.2.to_string()),
    }
}

pub fn applications() -> Vec<ApplicationRecord> {
    use ApplicationStatus::{Approved, Pending};
    vec![
        application("APP-20260130-005", "11", "Consumer Behaviour Analysis", BUSINESS_CATEGORY, "RESTful",
            "1 month", Approved, "2026-01-30 10:20:15", "Service Market", "System Administrator",
            Some(("Meets internal data access policy; granted for 30 days.",
                "ak_z9y8x7w6v5u4t3s2", "sk_m9n8b7v6c5x4z3a2s1d0f9g8h7j6k5l4"))),
        application("APP-20260126-001", "1", "LC09_L2SP_123039_20230313_202303...", SPATIAL_CATEGORY, "WMTS",
            "permanent", Pending, "2026-01-26 17:55:22", "Service Market", "Optics Valley Info", None),
        application("APP-20260122-002", "2", "LC09_L2SP_124038_20250917_202509...", SPATIAL_CATEGORY, "WMS",
            "1 month", Approved, "2026-01-22 11:54:44", "Service Market", "Optics Valley Info",
            Some(("Meets the requirements, approved.", "ak_7f8d9e2a1b3c4d5e", "sk_1a2b3c4d5e6f7g8h9i0j1k2l"))),
        application("APP-20260114-003", "3", "Hubei Base Geography Features V2", "Base Geography", "WFS",
            "permanent", Approved, "2026-01-14 11:46:37", "Data Market", "Optics Valley Info",
            Some(("Approved.", "ak_9a8b7c6d5e4f3g2h", "sk_z1y2x3w4v5u6t7s8r9q0p1o2"))),
        application("APP-20260107-004", "7", "xns_0.6_srs_ok_cog", SPATIAL_CATEGORY, "COG",
            "7 days", Approved, "2026-01-07 09:30:51", "Service Market", "Optics Valley Info",
            Some(("Testing use, short-term access granted.", "ak_m1n2o3p4q5r6s7t8", "sk_a1b2c3d4e5f6g7h8i9j0k1l2"))),
    ]
}

/// A store preloaded with the built-in directories, services and applications.
pub fn catalog() -> CatalogStore {
    CatalogStore::new(directories(), services(), applications())
}

/// Read a JSON forest (`[{"id", "label", "children"}]`).
///
/// Nodes are re-inserted one by one so a file with repeated or reserved ids
/// is refused instead of silently producing ambiguous lookups.
pub fn load_forest(path: &Path) -> Result<Vec<DirectoryNode>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading directory forest {}", path.display()))?;
    let parsed: Vec<DirectoryNode> = serde_json::from_str(&data)
        .with_context(|| format!("parsing directory forest {}", path.display()))?;
    let mut forest = Vec::new();
    for root in parsed {
        forest = insert_node(&forest, None, root)?;
    }
    tracing::info!(path = %path.display(), roots = forest.len(), "loaded directory forest");
    Ok(forest)
}
