use anyhow::Result;
use service_catalog_core::applications::ApplicationRecord;
use service_catalog_core::events::CatalogEvent;
use service_catalog_core::services::ServiceRecord;
use service_catalog_core::{CatalogStore, CountMode, DirectoryNode, PathEntry, VIRTUAL_ROOT_ID};
use std::fmt::Write;

fn json_line<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

pub fn paths(entries: &[PathEntry], json: bool) -> Result<String> {
    if json {
        return json_line(entries);
    }
    let mut out = String::new();
    for entry in entries {
        writeln!(out, "{:<16} {}", entry.id, entry.label)?;
    }
    Ok(out)
}

pub fn tree(store: &CatalogStore, mode: CountMode, json: bool) -> Result<String> {
    fn walk(nodes: &[DirectoryNode], depth: usize, out: &mut String) -> std::fmt::Result {
        for node in nodes {
            writeln!(
                out,
                "{}{} [{}] ({})",
                "  ".repeat(depth),
                node.label,
                node.id,
                node.count.unwrap_or(0)
            )?;
            walk(&node.children, depth + 1, out)?;
        }
        Ok(())
    }

    let forest = store.forest_with_counts(mode);
    if json {
        return json_line(&forest);
    }
    let mut out = format!("All services ({})\n", store.directory_count(VIRTUAL_ROOT_ID));
    walk(&forest, 1, &mut out)?;
    Ok(out)
}

pub fn services(records: &[&ServiceRecord], json: bool) -> Result<String> {
    if json {
        return json_line(records);
    }
    let mut out = String::new();
    for r in records {
        writeln!(
            out,
            "{:<8} {:<8} {:<12} {:<6} {}",
            r.id, r.status, r.dir_id, r.service_type, r.name
        )?;
    }
    writeln!(out, "{} service(s)", records.len())?;
    Ok(out)
}

pub fn applications(records: &[&ApplicationRecord], json: bool) -> Result<String> {
    if json {
        return json_line(records);
    }
    let mut out = String::new();
    for r in records {
        write!(out, "{:<18} {:<9} {:<10} {}", r.id, r.status, r.duration, r.service_name)?;
        if let Some(key) = &r.app_key {
            write!(out, "  key={}", key)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{} application(s)", records.len())?;
    Ok(out)
}

pub fn application(record: &ApplicationRecord, json: bool) -> Result<String> {
    applications(&[record], json)
}

pub fn endpoints(record: &ApplicationRecord, json: bool) -> Result<String> {
    let endpoints = record.endpoints();
    if json {
        return json_line(&endpoints);
    }
    if endpoints.is_empty() {
        return Ok(format!("{} has no endpoints ({})\n", record.id, record.status));
    }
    let mut out = String::new();
    for e in &endpoints {
        writeln!(out, "{:<28} {}", e.label, e.url)?;
    }
    Ok(out)
}

pub fn event(event: &CatalogEvent) -> Result<String> {
    Ok(format!("~ {}\n", serde_json::to_string(event)?))
}
