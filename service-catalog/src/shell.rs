//! Line-oriented driver for catalog actions.
//!
//! Each input line maps to one store call. Failures are reported and the
//! session carries on with the store unchanged.

use crate::render;
use anyhow::{anyhow, bail, Result};
use service_catalog_core::applications::{AccessDuration, ApplicationStatus, ApplyRequest, AuditDecision};
use service_catalog_core::{ApplicationError, CatalogStore, CountMode, VIRTUAL_ROOT_ID};
use std::io::{BufRead, Write};

const HELP: &str = "\
add <parent|-> <label>      create a directory (`-` or `all` for top level)
rename <id> <label>         rename a directory
delete <id>                 delete a directory and its subtree
move <dragged> <target>     place a directory right after another one
paths                       list directories with full paths
tree [market]               show the tree with service badges
toggle <service>            flip a service between online and offline
apply <service> [duration]  request access (3d, 7d, 1m, permanent, <n>d)
approve <app> [opinion]     approve a pending application
reject <app> [opinion]      reject a pending application
apps [status]               list applications
endpoints <app>             access URLs of an approved application
help                        show this text
quit                        leave the shell
";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Add { parent: Option<String>, label: String },
    Rename { id: String, label: String },
    Delete { id: String },
    Move { dragged: String, target: String },
    Paths,
    Tree { mode: CountMode },
    Toggle { service: String },
    Apply { service: String, duration: AccessDuration },
    Audit { id: String, decision: AuditDecision, opinion: Option<String> },
    Apps { status: Option<ApplicationStatus> },
    Endpoints { id: String },
    Help,
    Quit,
}

fn rest(words: &[&str]) -> Option<String> {
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let cmd = match words.as_slice() {
        ["add", parent, label @ ..] if !label.is_empty() => Command::Add {
            parent: match *parent {
                "-" | VIRTUAL_ROOT_ID => None,
                p => Some(p.to_string()),
            },
            label: label.join(" "),
        },
        ["rename", id, label @ ..] if !label.is_empty() => Command::Rename {
            id: id.to_string(),
            label: label.join(" "),
        },
        ["delete", id] => Command::Delete { id: id.to_string() },
        ["move", dragged, target] => Command::Move {
            dragged: dragged.to_string(),
            target: target.to_string(),
        },
        ["paths"] => Command::Paths,
        ["tree"] => Command::Tree { mode: CountMode::Development },
        ["tree", "market"] => Command::Tree { mode: CountMode::Market },
        ["toggle", service] => Command::Toggle { service: service.to_string() },
        ["apply", service] => Command::Apply {
            service: service.to_string(),
            duration: AccessDuration::default(),
        },
        ["apply", service, duration] => Command::Apply {
            service: service.to_string(),
            duration: AccessDuration::parse(duration)
                .ok_or_else(|| anyhow!("unknown duration '{}'", duration))?,
        },
        ["approve", id, opinion @ ..] => Command::Audit {
            id: id.to_string(),
            decision: AuditDecision::Approve,
            opinion: rest(opinion),
        },
        ["reject", id, opinion @ ..] => Command::Audit {
            id: id.to_string(),
            decision: AuditDecision::Reject,
            opinion: rest(opinion),
        },
        ["apps"] => Command::Apps { status: None },
        ["apps", status] => Command::Apps {
            status: Some(
                ApplicationStatus::from_str(status)
                    .ok_or_else(|| anyhow!("unknown status '{}'", status))?,
            ),
        },
        ["endpoints", id] => Command::Endpoints { id: id.to_string() },
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        _ => bail!("cannot parse '{}', try `help`", line),
    };
    Ok(Some(cmd))
}

/// Run a parsed command against the store and return what to print.
pub fn execute(store: &mut CatalogStore, cmd: Command, json: bool) -> Result<String> {
    match cmd {
        Command::Add { parent, label } => {
            let id = store.add_directory(parent.as_deref(), label)?;
            Ok(format!("created {}\n", id))
        }
        Command::Rename { id, label } => {
            store.rename_directory(&id, label)?;
            Ok(format!("renamed {}\n", id))
        }
        Command::Delete { id } => {
            let removed = store.delete_directory(&id);
            Ok(format!("removed {} director{}\n", removed.len(), if removed.len() == 1 { "y" } else { "ies" }))
        }
        Command::Move { dragged, target } => {
            store.move_directory(&dragged, &target)?;
            Ok(String::new())
        }
        Command::Paths => render::paths(&store.directory_paths(), json),
        Command::Tree { mode } => render::tree(store, mode, json),
        Command::Toggle { service } => {
            let status = store.toggle_service_online(&service)?;
            Ok(format!("{} is now {}\n", service, status))
        }
        Command::Apply { service, duration } => {
            let request = ApplyRequest {
                duration,
                ..Default::default()
            };
            let record = store.apply_for_service(&service, request)?;
            render::application(&record, json)
        }
        Command::Audit { id, decision, opinion } => {
            let record = store.audit_application(&id, decision, opinion)?;
            render::application(&record, json)
        }
        Command::Apps { status } => render::applications(&store.applications().filter(status, ""), json),
        Command::Endpoints { id } => {
            let record = store
                .applications()
                .get(&id)
                .ok_or_else(|| ApplicationError::NotFound(id.clone()))?;
            render::endpoints(record, json)
        }
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    }
}

pub fn run<R: BufRead, W: Write>(store: &mut CatalogStore, input: R, mut output: W, json: bool) -> Result<()> {
    let mut events = store.subscribe();
    for line in input.lines() {
        let line = line?;
        let cmd = match parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "error: {}", e)?;
                continue;
            }
        };
        if cmd == Command::Quit {
            break;
        }
        match execute(store, cmd, json) {
            Ok(text) => write!(output, "{}", text)?,
            Err(e) => {
                tracing::debug!(error = %e, "command failed");
                writeln!(output, "error: {}", e)?;
            }
        }
        while let Ok(event) = events.try_recv() {
            write!(output, "{}", render::event(&event)?)?;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_catalog_core::applications::ApplicationLedger;
    use service_catalog_core::ids::SequenceGenerator;
    use service_catalog_core::seed;
    use std::io::Cursor;
    use std::sync::Arc;

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

    fn session(store: &mut CatalogStore, script: &str) -> String {
        let mut out = Vec::new();
        run(store, Cursor::new(script), &mut out, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_multi_word_labels() {
        assert_eq!(
            parse("add ogc Raster Services").unwrap(),
            Some(Command::Add {
                parent: Some("ogc".into()),
                label: "Raster Services".into()
            })
        );
        assert_eq!(
            parse("add all Top").unwrap(),
            Some(Command::Add { parent: None, label: "Top".into() })
        );
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("# note").unwrap(), None);
        assert!(parse("add ogc").is_err());
        assert!(parse("apply 1 fortnight").is_err());
    }

    #[test]
    fn directory_session() {
        let mut store = store();
        let out = session(&mut store, "add ogc Raster\nrename dir-1 Raster Grids\nmove dir-1 iot\n");
        assert!(out.contains("created dir-1"));
        assert!(out.contains("\"type\":\"DirectoryMoved\""));

        let roots: Vec<&str> = store.directories().iter().map(|n| n.id.as_str()).collect();
        let iot = roots.iter().position(|id| *id == "iot").unwrap();
        assert_eq!(roots[iot + 1], "dir-1");
        assert_eq!(store.find_directory("dir-1").unwrap().label, "Raster Grids");
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let mut store = store();
        let before = store.directories().to_vec();
        let out = session(&mut store, "move ogc wms\nrename nope X\nbogus\npaths\n");
        assert_eq!(out.lines().filter(|l| l.starts_with("error: ")).count(), 3);
        assert!(out.contains("OGC Standard Services / WMS Map Service"));
        assert_eq!(store.directories(), before.as_slice());
    }

    #[test]
    fn application_session() {
        let mut store = store();
        let out = session(&mut store, "apply 1 7d\napprove APP-1 ok\nreject APP-1\nquit\ntoggle 1\n");
        assert!(out.contains("APP-1"));
        assert!(out.contains("key=ak-1"));
        assert!(out.contains("error: application 'APP-1' was already approved"));
        // quit stops before the toggle
        assert!(store.services().iter().find(|s| s.id == "1").unwrap().is_online());
    }

    #[test]
    fn endpoints_follow_approval() {
        let mut store = store();
        let out = session(&mut store, "apply 9\nendpoints APP-1\napprove APP-1\nendpoints APP-1\nendpoints APP-404\n");
        assert!(out.contains("APP-1 has no endpoints (pending)"));
        assert!(out.contains("/v1/data/Weather Data Download/query?key=ak-1"));
        assert!(out.contains("error: application 'APP-404' not found"));
    }
}
