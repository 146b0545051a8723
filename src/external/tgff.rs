//! TGFF benchmark import: a minimal, explicitly best-effort line-oriented
//! scanner over the small subset of the TGFF grammar this crate cares
//! about. Enough to stand up a trivial [`Specification`] skeleton for
//! smoke tests, not a full parser for the format.
//!
//! Grounded in the teacher's `workflow/importer.rs` `DrawIoLoader`: a
//! line/block scanner that tolerates garbage by skipping what it doesn't
//! recognize rather than failing the whole parse.

use std::io::{BufRead, BufReader, Read};

use crate::error::SpecError;
use crate::external::Importer;
use crate::spec::{Dependency, Link, Resource, Specification, Task};

#[derive(Clone, PartialEq, Eq)]
enum Block {
    TaskGraph,
    Resource,
    Wiring,
    Other,
}

/// Parses the subset of TGFF this crate recognizes:
/// `@HYPERPERIOD <n>`, `@TASK_GRAPH <id> { ... TASK <id> TYPE <n> ...
/// ARC <id> FROM <src> TO <dst> TYPE <n> ... }`,
/// `@COMMUN_QUANT <id> { ... }` (ignored; quantifies link cost, not
/// topology), `@CORE|@PROC|@CLIENT_PE|@SERVER_PE <id> { ... }` (each
/// becomes one [`Resource`] named by the block's own id), and
/// `@WIRING { LINK <id> <src> <dst> ... }`. `#`-prefixed text is a
/// comment; blocks close with a bare `}`.
pub struct TgffImporter;

impl Importer for TgffImporter {
    fn import<R: Read>(reader: R) -> Result<Specification, SpecError> {
        let buf = BufReader::new(reader);
        let mut spec = Specification::new();
        let mut block = Block::Other;
        let mut arc_count = 0usize;

        for line in buf.lines() {
            let line = line.map_err(|e| SpecError::malformed(format!("TGFF read error: {e}")))?;
            let line = strip_comment(&line).trim();
            if line.is_empty() {
                continue;
            }
            if line == "}" {
                block = Block::Other;
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(&head) = tokens.first() else { continue };

            if let Some(name) = head.strip_prefix('@') {
                if line.ends_with('{') {
                    block = match name {
                        "TASK_GRAPH" => Block::TaskGraph,
                        "CORE" | "PROC" | "CLIENT_PE" | "SERVER_PE" => Block::Resource,
                        "WIRING" => Block::Wiring,
                        _ => Block::Other,
                    };
                    if block == Block::Resource {
                        if let Some(&id) = tokens.get(1) {
                            spec.architecture.add_resource(Resource::new(id));
                        }
                    }
                }
                continue;
            }

            match block {
                Block::TaskGraph => match head {
                    "TASK" => {
                        if let Some(&id) = tokens.get(1) {
                            spec.application.add_task(Task::process(id));
                        }
                    }
                    "ARC" => {
                        let (Some(&id), Some(&"FROM"), Some(&src), Some(&"TO"), Some(&dst)) =
                            (tokens.get(1), tokens.get(2), tokens.get(3), tokens.get(4), tokens.get(5))
                        else {
                            continue;
                        };
                        if !spec.application.contains_task(src) || !spec.application.contains_task(dst) {
                            continue;
                        }
                        let comm_id = format!("comm_{id}");
                        spec.application.add_task(Task::communication(&comm_id));
                        let dep_in = Dependency::new(format!("d_{arc_count}_in"));
                        let dep_out = Dependency::new(format!("d_{arc_count}_out"));
                        arc_count += 1;
                        spec.application.add_dependency(dep_in, src, &comm_id)?;
                        spec.application.add_dependency(dep_out, &comm_id, dst)?;
                    }
                    _ => {}
                },
                Block::Wiring => {
                    if head == "LINK" {
                        let (Some(&id), Some(&src), Some(&dst)) = (tokens.get(1), tokens.get(2), tokens.get(3))
                        else {
                            continue;
                        };
                        if spec.architecture.contains_resource(src) && spec.architecture.contains_resource(dst) {
                            let _ = spec.architecture.add_link(Link::new(id), src, dst, false);
                        }
                    }
                }
                Block::Resource | Block::Other => {}
            }
        }

        Ok(spec)
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

pub fn import_str(text: &str) -> Result<Specification, SpecError> {
    TgffImporter::import(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        @HYPERPERIOD 1200

        @CORE pe0 {
        }
        @CORE pe1 {
        }

        @WIRING {
          LINK l0 pe0 pe1
        }

        @TASK_GRAPH 0 {
          PERIOD 1200
          TASK t0_0 TYPE 0
          TASK t0_1 TYPE 0
          ARC a0_0 FROM t0_0 TO t0_1 TYPE 0
        }
    "#;

    #[test]
    fn imports_tasks_and_arcs_as_application_graph() {
        let spec = import_str(SAMPLE).unwrap();
        assert!(spec.application.contains_task("t0_0"));
        assert!(spec.application.contains_task("t0_1"));
        assert!(spec.application.task("comm_a0_0").unwrap().is_communication());
        assert_eq!(spec.application.predecessors("comm_a0_0"), vec!["t0_0".to_string()]);
        assert_eq!(spec.application.successors("comm_a0_0"), vec!["t0_1".to_string()]);
    }

    #[test]
    fn imports_resources_and_links() {
        let spec = import_str(SAMPLE).unwrap();
        assert!(spec.architecture.contains_resource("pe0"));
        assert!(spec.architecture.contains_resource("pe1"));
        assert_eq!(spec.architecture.links().count(), 1);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "# a leading comment\n\n@HYPERPERIOD 500 # trailing comment\n";
        let spec = import_str(text).unwrap();
        assert_eq!(spec.application.tasks().count(), 0);
    }

    #[test]
    fn arc_referencing_unknown_task_is_skipped() {
        let text = "@TASK_GRAPH 0 {\nARC a0 FROM missing TO also_missing TYPE 0\n}\n";
        let spec = import_str(text).unwrap();
        assert_eq!(spec.application.tasks().count(), 0);
    }
}
