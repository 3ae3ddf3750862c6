//! Debug trace instrumentation.
//!
//! A pure observer over the matcher: when `debug` is enabled, every
//! evaluated expression node records its label, outcome and (optionally)
//! elapsed time into a [`TraceNode`] tree. Tracing never changes which
//! records match; short-circuited branches simply produce no child nodes.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

/// Trace collection settings threaded through the matcher
#[derive(Debug, Clone, Copy)]
pub(crate) struct TraceOpts {
    pub timings: bool,
}

/// One evaluated expression node
#[derive(Debug, Clone, Serialize)]
pub struct TraceNode {
    /// Compact expression label, e.g. `age $gte` or `$and (2)`
    pub label: String,
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Duration>,
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    fn render_into(&self, out: &mut String, depth: usize) {
        let marker = if self.result { "✓" } else { "✗" };
        let _ = write!(out, "{}{} {}", "  ".repeat(depth), marker, self.label);
        if let Some(elapsed) = self.elapsed {
            let _ = write!(out, " ({:?})", elapsed);
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

/// Evaluation trace for one record of the source collection
#[derive(Debug, Clone, Serialize)]
pub struct RecordTrace {
    /// Index of the record in the source collection
    pub index: usize,
    pub matched: bool,
    pub root: TraceNode,
}

/// Full trace of one filter call
#[derive(Debug, Clone, Serialize)]
pub struct FilterTrace {
    /// Number of records that matched
    pub matched: usize,
    /// Number of records scanned
    pub total: usize,
    /// Wall time of the whole call, matching and post-processing included
    pub execution_time: Duration,
    pub records: Vec<RecordTrace>,
}

impl FilterTrace {
    /// Indented human-readable rendering of the whole trace
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}/{} matched in {:?}",
            self.matched, self.total, self.execution_time
        );
        for record in &self.records {
            let _ = writeln!(out, "record {}:", record.index);
            record.root.render_into(&mut out, 1);
        }
        out
    }
}
