/// Execution trace and replay verification.
///
/// Records every executed event into an append-only trace, hashes it
/// deterministically, and exports/imports a line-oriented text format so
/// two runs of the same model can be compared after the fact.

use std::io::{self, BufRead, Write};

use crate::error::{SchedulerError, SchedulerResult};
use crate::event::EventId;
use crate::time::VirtualTime;

const TRACE_HEADER: &str = "# DESIM TRACE v1";

// ── Hash utility ──────────────────────────────────────────────────────

/// Combine two u64 hashes deterministically.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    let mut h = a;
    h = h.wrapping_mul(0x517cc1b727220a95);
    h = h.wrapping_add(b);
    h ^= h >> 32;
    h
}

// ── Trace record ──────────────────────────────────────────────────────

/// One executed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceRecord {
    /// Position in execution order, starting at 0.
    pub index: u64,
    /// Id assigned when the event was scheduled.
    pub id: EventId,
    /// Virtual time at which it executed.
    pub time: VirtualTime,
    /// Whether an action ran.
    pub had_action: bool,
}

// ── Execution trace ───────────────────────────────────────────────────

/// Append-only record of executed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionTrace {
    records: Vec<TraceRecord>,
}

impl ExecutionTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        ExecutionTrace {
            records: Vec::new(),
        }
    }

    /// Append an executed event.
    pub fn record(&mut self, id: EventId, time: VirtualTime, had_action: bool) {
        let index = self.records.len() as u64;
        self.records.push(TraceRecord {
            index,
            id,
            time,
            had_action,
        });
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Compute a deterministic hash of the whole trace.
    pub fn trace_hash(&self) -> u64 {
        let mut h: u64 = 0;
        for r in &self.records {
            h = hash_combine(h, r.id.raw());
            h = hash_combine(h, r.time.value().to_bits());
            h = hash_combine(h, r.had_action as u64);
        }
        h
    }

    // ── Export / Import ───────────────────────────────────────────

    /// Export the trace to a writer in a deterministic text format.
    pub fn export<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{}", TRACE_HEADER)?;
        writeln!(w, "# events: {}", self.records.len())?;
        for r in &self.records {
            writeln!(
                w,
                "E {} {} {} {}",
                r.index,
                r.id.raw(),
                r.time.value(),
                u8::from(r.had_action)
            )?;
        }
        Ok(())
    }

    /// Export to a file path.
    pub fn export_to_file(&self, path: impl AsRef<std::path::Path>) -> io::Result<()> {
        let mut f = io::BufWriter::new(std::fs::File::create(path)?);
        self.export(&mut f)?;
        f.flush()
    }

    /// Import a trace previously written by [`ExecutionTrace::export`].
    pub fn import<R: BufRead>(r: R) -> SchedulerResult<Self> {
        let mut records = Vec::new();

        for (n, line) in r.lines().enumerate() {
            let line_no = n + 1;
            let line = line.map_err(|e| SchedulerError::TraceFormat {
                line: line_no,
                reason: e.to_string(),
            })?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let record = parse_record(line).map_err(|reason| SchedulerError::TraceFormat {
                line: line_no,
                reason,
            })?;
            records.push(record);
        }

        Ok(ExecutionTrace { records })
    }

    /// Export as a JSON string. Infinite times are written as `"inf"`.
    #[cfg(feature = "serialize")]
    pub fn to_json(&self) -> SchedulerResult<String> {
        serde_json::to_string(self).map_err(json_error)
    }

    /// Parse a trace from JSON produced by [`ExecutionTrace::to_json`].
    #[cfg(feature = "serialize")]
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        serde_json::from_str(json).map_err(json_error)
    }
}

// ── Verification ──────────────────────────────────────────────────────

/// Compare two traces for identical execution order.
pub fn traces_match(a: &ExecutionTrace, b: &ExecutionTrace) -> bool {
    a.records.len() == b.records.len()
        && a
            .records
            .iter()
            .zip(b.records.iter())
            .all(|(ra, rb)| ra.id == rb.id && ra.time == rb.time && ra.had_action == rb.had_action)
}

// ── Parsing ───────────────────────────────────────────────────────────

#[cfg(feature = "serialize")]
fn json_error(e: serde_json::Error) -> SchedulerError {
    SchedulerError::TraceFormat {
        line: e.line(),
        reason: e.to_string(),
    }
}

fn parse_record(line: &str) -> Result<TraceRecord, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 || parts[0] != "E" {
        return Err(format!("invalid record: {}", line));
    }

    let index: u64 = parts[1].parse().map_err(|e| format!("index: {}", e))?;
    let id: u64 = parts[2].parse().map_err(|e| format!("id: {}", e))?;
    let time: f64 = parts[3].parse().map_err(|e| format!("time: {}", e))?;
    let had_action = match parts[4] {
        "0" => false,
        "1" => true,
        other => return Err(format!("action flag: {}", other)),
    };

    Ok(TraceRecord {
        index,
        id: EventId::new(id),
        time: VirtualTime::new(time),
        had_action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExecutionTrace {
        let mut t = ExecutionTrace::new();
        t.record(EventId::new(0), VirtualTime::from(-10), false);
        t.record(EventId::new(2), VirtualTime::from(0.5), true);
        t.record(EventId::new(1), VirtualTime::from(3), true);
        t
    }

    #[test]
    fn test_hash_determinism() {
        assert_eq!(hash_combine(1, 2), hash_combine(1, 2));
        assert_ne!(hash_combine(1, 2), hash_combine(2, 1));
        assert_eq!(sample().trace_hash(), sample().trace_hash());
    }

    #[test]
    fn test_hash_sensitive_to_order() {
        let mut swapped = ExecutionTrace::new();
        swapped.record(EventId::new(0), VirtualTime::from(-10), false);
        swapped.record(EventId::new(1), VirtualTime::from(3), true);
        swapped.record(EventId::new(2), VirtualTime::from(0.5), true);
        assert_ne!(sample().trace_hash(), swapped.trace_hash());
        assert!(!traces_match(&sample(), &swapped));
    }

    #[test]
    fn test_export_import() {
        let trace = sample();
        let mut buf = Vec::new();
        trace.export(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(TRACE_HEADER));
        assert!(text.contains("E 1 2 0.5 1"));

        let back = ExecutionTrace::import(&buf[..]).unwrap();
        assert_eq!(back, trace);
        assert!(traces_match(&back, &trace));
        assert_eq!(back.trace_hash(), trace.trace_hash());
    }

    #[test]
    fn test_import_infinite_time() {
        let text = "E 0 7 inf 0\n";
        let trace = ExecutionTrace::import(text.as_bytes()).unwrap();
        assert_eq!(trace.records()[0].time, VirtualTime::INFINITY);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let text = "# DESIM TRACE v1\nE 0 1 2 1\nX nope\n";
        let err = ExecutionTrace::import(text.as_bytes()).unwrap_err();
        match err {
            SchedulerError::TraceFormat { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }

        let bad_flag = "E 0 1 2 yes\n";
        assert!(ExecutionTrace::import(bad_flag.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_trace() {
        let t = ExecutionTrace::new();
        assert!(t.is_empty());
        assert_eq!(t.trace_hash(), 0);
        assert!(traces_match(&t, &ExecutionTrace::default()));
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_json_roundtrip() {
        let trace = sample();
        let back = ExecutionTrace::from_json(&trace.to_json().unwrap()).unwrap();
        assert_eq!(back, trace);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn test_json_infinite_time() {
        let mut trace = sample();
        trace.record(EventId::new(3), VirtualTime::INFINITY, true);

        let json = trace.to_json().unwrap();
        assert!(json.contains("\"inf\""));
        let back = ExecutionTrace::from_json(&json).unwrap();
        assert_eq!(back.records()[3].time, VirtualTime::INFINITY);
        assert!(traces_match(&back, &trace));
    }
}
