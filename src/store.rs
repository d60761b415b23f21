//! Best-effort Workstream persistence (§6): "on task success with an
//! agent identifier, a Workstream record is written to a key-value store
//! keyed by a generated id. This is best-effort; failure MUST NOT affect
//! the response." Modeled as a trait so the HTTP layer never has to care
//! whether the backing store is memory or a file.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use taskbrowser_core_types::{TaskId, TaskOutcome};
use tracing::warn;

#[derive(Clone, Debug, Serialize)]
pub struct WorkstreamRecord {
    pub id: String,
    pub agent_id: String,
    pub query: String,
    pub overall_success: bool,
    pub outcome: Value,
}

pub trait WorkstreamStore: Send + Sync {
    /// Persists the outcome and returns the generated record id, if the
    /// outcome qualifies (task succeeded and the caller supplied an agent
    /// identifier on the originating `Query` — a generated fallback id
    /// does not count). Never returns an error: persistence problems are
    /// logged and swallowed so they can never affect the HTTP response.
    fn record(&self, outcome: &TaskOutcome, caller_supplied_agent_id: bool) -> Option<String>;

    fn get(&self, id: &str) -> Option<WorkstreamRecord>;

    fn list_by_agent(&self, agent_id: &str) -> Vec<WorkstreamRecord>;
}

/// In-memory store, optionally mirrored to an append-only JSON-lines file.
/// The file mirror is purely diagnostic — `get` always reads from memory.
pub struct DefaultWorkstreamStore {
    records: DashMap<String, WorkstreamRecord>,
    mirror_path: Option<PathBuf>,
}

impl DefaultWorkstreamStore {
    pub fn new(mirror_path: Option<PathBuf>) -> Self {
        Self {
            records: DashMap::new(),
            mirror_path,
        }
    }

    fn mirror(&self, record: &WorkstreamRecord) {
        let Some(path) = &self.mirror_path else {
            return;
        };
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "failed to serialise workstream record for disk mirror");
                return;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(%err, path = %parent.display(), "failed to create workstream mirror directory");
                return;
            }
        }
        use std::io::Write;
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path);
        match file {
            Ok(mut file) => {
                if let Err(err) = writeln!(file, "{line}") {
                    warn!(%err, "failed to append workstream record to disk mirror");
                }
            }
            Err(err) => warn!(%err, path = %path.display(), "failed to open workstream mirror file"),
        }
    }
}

impl WorkstreamStore for DefaultWorkstreamStore {
    fn record(&self, outcome: &TaskOutcome, caller_supplied_agent_id: bool) -> Option<String> {
        if !outcome.overall_success || !caller_supplied_agent_id {
            return None;
        }

        let value = match serde_json::to_value(outcome) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "failed to serialise task outcome, skipping workstream record");
                return None;
            }
        };

        let record = WorkstreamRecord {
            id: TaskId::new().to_string(),
            agent_id: outcome.agent_id.clone(),
            query: outcome.query.clone(),
            overall_success: outcome.overall_success,
            outcome: value,
        };

        self.mirror(&record);
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        Some(id)
    }

    fn get(&self, id: &str) -> Option<WorkstreamRecord> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    fn list_by_agent(&self, agent_id: &str) -> Vec<WorkstreamRecord> {
        self.records
            .iter()
            .filter(|entry| entry.value().agent_id == agent_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

pub fn shared_store(mirror_path: Option<PathBuf>) -> Arc<dyn WorkstreamStore> {
    Arc::new(DefaultWorkstreamStore::new(mirror_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbrowser_core_types::{StepRecord, TaskResult, TaskResultData};

    #[test]
    fn successful_outcome_with_caller_agent_id_is_recorded_and_retrievable() {
        let store = DefaultWorkstreamStore::new(None);
        let step = StepRecord::new("open_url", TaskResult::success("ok", TaskResultData::new("t", "https://x")));
        let outcome = TaskOutcome::from_steps("agent-1", "go to x", vec![step]);

        let id = store.record(&outcome, true).expect("successful outcome is recorded");
        let fetched = store.get(&id).expect("record is retrievable by id");
        assert_eq!(fetched.agent_id, "agent-1");
        assert!(fetched.overall_success);
    }

    #[test]
    fn successful_outcome_without_caller_agent_id_is_not_recorded() {
        let store = DefaultWorkstreamStore::new(None);
        let step = StepRecord::new("open_url", TaskResult::success("ok", TaskResultData::new("t", "https://x")));
        let outcome = TaskOutcome::from_steps("generated-fallback-id", "go to x", vec![step]);

        assert!(store.record(&outcome, false).is_none());
    }

    #[test]
    fn failed_outcome_is_not_recorded() {
        let store = DefaultWorkstreamStore::new(None);
        let step = StepRecord::new(
            "open_url",
            TaskResult::failure("nope", TaskResultData::empty(), "InternalError"),
        );
        let outcome = TaskOutcome::from_steps("agent-1", "go to x", vec![step]);

        assert!(store.record(&outcome, true).is_none());
    }
}
