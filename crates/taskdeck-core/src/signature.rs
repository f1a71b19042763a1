//! Cheap equality fingerprints for rendered tasks.
//!
//! The differential renderer skips rebuilding a view node when the
//! task's display-relevant fields are unchanged. Rather than comparing
//! every field on every refresh, each task is reduced to a blake3 hash
//! over a deterministic serialization of those fields; two tasks with
//! equal fields always produce equal signatures.

use crate::model::Task;

/// Fingerprint of a task's display-relevant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskSignature([u8; 32]);

impl TaskSignature {
    /// Compute the signature for a task.
    #[must_use]
    pub fn of(task: &Task) -> Self {
        let mut hasher = blake3::Hasher::new();
        field(&mut hasher, task.title.as_bytes());
        field(&mut hasher, task.status.to_string().as_bytes());
        opt(&mut hasher, task.assignee.map(|a| a.to_string()));
        opt(&mut hasher, task.category.as_ref().map(ToString::to_string));
        opt(&mut hasher, task.due_date.map(|d| d.to_string()));
        opt(&mut hasher, task.scheduled_date.map(|d| d.to_string()));
        opt(&mut hasher, task.completion_date.map(|d| d.to_string()));
        opt(&mut hasher, task.run_start.map(|t| t.to_rfc3339()));
        opt(&mut hasher, task.run_end.map(|t| t.to_rfc3339()));
        field(&mut hasher, task.memo.as_bytes());
        field(&mut hasher, task.url.as_bytes());
        opt(&mut hasher, task.priority.clone());
        opt(&mut hasher, task.phase_data_change.map(|p| p.to_string()));
        opt(&mut hasher, task.phase_inquiry.map(|p| p.to_string()));
        opt(&mut hasher, task.phase_review.map(|p| p.to_string()));
        Self(*hasher.finalize().as_bytes())
    }

    /// Short hex form for logs.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

// Length-prefixing keeps adjacent fields from aliasing (e.g. title "ab"
// + memo "c" vs title "a" + memo "bc").
fn field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn opt(hasher: &mut blake3::Hasher, value: Option<String>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            field(hasher, v.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
