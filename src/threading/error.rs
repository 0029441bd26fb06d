use thiserror::Error;

/// Data integrity faults found while assembling a thread.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("cycle detected at {message_id} while assembling thread rooted at {root_id}")]
    CycleDetected { root_id: String, message_id: String },
    #[error("thread root {root_id} is not part of the record set")]
    UnknownRoot { root_id: String },
}
