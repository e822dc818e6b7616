//! Record signatures and the set of signatures already admitted.

use std::collections::HashSet;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::model::LogRecord;

/// Content hash over the record's field tuple.
///
/// Each field is length-prefixed before hashing, so no field value can
/// masquerade as a field boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 32]);

impl Signature {
    pub fn of(record: &LogRecord) -> Self {
        let opt = |v: &Option<String>| v.as_deref().unwrap_or("").to_string();
        let fields = [
            record.timestamp.clone(),
            record.level.as_str().to_uppercase(),
            record.category.clone(),
            record.event.clone(),
            opt(&record.action),
            opt(&record.reason),
            opt(&record.message),
            opt(&record.request_id),
            opt(&record.path),
            opt(&record.status_code),
            opt(&record.duration_ms),
            opt(&record.exception_text),
            opt(&record.stack_trace),
        ];

        let mut hasher = Sha256::new();
        for f in &fields {
            hasher.update((f.len() as u64).to_le_bytes());
            hasher.update(f.as_bytes());
        }
        Signature(hasher.finalize().into())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DedupeIndex {
    seen: HashSet<Signature>,
}

impl DedupeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signature(&self, record: &LogRecord) -> Signature {
        Signature::of(record)
    }

    pub fn has_seen(&self, sig: &Signature) -> bool {
        self.seen.contains(sig)
    }

    /// Returns `true` if the signature was not already present.
    pub fn mark_seen(&mut self, sig: Signature) -> bool {
        self.seen.insert(sig)
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
