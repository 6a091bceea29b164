use std::sync::atomic::{AtomicU64, Ordering};

/// Custom epoch: 2024-01-01T00:00:00Z in milliseconds since the Unix epoch.
const EPOCH_MS: i64 = 1_704_067_200_000;

const WORKER_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const WORKER_MAX: u16 = (1 << WORKER_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a time-ordered 64-bit id: 41 bits of millisecond timestamp,
/// 10 bits of worker id, 12 bits of per-process sequence.
///
/// Ids generated within the same millisecond differ in the sequence field;
/// the sequence wraps at 4096 which is far above the request rate a single
/// instance handles.
pub fn generate(worker_id: u16) -> i64 {
    let worker = u64::from(worker_id & WORKER_MAX);
    let now_ms = chrono::Utc::now().timestamp_millis() - EPOCH_MS;
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) & SEQUENCE_MASK;

    ((now_ms as u64) << (WORKER_BITS + SEQUENCE_BITS) | worker << SEQUENCE_BITS | seq) as i64
}

/// Extract the creation timestamp (milliseconds since the Unix epoch) from an id.
pub fn timestamp_ms(id: i64) -> i64 {
    ((id as u64) >> (WORKER_BITS + SEQUENCE_BITS)) as i64 + EPOCH_MS
}
