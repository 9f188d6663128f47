//! Pluggable id and credential generation.
//!
//! Everything that used to come from ad-hoc randomness goes through
//! [`IdGenerator`] so callers (and tests) can swap in deterministic sources.

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of fresh opaque identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs, used for new directory nodes.
#[derive(Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `prefix` followed by `len` random base-36 characters.
///
/// The console issues `ak_` keys of 16 characters and `sk_` secrets of 26.
pub struct TokenGenerator {
    prefix: String,
    len: usize,
    rng: Mutex<StdRng>,
}

impl TokenGenerator {
    pub fn new(prefix: impl Into<String>, len: usize) -> Self {
        Self {
            prefix: prefix.into(),
            len,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same as [`TokenGenerator::new`] but reproducible.
    pub fn seeded(prefix: impl Into<String>, len: usize, seed: u64) -> Self {
        Self {
            prefix: prefix.into(),
            len,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn app_key() -> Self {
        Self::new("ak_", 16)
    }

    pub fn app_secret() -> Self {
        Self::new("sk_", 26)
    }
}

impl IdGenerator for TokenGenerator {
    fn next_id(&self) -> String {
        let mut rng = self.rng.lock();
        let mut out = String::with_capacity(self.prefix.len() + self.len);
        out.push_str(&self.prefix);
        for _ in 0..self.len {
            out.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
        }
        out
    }
}

/// Application ids of the form `APP-YYYYMMDD-NNN` with `NNN` in `100..=999`.
pub struct ApplicationIdGenerator {
    date: Option<NaiveDate>,
    rng: Mutex<StdRng>,
}

impl ApplicationIdGenerator {
    /// Uses today's UTC date for every id.
    pub fn new() -> Self {
        Self {
            date: None,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Pins the date and the random suffix sequence.
    pub fn fixed(date: NaiveDate, seed: u64) -> Self {
        Self {
            date: Some(date),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for ApplicationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for ApplicationIdGenerator {
    fn next_id(&self) -> String {
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        let suffix: u32 = self.rng.lock().gen_range(100..=999);
        format!("APP-{}-{}", date.format("%Y%m%d"), suffix)
    }
}

/// Deterministic `prefix-1`, `prefix-2`, ... ids.
pub struct SequenceGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequenceGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequenceGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
