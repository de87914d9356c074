//! Snowflake-style identifier generator for artifacts.
//!
//! Layout (most significant bit first):
//! - 1 unused sign bit
//! - 41 bits of milliseconds since [`EPOCH_MILLIS`]
//! - 5 bits datacenter id
//! - 5 bits worker id
//! - 12 bits per-millisecond sequence

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Custom epoch (2010-11-04T01:42:54.657Z).
pub const EPOCH_MILLIS: u64 = 1_288_834_974_657;

const WORKER_ID_BITS: u64 = 5;
const DATACENTER_ID_BITS: u64 = 5;
const SEQUENCE_BITS: u64 = 12;

pub const MAX_WORKER_ID: u64 = (1 << WORKER_ID_BITS) - 1;
pub const MAX_DATACENTER_ID: u64 = (1 << DATACENTER_ID_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

const WORKER_ID_SHIFT: u64 = SEQUENCE_BITS;
const DATACENTER_ID_SHIFT: u64 = SEQUENCE_BITS + WORKER_ID_BITS;
const TIMESTAMP_SHIFT: u64 = SEQUENCE_BITS + WORKER_ID_BITS + DATACENTER_ID_BITS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("Clock moved backwards: refusing to generate id for {0} ms")]
    ClockMovedBackwards(u64),

    #[error("Worker id {0} exceeds maximum of {MAX_WORKER_ID}")]
    InvalidWorkerId(u64),

    #[error("Datacenter id {0} exceeds maximum of {MAX_DATACENTER_ID}")]
    InvalidDatacenterId(u64),

    #[error("Id generator state is poisoned")]
    Poisoned,
}

/// Source of wall-clock milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

pub struct SnowflakeGenerator<C: Clock = SystemClock> {
    datacenter_id: u64,
    worker_id: u64,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator<SystemClock> {
    pub fn new(datacenter_id: u64, worker_id: u64) -> Result<Self, IdError> {
        Self::with_clock(datacenter_id, worker_id, SystemClock)
    }
}

impl<C: Clock> SnowflakeGenerator<C> {
    pub fn with_clock(datacenter_id: u64, worker_id: u64, clock: C) -> Result<Self, IdError> {
        if worker_id > MAX_WORKER_ID {
            return Err(IdError::InvalidWorkerId(worker_id));
        }
        if datacenter_id > MAX_DATACENTER_ID {
            return Err(IdError::InvalidDatacenterId(datacenter_id));
        }

        Ok(Self {
            datacenter_id,
            worker_id,
            clock,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    /// Returns the next identifier.
    ///
    /// Fails with [`IdError::ClockMovedBackwards`] while the clock reads earlier
    /// than the last issued timestamp.
    pub fn next_id(&self) -> Result<u64, IdError> {
        let mut state = self.state.lock().map_err(|_| IdError::Poisoned)?;

        let mut timestamp = self.clock.now_millis();
        if timestamp < state.last_timestamp {
            return Err(IdError::ClockMovedBackwards(
                state.last_timestamp - timestamp,
            ));
        }

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                timestamp = self.wait_next_millis(state.last_timestamp);
            }
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = timestamp;

        Ok((timestamp.saturating_sub(EPOCH_MILLIS) << TIMESTAMP_SHIFT)
            | (self.datacenter_id << DATACENTER_ID_SHIFT)
            | (self.worker_id << WORKER_ID_SHIFT)
            | state.sequence)
    }

    fn wait_next_millis(&self, last_timestamp: u64) -> u64 {
        let mut timestamp = self.clock.now_millis();
        while timestamp <= last_timestamp {
            std::hint::spin_loop();
            timestamp = self.clock.now_millis();
        }
        timestamp
    }
}
