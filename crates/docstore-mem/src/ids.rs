//! Document id generation.

use parking_lot::Mutex;
use rand::Rng;
use uuid::Uuid;

use crate::config::IdType;

/// Generates new document ids for one repository.
#[derive(Debug)]
pub struct IdGenerator {
    id_type: IdType,
    debug_ids: bool,
    /// Last value handed out by a sequence id type.
    last: Mutex<u64>,
}

impl IdGenerator {
    pub fn new(id_type: IdType, debug_ids: bool) -> Self {
        let initial = if id_type == IdType::SequenceHexRandomized && !debug_ids {
            random_seed()
        } else {
            0
        };
        Self {
            id_type,
            debug_ids,
            last: Mutex::new(initial),
        }
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn next_id(&self) -> String {
        if self.debug_ids {
            return format!("UUID_{}", self.next_counter());
        }
        match self.id_type {
            IdType::Varchar => Uuid::new_v4().to_string(),
            IdType::Sequence => self.next_counter().to_string(),
            IdType::SequenceHexRandomized => {
                let mut last = self.last.lock();
                *last = xorshift(*last);
                format!("{:016x}", *last)
            }
        }
    }

    fn next_counter(&self) -> u64 {
        let mut last = self.last.lock();
        *last += 1;
        *last
    }
}

fn random_seed() -> u64 {
    let mut rng = rand::thread_rng();
    loop {
        let seed: u64 = rng.gen();
        if seed != 0 {
            return seed;
        }
    }
}

/// Marsaglia xorshift, period 2^64 - 1. Never yields 0 from a nonzero input.
fn xorshift(mut n: u64) -> u64 {
    n ^= n << 13;
    n ^= n >> 7;
    n ^= n << 17;
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_debug_ids() {
        let ids = IdGenerator::new(IdType::Varchar, true);
        assert_eq!(ids.next_id(), "UUID_1");
        assert_eq!(ids.next_id(), "UUID_2");
    }

    #[test]
    fn test_sequence() {
        let ids = IdGenerator::new(IdType::Sequence, false);
        assert_eq!(ids.next_id(), "1");
        assert_eq!(ids.next_id(), "2");
    }

    #[test]
    fn test_varchar_is_uuid() {
        let ids = IdGenerator::new(IdType::Varchar, false);
        let id = ids.next_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, ids.next_id());
    }

    #[test]
    fn test_hex_randomized() {
        let ids = IdGenerator::new(IdType::SequenceHexRandomized, false);
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 1000);
        for id in &generated {
            assert_eq!(id.len(), 16);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_xorshift_nonzero() {
        let mut n = 1u64;
        for _ in 0..10_000 {
            n = xorshift(n);
            assert_ne!(n, 0);
        }
    }
}
