//! Fault gate sampling.

use crate::routing::FaultSpec;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the uniform draws that decide whether a fault gate fires.
pub trait FaultRoller: Send + Sync {
    /// Uniform integer in `[0, upper)`. Returns 0 when `upper` is 0.
    fn roll(&self, upper: u32) -> u32;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngRoller;

impl FaultRoller for ThreadRngRoller {
    fn roll(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Reproducible draws from a seeded generator.
#[derive(Debug)]
pub struct SeededRoller {
    rng: Mutex<StdRng>,
}

impl SeededRoller {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FaultRoller for SeededRoller {
    fn roll(&self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.rng.lock().gen_range(0..upper)
    }
}

/// Draw once and report whether `fault` fires.
pub fn should_fire(fault: &FaultSpec, roller: &dyn FaultRoller) -> bool {
    roller.roll(100) < u32::from(fault.percentage())
}
