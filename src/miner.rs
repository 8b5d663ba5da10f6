//! Proof-of-work mining.
//!
//! Mining is a random search over the 64-bit puzzle field until the digest
//! of the block carries enough trailing zero bits. Every search is bounded
//! by an attempt budget, so it always terminates. Attempts are independent,
//! so several miners may search against the same predecessor at once;
//! choosing between their results is left to the caller.

use crate::block::Block;
use crate::difficulty::DifficultyPolicy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// A sealed block that links to the predecessor.
    Found { block: Block, attempts: u64 },
    /// The budget ran out.
    Exhausted { attempts: u64 },
    /// The wallet mined the predecessor, so no successor can be valid.
    SameWallet,
    /// The cancellation flag was raised between attempts.
    Cancelled { attempts: u64 },
}

impl MineOutcome {
    pub fn into_block(self) -> Option<Block> {
        match self {
            MineOutcome::Found { block, .. } => Some(block),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MineOutcome::Found { .. })
    }

    pub fn attempts(&self) -> u64 {
        match self {
            MineOutcome::Found { attempts, .. }
            | MineOutcome::Exhausted { attempts }
            | MineOutcome::Cancelled { attempts } => *attempts,
            MineOutcome::SameWallet => 0,
        }
    }
}

/// A single-threaded miner with an injected random source.
pub struct Miner<R = StdRng> {
    policy: DifficultyPolicy,
    rng: R,
    cancel: Option<Arc<AtomicBool>>,
}

impl Miner<StdRng> {
    /// Miner seeded from OS entropy.
    pub fn from_entropy(policy: DifficultyPolicy) -> Self {
        Self::new(policy, StdRng::from_entropy())
    }

    /// Deterministic miner, mostly useful in tests.
    pub fn seeded(policy: DifficultyPolicy, seed: u64) -> Self {
        Self::new(policy, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Miner<R> {
    pub fn new(policy: DifficultyPolicy, rng: R) -> Self {
        Self {
            policy,
            rng,
            cancel: None,
        }
    }

    /// Stop searching as soon as `flag` becomes true.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn policy(&self) -> &DifficultyPolicy {
        &self.policy
    }

    /// Try to mine a successor of `prev`, returning it only on success.
    pub fn mine(&mut self, wallet_number: u32, prev: &Block, attempt_budget: u64) -> Option<Block> {
        self.search(wallet_number, prev, attempt_budget).into_block()
    }

    /// Try up to `attempt_budget` random puzzles for a successor of `prev`.
    pub fn search(&mut self, wallet_number: u32, prev: &Block, attempt_budget: u64) -> MineOutcome {
        if wallet_number == prev.wallet_number() {
            return MineOutcome::SameWallet;
        }
        let Some(serial_number) = prev.serial_number().checked_add(1) else {
            return MineOutcome::Exhausted { attempts: 0 };
        };
        let mut candidate = match Block::create(serial_number, wallet_number, prev.sig_high()) {
            Ok(block) => block,
            Err(_) => return MineOutcome::Exhausted { attempts: 0 },
        };

        debug!(
            serial_number,
            wallet_number,
            zero_bits = self.policy.required_zero_bits(serial_number),
            attempt_budget,
            "mining started"
        );

        for attempt in 0..attempt_budget {
            if self.is_cancelled() {
                debug!(serial_number, attempts = attempt, "mining cancelled");
                return MineOutcome::Cancelled { attempts: attempt };
            }

            candidate.set_puzzle(self.rng.gen::<u64>());
            let digest = candidate.digest();
            if !self.policy.is_satisfied_by(serial_number, &digest) {
                continue;
            }

            candidate.seal_signature(&digest);
            if !candidate.verify_signature(&self.policy).is_ok() {
                // Same bytes, same digest: only reachable if hashing is broken.
                return MineOutcome::Exhausted {
                    attempts: attempt + 1,
                };
            }
            info!(serial_number, attempts = attempt + 1, "block mined");
            return MineOutcome::Found {
                block: candidate,
                attempts: attempt + 1,
            };
        }

        debug!(serial_number, attempt_budget, "mining budget exhausted");
        MineOutcome::Exhausted {
            attempts: attempt_budget,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Search with `workers` independent miners; the first success stops the rest.
///
/// Each worker gets its own budget and its own entropy-seeded generator.
pub fn mine_parallel(
    policy: DifficultyPolicy,
    wallet_number: u32,
    prev: &Block,
    budget_per_worker: u64,
    workers: usize,
) -> Option<Block> {
    mine_parallel_with_flag(
        policy,
        wallet_number,
        prev,
        budget_per_worker,
        workers,
        Arc::new(AtomicBool::new(false)),
    )
}

/// As [`mine_parallel`], but also stops when `stop` is raised externally.
pub fn mine_parallel_with_flag(
    policy: DifficultyPolicy,
    wallet_number: u32,
    prev: &Block,
    budget_per_worker: u64,
    workers: usize,
    stop: Arc<AtomicBool>,
) -> Option<Block> {
    if wallet_number == prev.wallet_number() {
        return None;
    }
    (0..workers.max(1)).into_par_iter().find_map_any(|worker| {
        let mut miner = Miner::from_entropy(policy).with_cancel_flag(stop.clone());
        match miner.search(wallet_number, prev, budget_per_worker) {
            MineOutcome::Found { block, attempts } => {
                stop.store(true, Ordering::Relaxed);
                debug!(worker, attempts, "worker found block");
                Some(block)
            }
            _ => None,
        }
    })
}
