//! Cross-partition 2:1 refinement balance: local violation detection plus
//! the `O(log P)` butterfly exchange protocol that resolves them (§4.6).

pub mod checker;
pub mod protocol;
pub mod wire;

pub use checker::{BalanceViolation, TwoOneBalanceChecker};
pub use protocol::{default_max_rounds, BalanceTransport, ButterflyOutcome, ButterflyProtocol};
pub use wire::{RefinementRequest, RefinementResponse};
