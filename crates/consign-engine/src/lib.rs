//! consign-engine
//!
//! Financial analytics and settlement engine for the consignment ledger.
//! Depends on consign-domain and consign-config. No CLI, no terminal I/O, no
//! direct storage interactions.

pub mod breakdown;
pub mod dimension;
pub mod error;
pub mod filter;
pub mod health;
pub mod installment;
pub mod inventory;
pub mod kpi;
pub mod math;
pub mod mutation;
pub mod profitability;
pub mod sales;
pub mod settlement;
pub mod storage;
pub mod time;
pub mod trend;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use breakdown::*;
pub use dimension::*;
pub use error::{CoreError, CoreResult};
pub use filter::*;
pub use health::*;
pub use installment::*;
pub use inventory::*;
pub use kpi::*;
pub use mutation::transact;
pub use profitability::*;
pub use settlement::*;
pub use storage::*;
pub use time::*;
pub use trend::*;
