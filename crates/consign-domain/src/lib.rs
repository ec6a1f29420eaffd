//! consign-domain
//!
//! Pure domain models for the consignment ledger (items, parties, payments,
//! payouts, expenses, installment plans) and the date-range primitives every
//! report shares. No I/O, no CLI, no storage.

pub mod common;
pub mod dimension;
pub mod installment;
pub mod item;
pub mod ledger;
pub mod payment;
pub mod range;

pub use common::*;
pub use dimension::*;
pub use installment::*;
pub use item::*;
pub use ledger::*;
pub use payment::*;
pub use range::*;
