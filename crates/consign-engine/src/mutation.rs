//! All-or-nothing ledger mutation.

use consign_domain::Ledger;

use crate::CoreResult;

/// Runs `apply` against a working copy and commits it only on success, so a
/// failure part-way through leaves `ledger` exactly as it was.
pub fn transact<T, F>(ledger: &mut Ledger, apply: F) -> CoreResult<T>
where
    F: FnOnce(&mut Ledger) -> CoreResult<T>,
{
    let mut working = ledger.clone();
    let outcome = apply(&mut working)?;
    working.touch();
    *ledger = working;
    Ok(outcome)
}
