#![warn(missing_docs)]
//! # mosaic-match
//!
//! ## Purpose
//! Finds and claims the unused grid cell nearest to a target color.
//!
//! ## Responsibilities
//! - Scan the grid index in its stable row-major order.
//! - Track the running-minimum Euclidean RGB distance with strict `<`.
//! - Claim the winning cell inside the same call that selects it.
//!
//! ## Data flow
//! Upload mean color + mutable [`mosaic_core::GridIndex`] ->
//! [`find_nearest_unused`] -> [`mosaic_core::MatchedCell`] consumed by
//! compositing.
//!
//! ## Ownership and lifetimes
//! The exclusive `&mut GridIndex` borrow is the critical section: between
//! scan and claim no other observer can run, so a selected cell can never
//! be seen unused by a second match. Callers must not release the borrow
//! between selecting and claiming (this function never does).
//!
//! ## Error model
//! Exhaustion is a legitimate empty result (`None`), not an error.

use mosaic_core::{GridIndex, MatchedCell, Rgb};

/// Finds the unused cell nearest to `target`, claims it, and returns it.
///
/// # Semantics
/// - Cells already claimed are skipped.
/// - Distance is Euclidean in RGB space (compared squared, which preserves
///   ordering exactly).
/// - The running minimum uses strict `<`, so on exact ties the earliest
///   cell in row-major order wins. This is deliberate and tested: repeated
///   calls are deterministic.
/// - Returns `None` when every cell is claimed. That is a legitimate empty
///   result; compositing becomes a no-op.
///
/// The claim happens before this function returns, so the at-most-one
/// assignment per cell invariant holds even when the caller drops the
/// result.
pub fn find_nearest_unused(index: &mut GridIndex, target: Rgb) -> Option<MatchedCell> {
    let mut best: Option<(usize, u32)> = None;

    for (position, cell) in index.cells().iter().enumerate() {
        if cell.used {
            continue;
        }

        let distance = target.distance_squared(cell.mean_color);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((position, distance)),
        }
    }

    let (position, _) = best?;

    // The scan above only visits unused cells and we still hold the
    // exclusive borrow, so the claim cannot fail.
    match index.claim(position) {
        Ok(matched) => Some(matched),
        Err(_) => None,
    }
}
