//! The four hindsight fixers.
//!
//! Each fixer inspects one identity that was born or died at a frame and
//! either rewrites the tracks and ledger to remove the error, returning
//! `true`, or leaves everything untouched and returns `false`.

mod lost;
mod merged;
mod split;
mod spurious;

use swarmtrack_core::{Ellipse, ForegroundFrame};

use crate::splitter::BlobSplitter;

/// Split the blob under `observed` into two ellipses seeded by `guesses`.
///
/// The fitted ellipses are matched to the guesses by whichever pairing is
/// closer and relabelled with the guesses' identities. The cost is the
/// matched distance minus how far `guesses[1]` already is from
/// `observed`, so a split only scores well if it explains the blob better
/// than the second identity alone. `None` if there is no blob or the split
/// degenerates.
pub(crate) fn split_cost(
    splitter: &dyn BlobSplitter,
    fg: &ForegroundFrame,
    observed: &Ellipse,
    guesses: [Ellipse; 2],
) -> Option<(f64, [Ellipse; 2])> {
    let label = fg.component_for(observed)?;
    let pixels = fg.component_pixels(label);
    let [a, b] = splitter.split(&pixels, &guesses)?;
    if a.is_degenerate() || b.is_degenerate() {
        return None;
    }

    let straight = guesses[0].dist(&a) + guesses[1].dist(&b);
    let crossed = guesses[0].dist(&b) + guesses[1].dist(&a);
    let (assigned, matched) = if crossed < straight {
        ([b, a], crossed)
    } else {
        ([a, b], straight)
    };
    let assigned = [assigned[0].with_id(guesses[0].id), assigned[1].with_id(guesses[1].id)];
    Some((matched - guesses[1].dist(observed), assigned))
}
