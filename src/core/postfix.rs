//! Post-fix runner
//!
//! Post-fixers repair invariants after the mutations of a batch have been
//! applied and before the batch is committed. They run from an explicit work
//! queue in registration order; when one of them changes the model the queue
//! is refilled from the first fixer. Each refill counts as a pass and the
//! number of passes is capped. Running out of passes is a consistency fault.

use std::collections::VecDeque;

use super::downcast::editing::EditingView;
use super::model::Writer;
use crate::utils::error::{EditorError, EditorResult};

/// An invariant-repair pass
pub trait PostFixer {
    /// Name used in logs and consistency faults
    fn name(&self) -> &'static str;

    /// Inspect the batch recorded by `writer` and repair what it broke.
    ///
    /// Returns `true` when the model was changed. A fixer that only sends
    /// hints to the view (refresh requests) returns `false`.
    fn fix(&self, writer: &mut Writer<'_>, view: &EditingView) -> EditorResult<bool>;
}

/// Run the fixers to a fixed point
///
/// Returns the number of passes it took.
pub(crate) fn run_post_fixers(
    fixers: &[Box<dyn PostFixer>],
    writer: &mut Writer<'_>,
    view: &EditingView,
    cap: usize,
) -> EditorResult<usize> {
    let mut queue: VecDeque<usize> = (0..fixers.len()).collect();
    let mut passes = 1;

    while let Some(index) = queue.pop_front() {
        let fixer = &fixers[index];
        if !fixer.fix(writer, view)? {
            continue;
        }

        tracing::trace!(fixer = fixer.name(), pass = passes, "post-fixer changed the model");
        passes += 1;
        if passes > cap {
            return Err(EditorError::ConsistencyFault {
                passes: cap,
                last_fixer: fixer.name(),
            });
        }
        queue.clear();
        queue.extend(0..fixers.len());
    }

    Ok(passes)
}
