//! Native stack headroom for deep expression trees.
//!
//! The evaluator recurses over the arena; guest code controls the nesting
//! depth, so recursion points check remaining native stack and grow onto a
//! new segment instead of overflowing.

/// Red zone before growing, in bytes.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_SEGMENT: usize = 1024 * 1024;

/// Run `f`, growing the native stack first if the red zone is reached.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_SEGMENT, f)
}
