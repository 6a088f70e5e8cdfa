//! Stack growth for recursive walks over the IR.
//!
//! Expressions and blocks nest without limit, so the parser and every stage
//! that recurses over them wraps each recursive step in [`with_stack`].

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, switching to a fresh stack segment first if the current one is
/// nearly exhausted.
#[inline]
pub fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[cfg(test)]
mod tests {
    use super::with_stack;

    #[test]
    fn test_nested_depth() {
        fn depth(n: u32) -> u32 {
            with_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }

        assert_eq!(depth(200_000), 200_000);
    }
}
