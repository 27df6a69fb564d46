/// Result of a cache operation. It cannot carry an error: a failed store call
/// still produces a usable value, the operation's safe default.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome<T> {
    /// The store answered.
    Hit(T),
    /// The store call failed and was logged; this is the safe default.
    Fallback(T),
}

impl<T> CacheOutcome<T> {
    pub fn value(self) -> T {
        match self {
            CacheOutcome::Hit(value) | CacheOutcome::Fallback(value) => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CacheOutcome::Fallback(_))
    }
}
