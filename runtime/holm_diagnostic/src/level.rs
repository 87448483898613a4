//! Error-level reporting mask.

use bitflags::bitflags;

bitflags! {
    /// Which diagnostic levels are currently reported.
    ///
    /// Mirrors the guest language's `error_reporting` bitmask. The `@`
    /// suppression operator swaps in `ErrorMask::empty()` for the dynamic
    /// extent of one expression and restores the previous mask afterward.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct ErrorMask: u32 {
        /// Recoverable access violations (private/protected misuse).
        const ACCESS  = 1 << 0;
        /// Coercion and arity warnings.
        const WARNING = 1 << 1;
        /// Notices (undefined variable reads, default-object creation).
        const NOTICE  = 1 << 2;
        /// Strict-standards advisories.
        const STRICT  = 1 << 3;
    }
}

impl ErrorMask {
    /// Everything except strict advisories — the conventional default.
    pub fn default_reporting() -> Self {
        ErrorMask::ACCESS | ErrorMask::WARNING | ErrorMask::NOTICE
    }

    /// Whether a diagnostic at `level` should be reported under this mask.
    #[inline]
    pub fn reports(self, level: ErrorMask) -> bool {
        self.intersects(level)
    }
}

impl Default for ErrorMask {
    fn default() -> Self {
        Self::default_reporting()
    }
}
