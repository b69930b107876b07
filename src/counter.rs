//! Per-document sequence counters for numbered entities.
//!
//! One `Counters` value is created per page expansion and threaded through the
//! tag handlers by mutable reference. Nothing here is process-wide, so pages
//! can build in parallel without affecting each other's numbering.

/// Category of a numbered entity.
///
/// Equations are absent on purpose: their numbering happens during the
/// resolution pass, in document scan order (see `resolve::scan`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Figure,
    Footnote,
    Bibliography,
}

/// Named counters scoped to one document's render pass.
///
/// Every counter starts at 1 on its first assignment and increments by one per
/// call. Only the bibliography counter is ever reset, via the `reset` flag on
/// a publication block.
#[derive(Debug, Default)]
pub struct Counters {
    figure: u32,
    footnote: u32,
    bibliography: u32,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next number for `kind`, consuming one slot.
    pub fn next(&mut self, kind: Kind) -> u32 {
        let slot = self.slot(kind);
        *slot += 1;
        *slot
    }

    /// Set the counter for `kind` back so that the next assignment yields 1.
    pub fn reset(&mut self, kind: Kind) {
        *self.slot(kind) = 0;
    }

    /// Number of slots consumed so far for `kind`.
    pub fn current(&self, kind: Kind) -> u32 {
        match kind {
            Kind::Figure => self.figure,
            Kind::Footnote => self.footnote,
            Kind::Bibliography => self.bibliography,
        }
    }

    fn slot(&mut self, kind: Kind) -> &mut u32 {
        match kind {
            Kind::Figure => &mut self.figure,
            Kind::Footnote => &mut self.footnote,
            Kind::Bibliography => &mut self.bibliography,
        }
    }
}
