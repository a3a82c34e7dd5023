//! Progress reporting hooks.
//!
//! Library operations announce each unit of work with [`Progress::start`],
//! report bytes or sectors done with [`Progress::advance`], and close it with
//! [`Progress::finish`]. Front ends map these onto progress bars.

pub trait Progress {
    /// A new unit of work of `total` bytes or sectors begins.
    fn start(&mut self, label: &str, total: u64) {
        let _ = (label, total);
    }

    /// `done` of the current unit's total is complete.
    fn advance(&mut self, done: u64) {
        let _ = done;
    }

    fn finish(&mut self) {}
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
