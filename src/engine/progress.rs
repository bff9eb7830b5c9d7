//! CLI progress bar driven by registry snapshots.

use kdam::{Animation, Bar, BarExt, tqdm};

use crate::types::{Phase, ProgressSnapshot};

/// One kdam bar per pipeline phase, advanced to the snapshot's absolute
/// position. A phase change finishes the old bar and starts a fresh one.
pub struct SnapshotBar {
    bar: Bar,
    phase: Phase,
}

impl SnapshotBar {
    pub fn new() -> Self {
        SnapshotBar {
            bar: new_phase_bar(Phase::Init, 0),
            phase: Phase::Init,
        }
    }

    /// Reflect `snap` on the terminal.
    pub fn render(&mut self, snap: &ProgressSnapshot) {
        if snap.phase != self.phase {
            let _ = self.bar.clear();
            self.phase = snap.phase;
            self.bar = new_phase_bar(snap.phase, snap.total_items as usize);
            let _ = self.bar.refresh();
        }
        if self.bar.total != snap.total_items as usize {
            self.bar.total = snap.total_items as usize;
        }
        let _ = self.bar.update_to(snap.processed_items as usize);
    }
}

impl Default for SnapshotBar {
    fn default() -> Self {
        Self::new()
    }
}

fn new_phase_bar(phase: Phase, total: usize) -> Bar {
    tqdm!(
        total = total,
        desc = phase.as_str(),
        animation = Animation::Classic
    )
}
