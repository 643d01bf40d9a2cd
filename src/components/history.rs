use std::collections::VecDeque;

use crate::canvas::PixelBuffer;
use crate::components::tools::CompositeMode;

/// Default number of undo steps kept per session.
pub const MAX_HISTORY_DEPTH: usize = 20;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// An immutable full copy of the working buffer at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pixels: PixelBuffer,
}

impl Snapshot {
    /// Deep-copy `buffer`.
    pub fn capture(buffer: &PixelBuffer) -> Self {
        Self {
            pixels: buffer.clone(),
        }
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Overwrite `buffer` with the captured pixels.
    pub fn restore_into(&self, buffer: &mut PixelBuffer) {
        buffer.copy_from(&self.pixels);
    }

    pub fn memory_size(&self) -> usize {
        self.pixels.memory_bytes()
    }
}

// ============================================================================
// HISTORY STACK
// ============================================================================

/// Bounded linear undo history.
///
/// Callers push exactly once per gesture (stroke start, fill, line commit),
/// before the gesture mutates the buffer.  When the depth limit is exceeded
/// the oldest snapshot is evicted.
pub struct HistoryStack {
    entries: VecDeque<Snapshot>,
    max_depth: usize,
    /// Running byte total of all stored snapshots.
    total_memory: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(MAX_HISTORY_DEPTH)
    }
}

impl HistoryStack {
    /// A depth of 0 is treated as 1.
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_depth.max(1) + 1),
            max_depth: max_depth.max(1),
            total_memory: 0,
        }
    }

    /// Capture a snapshot of `buffer` and append it.
    pub fn push(&mut self, buffer: &PixelBuffer) {
        let snapshot = Snapshot::capture(buffer);
        self.total_memory += snapshot.memory_size();
        self.entries.push_back(snapshot);
        self.prune();
    }

    /// Remove and return the most recent snapshot.
    pub fn pop(&mut self) -> Option<Snapshot> {
        let snapshot = self.entries.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(snapshot.memory_size());
        Some(snapshot)
    }

    /// Restore the most recent snapshot into `buffer` and reset the composite
    /// mode to paint.  Returns `false` (and touches nothing) when there is
    /// nothing to undo.
    pub fn undo(&mut self, buffer: &mut PixelBuffer, composite: &mut CompositeMode) -> bool {
        match self.pop() {
            Some(snapshot) => {
                snapshot.restore_into(buffer);
                *composite = CompositeMode::Paint;
                crate::log_info!("Undo ({} step(s) left)", self.entries.len());
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Change the depth limit, evicting the oldest snapshots if needed.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        self.prune();
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    /// Current memory held by the history (O(1) via cached total).
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_memory = 0;
    }

    fn prune(&mut self) {
        while self.entries.len() > self.max_depth {
            if let Some(removed) = self.entries.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.memory_size());
                crate::log_info!("History full, evicted oldest snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 1×1 buffer whose red channel records `tag`.
    fn tagged(tag: u8) -> PixelBuffer {
        let mut buf = PixelBuffer::new(1, 1).unwrap();
        buf.put_pixel(0, 0, Rgba([tag, 0, 0, 255]));
        buf
    }

    #[test]
    fn keeps_only_the_most_recent_snapshots() {
        let mut history = HistoryStack::default();
        for tag in 0..25u8 {
            history.push(&tagged(tag));
        }
        assert_eq!(history.len(), MAX_HISTORY_DEPTH);
        let tags: Vec<u8> = history.iter().map(|s| s.buffer().get_pixel(0, 0)[0]).collect();
        assert_eq!(tags, (5..25).collect::<Vec<u8>>());
        assert_eq!(history.memory_usage(), MAX_HISTORY_DEPTH * 4);
    }

    #[test]
    fn k_undos_restore_the_state_before_the_first_push() {
        let mut history = HistoryStack::default();
        let mut composite = CompositeMode::Paint;
        let mut buf = tagged(1);
        let original = buf.clone();
        for tag in 2..6u8 {
            history.push(&buf);
            buf.put_pixel(0, 0, Rgba([tag, 0, 0, 255]));
        }
        for _ in 0..4 {
            assert!(history.undo(&mut buf, &mut composite));
        }
        assert_eq!(buf, original);
        assert!(history.is_empty());
        assert_eq!(history.memory_usage(), 0);
    }

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let mut history = HistoryStack::new(3);
        let mut composite = CompositeMode::Erase;
        let mut buf = tagged(9);
        assert!(!history.undo(&mut buf, &mut composite));
        assert_eq!(buf, tagged(9));
        assert_eq!(composite, CompositeMode::Erase);
        assert!(history.pop().is_none());
    }

    #[test]
    fn undo_resets_composite_mode() {
        let mut history = HistoryStack::default();
        let mut composite = CompositeMode::Erase;
        let mut buf = tagged(1);
        history.push(&buf);
        buf.clear();
        assert!(history.undo(&mut buf, &mut composite));
        assert_eq!(composite, CompositeMode::Paint);
        assert_eq!(buf, tagged(1));
    }

    #[test]
    fn snapshots_are_independent_of_later_edits() {
        let mut history = HistoryStack::default();
        let mut buf = tagged(7);
        history.push(&buf);
        buf.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let snap = history.pop().unwrap();
        assert_eq!(snap.buffer().get_pixel(0, 0), Rgba([7, 0, 0, 255]));
    }

    #[test]
    fn shrinking_depth_evicts_oldest() {
        let mut history = HistoryStack::new(10);
        for tag in 0..6u8 {
            history.push(&tagged(tag));
        }
        history.set_max_depth(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.pop().unwrap().buffer().get_pixel(0, 0)[0], 5);
        assert_eq!(history.pop().unwrap().buffer().get_pixel(0, 0)[0], 4);
    }
}
