// SPDX-License-Identifier: MPL-2.0
//! FIFO of pending `(tile, augmentation)` work items.
//!
//! Items are pushed as their inputs are placed into the batch and drained
//! in the same order once the executor returns, so result slot `n` of a
//! batch always belongs to the `n`-th drained item.

use std::collections::VecDeque;

use crate::domain::augmentation::AugmentationKind;

/// One executor input: a tile seen through one augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub tile_index: usize,
    pub augmentation: AugmentationKind,
}

impl WorkItem {
    #[must_use]
    pub const fn new(tile_index: usize, augmentation: AugmentationKind) -> Self {
        Self {
            tile_index,
            augmentation,
        }
    }

    /// Returns `true` for the zero-filled items that pad the last batch.
    #[must_use]
    pub const fn is_padding(&self, tile_count: usize) -> bool {
        self.tile_index >= tile_count
    }
}

/// Work schedule for one render.
///
/// Step `s` maps to tile `s / steps_per_tile`, augmentation
/// `s % steps_per_tile`, where `steps_per_tile` is 8 with augmentation and
/// 1 without. The total is rounded up to a whole number of batches; the
/// extra steps are padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    tile_count: usize,
    steps_per_tile: usize,
    batch_size: usize,
}

impl Schedule {
    /// # Panics
    ///
    /// Panics if `batch_size` is zero.
    #[must_use]
    pub const fn new(tile_count: usize, augmentation: bool, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch size must be positive");
        Self {
            tile_count,
            steps_per_tile: AugmentationKind::steps(augmentation),
            batch_size,
        }
    }

    #[must_use]
    pub const fn steps_per_tile(&self) -> usize {
        self.steps_per_tile
    }

    /// `batch_size * ceil(tile_count * steps_per_tile / batch_size)`.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        (self.tile_count * self.steps_per_tile).div_ceil(self.batch_size) * self.batch_size
    }

    #[must_use]
    pub const fn batch_count(&self) -> usize {
        self.step_count() / self.batch_size
    }

    /// Work item for step `step`.
    #[must_use]
    pub fn item(&self, step: usize) -> WorkItem {
        let augmentation = AugmentationKind::from_index(step % self.steps_per_tile)
            .unwrap_or_default();
        WorkItem::new(step / self.steps_per_tile, augmentation)
    }

    /// Batch slot step `step` is placed in.
    #[must_use]
    pub const fn slot(&self, step: usize) -> usize {
        step % self.batch_size
    }
}

/// FIFO of items whose inputs are in the current batch.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes up to `count` items from the front, oldest first.
    pub fn drain_batch(&mut self, count: usize) -> impl Iterator<Item = WorkItem> + '_ {
        let count = count.min(self.items.len());
        self.items.drain(..count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_rounds_up_to_whole_batches() {
        assert_eq!(Schedule::new(9, false, 4).step_count(), 12);
        assert_eq!(Schedule::new(4, false, 4).step_count(), 4);
        assert_eq!(Schedule::new(3, true, 5).step_count(), 25);
        assert_eq!(Schedule::new(3, true, 5).batch_count(), 5);
    }

    #[test]
    fn steps_map_to_tiles_then_augmentations() {
        let schedule = Schedule::new(2, true, 4);
        assert_eq!(schedule.item(0), WorkItem::new(0, AugmentationKind::Identity));
        assert_eq!(schedule.item(7).tile_index, 0);
        assert_eq!(schedule.item(7).augmentation.index(), 7);
        assert_eq!(schedule.item(9), WorkItem::new(1, AugmentationKind::FlipHorizontal));
        assert_eq!(schedule.slot(9), 1);
    }

    #[test]
    fn padding_items_lie_past_the_last_tile() {
        let schedule = Schedule::new(9, false, 4);
        let padding: Vec<usize> = (0..schedule.step_count())
            .map(|step| schedule.item(step))
            .filter(|item| item.is_padding(9))
            .map(|item| item.tile_index)
            .collect();
        assert_eq!(padding, vec![9, 10, 11]);
    }

    #[test]
    fn augmented_schedule_covers_every_kind_once_per_tile() {
        let schedule = Schedule::new(3, true, 5);
        assert_eq!(schedule.steps_per_tile(), AugmentationKind::COUNT);
        for tile in 0..3 {
            let kinds: Vec<AugmentationKind> = (0..schedule.step_count())
                .map(|step| schedule.item(step))
                .filter(|item| item.tile_index == tile)
                .map(|item| item.augmentation)
                .collect();
            assert_eq!(kinds, AugmentationKind::ALL.to_vec());
        }
    }

    #[test]
    #[should_panic(expected = "batch size must be positive")]
    fn zero_batch_size_is_rejected() {
        let _ = Schedule::new(4, false, 0);
    }

    #[test]
    fn drain_is_fifo() {
        let mut queue = WorkQueue::with_capacity(4);
        for tile in 0..5 {
            queue.push(WorkItem::new(tile, AugmentationKind::Identity));
        }

        let first: Vec<usize> = queue.drain_batch(3).map(|item| item.tile_index).collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(queue.len(), 2);

        let rest: Vec<usize> = queue.drain_batch(10).map(|item| item.tile_index).collect();
        assert_eq!(rest, vec![3, 4]);
        assert!(queue.is_empty());
    }
}
