//! Latest-blocks window for the home view.
//!
//! The best block number is polled; every time it moves, the newest
//! `window` blocks that are not cached yet get fetched, newest first.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::BlockDoc;

#[derive(Debug)]
pub struct LatestBlocks {
    window: u64,
    best: Option<u64>,
    by_number: BTreeMap<u64, BlockDoc>,
    requested: BTreeSet<u64>,
}

impl LatestBlocks {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1) as u64,
            best: None,
            by_number: BTreeMap::new(),
            requested: BTreeSet::new(),
        }
    }

    pub fn best(&self) -> Option<u64> {
        self.best
    }

    // window >= 1, so this never leaves room for more than `window` numbers
    fn lowest(&self, best: u64) -> u64 {
        best.saturating_sub(self.window - 1)
    }

    /// Record the latest best number. Returns the block numbers that must
    /// be fetched now, newest first; each number is handed out once.
    pub fn on_best_block_number(&mut self, n: u64) -> Vec<u64> {
        if self.best.is_some_and(|b| n < b) {
            // indexer lagging behind a previous answer; keep the newer view
            log::debug!("[home] ignoring best block {n} < {:?}", self.best);
            return Vec::new();
        }
        self.best = Some(n);
        let low = self.lowest(n);
        self.by_number = self.by_number.split_off(&low);
        self.requested = self.requested.split_off(&low);

        let wanted: Vec<u64> = (low..=n)
            .rev()
            .filter(|h| !self.by_number.contains_key(h) && !self.requested.contains(h))
            .collect();
        for h in &wanted {
            self.requested.insert(*h);
        }
        wanted
    }

    pub fn on_block(&mut self, block: BlockDoc) {
        let number = block.number;
        self.requested.remove(&number);
        if let Some(best) = self.best {
            if number < self.lowest(best) {
                return;
            }
        }
        self.by_number.insert(number, block);
    }

    /// Fetch of `number` failed; allow it to be requested again.
    pub fn on_block_failed(&mut self, number: u64) {
        self.requested.remove(&number);
    }

    /// Cached blocks, newest first.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockDoc> {
        self.by_number.values().rev()
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}
