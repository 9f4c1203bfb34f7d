//! One independent loader per chart a profile references.

use super::loader::{ArtifactHandle, ArtifactLoader};
use super::probe::ArtifactProbe;
use super::state::ArtifactLoadState;
use crate::profile::{ChartKind, ProfileRecord, cache_bust_stamp};

/// A spawned load for one chart.
pub struct ChartSlot {
    pub kind: ChartKind,
    pub handle: ArtifactHandle,
}

/// Loads for every chart of one profile. Dropping the set cancels them all.
#[derive(Default)]
pub struct ChartSet {
    slots: Vec<ChartSlot>,
}

impl ChartSet {
    /// Spawn a loader for each chart in `record`, cache-busted with the
    /// current time.
    pub fn spawn<P: ArtifactProbe>(
        record: &ProfileRecord,
        api_base: &str,
        loader: &ArtifactLoader<P>,
    ) -> Self {
        Self::spawn_with_stamp(record, api_base, loader, cache_bust_stamp())
    }

    pub fn spawn_with_stamp<P: ArtifactProbe>(
        record: &ProfileRecord,
        api_base: &str,
        loader: &ArtifactLoader<P>,
        stamp: i64,
    ) -> Self {
        let slots: Vec<ChartSlot> = record
            .charts
            .resolve(api_base, stamp)
            .into_iter()
            .map(|(kind, url)| {
                crate::debug_info!("ARTIFACT", "loading {} chart from {}", kind.key(), url);
                ChartSlot {
                    kind,
                    handle: loader.spawn(url),
                }
            })
            .collect();
        if slots.is_empty() {
            log::info!("Profile '{}' references no charts", record.username);
        }
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn kinds(&self) -> Vec<ChartKind> {
        self.slots.iter().map(|slot| slot.kind).collect()
    }

    pub fn get(&self, kind: ChartKind) -> Option<&ArtifactHandle> {
        self.slots
            .iter()
            .find(|slot| slot.kind == kind)
            .map(|slot| &slot.handle)
    }

    /// Latest state of every chart, in display order.
    pub fn states(&self) -> Vec<(ChartKind, ArtifactLoadState)> {
        self.slots
            .iter()
            .map(|slot| (slot.kind, slot.handle.state()))
            .collect()
    }

    /// Wait for every load to finish.
    ///
    /// Loads run concurrently on their own tasks, so awaiting them in order
    /// does not serialize them.
    pub async fn wait_all(&mut self) -> Vec<(ChartKind, ArtifactLoadState)> {
        let mut states = Vec::with_capacity(self.slots.len());
        for slot in &mut self.slots {
            states.push((slot.kind, slot.handle.wait().await));
        }
        states
    }

    pub fn cancel_all(&self) {
        for slot in &self.slots {
            slot.handle.cancel();
        }
    }
}
