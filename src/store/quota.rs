use crate::{
    assets::ingest::reencode,
    foundation::clock::DayKey,
    foundation::error::{SnapError, SnapResult},
    model::snap::{CalendarMap, Snap, TodayMirror},
    store::kv::KvStore,
};

/// A value headed for the store, tagged with how relief may degrade it.
#[derive(Clone, Debug, PartialEq)]
pub enum ScopedValue {
    /// Whole calendar. Relief may prune old days; payload relief only touches `map[today]`.
    Calendar {
        /// Day map to persist.
        map: CalendarMap,
        /// Day whose items are in scope for payload relief.
        today: DayKey,
    },
    /// Today mirror. Payload relief touches its items; nothing is pruned.
    Today(TodayMirror),
}

impl ScopedValue {
    fn to_json(&self) -> SnapResult<String> {
        Ok(match self {
            Self::Calendar { map, .. } => serde_json::to_string(map)?,
            Self::Today(mirror) => serde_json::to_string(mirror)?,
        })
    }

    fn in_scope_items_mut(&mut self) -> Option<&mut Vec<Snap>> {
        match self {
            Self::Calendar { map, today } => map.get_mut(today),
            Self::Today(mirror) => Some(&mut mirror.items),
        }
    }

    /// Items payload relief operates on.
    pub fn in_scope_items(&self) -> &[Snap] {
        match self {
            Self::Calendar { map, today } => map.get(today).map_or(&[], Vec::as_slice),
            Self::Today(mirror) => &mirror.items,
        }
    }

    fn scope_name(&self) -> &'static str {
        match self {
            Self::Calendar { .. } => "calendar",
            Self::Today(_) => "today",
        }
    }
}

/// Ladder stage that produced a successful write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReliefStage {
    /// First attempt, value unchanged.
    Direct,
    /// Calendar pruned to the given number of most recent days.
    PrunedDays(usize),
    /// In-scope payloads re-encoded at this bound.
    Reencoded {
        /// Longer-side bound in pixels.
        max_side: u32,
        /// JPEG quality.
        quality: f32,
    },
    /// In-scope payloads dropped; metadata kept.
    PayloadsCleared,
}

impl ReliefStage {
    /// `true` when the persisted value differs from what the caller asked to write.
    pub fn is_degraded(self) -> bool {
        !matches!(self, Self::Direct)
    }
}

/// Result of a [`QuotaWriter::write`].
#[derive(Clone, Debug, PartialEq)]
pub struct WriteOutcome {
    /// Stage that succeeded.
    pub stage: ReliefStage,
    /// Value exactly as persisted.
    pub value: ScopedValue,
}

/// Relief knobs. `Default` gives the production ladder.
#[derive(Clone, Debug, PartialEq)]
pub struct QuotaWriter {
    /// Day counts tried when pruning a calendar, largest first.
    pub prune_days: Vec<usize>,
    /// `(max_side, quality)` re-encode passes, in order.
    pub reencode_passes: Vec<(u32, f32)>,
}

impl Default for QuotaWriter {
    fn default() -> Self {
        Self {
            prune_days: vec![90, 60, 30, 14],
            reencode_passes: vec![(960, 0.82), (800, 0.78)],
        }
    }
}

impl QuotaWriter {
    /// Persist `value` under `key`, degrading it stage by stage while the store reports
    /// [`SnapError::CapacityExceeded`].
    ///
    /// The ladder works on its own copy: on success the returned [`WriteOutcome::value`] is what
    /// the store now holds; on failure the caller's data is untouched. Non-capacity errors return
    /// immediately. Exhausting the ladder returns a capacity error.
    #[tracing::instrument(skip(self, store, value), fields(scope = value.scope_name()))]
    pub fn write<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        key: &str,
        value: ScopedValue,
    ) -> SnapResult<WriteOutcome> {
        let mut working = value;

        if try_write(store, key, &working)? {
            return Ok(WriteOutcome {
                stage: ReliefStage::Direct,
                value: working,
            });
        }

        for &keep in &self.prune_days {
            let dropped = match &mut working {
                ScopedValue::Calendar { map, .. } => prune_to_recent(map, keep),
                ScopedValue::Today(_) => break,
            };
            if dropped == 0 {
                continue;
            }
            tracing::warn!(key, keep, dropped, "quota relief: pruned old days");
            if try_write(store, key, &working)? {
                return Ok(WriteOutcome {
                    stage: ReliefStage::PrunedDays(keep),
                    value: working,
                });
            }
        }

        for &(max_side, quality) in &self.reencode_passes {
            let shrunk = working
                .in_scope_items_mut()
                .map_or(0, |items| shrink_payloads(items, max_side, quality));
            tracing::warn!(key, max_side, quality, shrunk, "quota relief: re-encoded payloads");
            if shrunk == 0 {
                continue;
            }
            if try_write(store, key, &working)? {
                return Ok(WriteOutcome {
                    stage: ReliefStage::Reencoded { max_side, quality },
                    value: working,
                });
            }
        }

        if let Some(items) = working.in_scope_items_mut() {
            items.iter_mut().for_each(Snap::evict_payloads);
        }
        tracing::warn!(key, "quota relief: cleared in-scope payloads");
        if try_write(store, key, &working)? {
            return Ok(WriteOutcome {
                stage: ReliefStage::PayloadsCleared,
                value: working,
            });
        }

        tracing::error!(key, "quota relief exhausted");
        Err(SnapError::capacity(format!(
            "'{key}' does not fit even with payloads cleared"
        )))
    }
}

/// `Ok(true)` on success, `Ok(false)` on a capacity rejection, `Err` otherwise.
fn try_write<S: KvStore + ?Sized>(
    store: &mut S,
    key: &str,
    value: &ScopedValue,
) -> SnapResult<bool> {
    let json = value.to_json()?;
    match store.set(key, &json) {
        Ok(()) => Ok(true),
        Err(e) if e.is_capacity() => {
            tracing::debug!(key, len = json.len(), "write rejected: {e}");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Keep the `keep` most recent days. Returns how many days were dropped.
fn prune_to_recent(map: &mut CalendarMap, keep: usize) -> usize {
    if map.len() <= keep {
        return 0;
    }
    let stale: Vec<DayKey> = map.keys().take(map.len() - keep).cloned().collect();
    for day in &stale {
        map.remove(day);
    }
    stale.len()
}

/// Re-encode both payloads of each item, keeping a new encoding only when strictly smaller.
/// Returns how many payloads were replaced.
fn shrink_payloads(items: &mut [Snap], max_side: u32, quality: f32) -> usize {
    let mut replaced = 0;
    for snap in items {
        for payload in [&mut snap.raster_payload, &mut snap.base_payload] {
            if let Some(smaller) = reencode(payload, max_side, quality)
                && smaller.byte_len() < payload.byte_len()
            {
                *payload = smaller;
                replaced += 1;
            }
        }
    }
    replaced
}

#[cfg(test)]
#[path = "../../tests/unit/store/quota.rs"]
mod tests;
