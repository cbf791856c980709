use std::{collections::HashSet, sync::Arc};

use crate::{
    foundation::clock::{Clock, DayKey},
    foundation::error::{SnapError, SnapResult},
    model::snap::{CalendarMap, LegacyMeta, LegacyRecord, Snap, TodayMirror},
    store::kv::KvStore,
    store::quota::{QuotaWriter, ScopedValue},
};

/// Current on-disk layout: calendar + today mirror + metadata-only legacy list.
pub const SCHEMA_VERSION: u32 = 2;

/// The persisted key names of one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryKeys {
    /// Flat list kept for older readers.
    pub legacy: String,
    /// Day map of full records.
    pub calendar: String,
    /// Mirror of the current day.
    pub today: String,
    /// Schema version marker.
    pub schema: String,
}

impl CategoryKeys {
    /// Keys for `category`.
    pub fn new(category: &str) -> Self {
        Self {
            legacy: format!("snaps:{category}"),
            calendar: format!("snaps:{category}:calendar"),
            today: format!("snaps:{category}:today"),
            schema: format!("snaps:{category}:schema"),
        }
    }
}

/// What [`SnapStore::migrate_if_needed`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found before migrating.
    pub from_version: u32,
    /// Legacy records appended to today's list.
    pub imported: usize,
    /// Legacy records skipped as already present.
    pub skipped: usize,
}

/// Schema manager over a [`KvStore`]: migration, the today mirror and canonical commits.
pub struct SnapStore<S> {
    store: S,
    clock: Arc<dyn Clock>,
    writer: QuotaWriter,
}

impl<S: KvStore> SnapStore<S> {
    /// Wrap `store` with the default relief ladder.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self::with_writer(store, clock, QuotaWriter::default())
    }

    /// Wrap `store` with a custom relief ladder.
    pub fn with_writer(store: S, clock: Arc<dyn Clock>, writer: QuotaWriter) -> Self {
        Self {
            store,
            clock,
            writer,
        }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Backing store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Current local day.
    pub fn today(&self) -> DayKey {
        self.clock.today()
    }

    /// Current time in epoch milliseconds.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Stored schema version; `0` when the marker is absent or unreadable.
    pub fn schema_version(&self, category: &str) -> SnapResult<u32> {
        let keys = CategoryKeys::new(category);
        Ok(self
            .store
            .get(&keys.schema)?
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Read the full calendar; missing means empty.
    pub fn load_calendar(&self, category: &str) -> SnapResult<CalendarMap> {
        let keys = CategoryKeys::new(category);
        match self.store.get(&keys.calendar)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(CalendarMap::new()),
        }
    }

    /// Read the legacy flat list. Unreadable content is logged and treated as empty.
    pub fn load_legacy(&self, category: &str) -> SnapResult<Vec<LegacyRecord>> {
        let keys = CategoryKeys::new(category);
        let Some(json) = self.store.get(&keys.legacy)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&json) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(category, "ignoring unreadable legacy list: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Fold the legacy flat list into today's calendar entry, once.
    ///
    /// The rewritten legacy list projects every calendar day, oldest first.
    ///
    /// Records whose timestamp already exists anywhere in the calendar are skipped, and so are
    /// metadata-only projections, which makes re-running after a lost marker harmless.
    #[tracing::instrument(skip(self))]
    pub fn migrate_if_needed(&mut self, category: &str) -> SnapResult<MigrationReport> {
        let keys = CategoryKeys::new(category);
        let from_version = self.schema_version(category)?;
        let mut report = MigrationReport {
            from_version,
            ..MigrationReport::default()
        };
        if from_version >= SCHEMA_VERSION {
            return Ok(report);
        }

        let legacy = self.load_legacy(category)?;
        if !legacy.is_empty() {
            let today = self.today();
            let mut calendar = self.load_calendar(category)?;
            let mut seen: HashSet<i64> = calendar
                .values()
                .flatten()
                .map(|s| s.timestamp)
                .collect();
            let day = calendar.entry(today.clone()).or_default();
            for record in legacy {
                if record.data.is_none() && record.base.is_none() {
                    report.skipped += 1;
                    continue;
                }
                if !seen.insert(record.ts) {
                    report.skipped += 1;
                    continue;
                }
                day.push(record.into_snap());
                report.imported += 1;
            }
            if day.is_empty() {
                calendar.remove(&today);
            }

            let persisted = self.write_calendar(&keys, calendar, &today)?;
            self.write_mirror(&keys, TodayMirror::derive(&persisted, &today));
            let merged: Vec<Snap> = persisted.values().flatten().cloned().collect();
            self.write_legacy(&keys, &merged);
            tracing::info!(
                imported = report.imported,
                skipped = report.skipped,
                "migrated legacy list"
            );
        }

        if let Err(e) = self.store.set(&keys.schema, &SCHEMA_VERSION.to_string()) {
            tracing::warn!(category, "could not record schema version: {e}");
        }
        Ok(report)
    }

    /// Today's items, rederiving the mirror from the calendar when its date is stale.
    #[tracing::instrument(skip(self))]
    pub fn ensure_today_mirror(&mut self, category: &str) -> SnapResult<Vec<Snap>> {
        let keys = CategoryKeys::new(category);
        let today = self.today();
        if let Some(json) = self.store.get(&keys.today)? {
            match serde_json::from_str::<TodayMirror>(&json) {
                Ok(mirror) if mirror.date == today => return Ok(mirror.items),
                Ok(mirror) => {
                    tracing::debug!(stale = %mirror.date, today = %today, "day rolled over");
                }
                Err(e) => tracing::warn!("rebuilding unreadable today mirror: {e}"),
            }
        }
        let calendar = self.load_calendar(category)?;
        let mirror = TodayMirror::derive(&calendar, &today);
        let items = mirror.items.clone();
        self.write_mirror(&keys, mirror);
        Ok(items)
    }

    /// Today's entry of the calendar, bypassing the mirror.
    pub fn today_items(&self, category: &str) -> SnapResult<Vec<Snap>> {
        let today = self.today();
        Ok(self
            .load_calendar(category)?
            .remove(&today)
            .unwrap_or_default())
    }

    /// Replace today's list. The calendar is written first and is canonical; the mirror is then
    /// derived from what the calendar write persisted; the legacy export is best-effort.
    /// Records whose payloads were stripped only in the mirror get them back from the calendar.
    ///
    /// Returns the items as persisted, which relief may have degraded.
    #[tracing::instrument(skip(self, items), fields(items = items.len()))]
    pub fn commit_today(&mut self, category: &str, items: Vec<Snap>) -> SnapResult<Vec<Snap>> {
        let keys = CategoryKeys::new(category);
        let today = self.today();
        let mut calendar = self.load_calendar(category)?;
        let mut items = items;
        if let Some(current) = calendar.get(&today) {
            restore_payloads(&mut items, current);
        }
        if items.is_empty() {
            calendar.remove(&today);
        } else {
            calendar.insert(today.clone(), items);
        }

        let persisted = self.write_calendar(&keys, calendar, &today)?;
        let mirror = TodayMirror::derive(&persisted, &today);
        let items = mirror.items.clone();
        self.write_mirror(&keys, mirror);
        self.write_legacy(&keys, &items);
        Ok(items)
    }

    fn write_calendar(
        &mut self,
        keys: &CategoryKeys,
        map: CalendarMap,
        today: &DayKey,
    ) -> SnapResult<CalendarMap> {
        let outcome = self.writer.write(
            &mut self.store,
            &keys.calendar,
            ScopedValue::Calendar {
                map,
                today: today.clone(),
            },
        )?;
        if outcome.stage.is_degraded() {
            tracing::warn!(stage = ?outcome.stage, "calendar persisted with relief");
        }
        match outcome.value {
            ScopedValue::Calendar { map, .. } => Ok(map),
            ScopedValue::Today(mirror) => Ok(CalendarMap::from([(mirror.date, mirror.items)])),
        }
    }

    /// A mirror that cannot be written is removed so the next read rederives it.
    fn write_mirror(&mut self, keys: &CategoryKeys, mirror: TodayMirror) {
        if let Err(e) = self
            .writer
            .write(&mut self.store, &keys.today, ScopedValue::Today(mirror))
        {
            tracing::warn!("today mirror not written: {e}");
            if let Err(e) = self.store.remove(&keys.today) {
                tracing::warn!("stale today mirror not removed: {e}");
            }
        }
    }

    fn write_legacy(&mut self, keys: &CategoryKeys, items: &[Snap]) {
        let metas: Vec<LegacyMeta> = items.iter().map(Snap::legacy_meta).collect();
        let result = serde_json::to_string(&metas)
            .map_err(SnapError::from)
            .and_then(|json| self.store.set(&keys.legacy, &json));
        if let Err(e) = result {
            tracing::warn!("legacy list not written: {e}");
        }
    }
}

/// Items read back from a relief-degraded mirror have empty payloads. Refill them from the
/// calendar record with the same timestamp.
fn restore_payloads(items: &mut [Snap], canonical: &[Snap]) {
    for snap in items {
        let Some(src) = canonical.iter().find(|c| c.timestamp == snap.timestamp) else {
            continue;
        };
        if snap.raster_payload.is_empty() && !src.raster_payload.is_empty() {
            snap.raster_payload = src.raster_payload.clone();
        }
        if snap.base_payload.is_empty() && !src.base_payload.is_empty() {
            snap.base_payload = src.base_payload.clone();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/schema.rs"]
mod tests;
