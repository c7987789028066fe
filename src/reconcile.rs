use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::diff::{diff, ProfileChanges};
use crate::parser::ScrapedProfile;
use crate::profile::{ProfileId, ProfileRecord, PROFILE_UPDATABLE_FIELDS};
use crate::store::{ProfileStore, StoreResult};
use crate::validate::validate;

/// Result of a pass that started from raw scraped candidates.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub changes: ProfileChanges,
    /// Candidates with no derivable profile id.
    pub unidentified: usize,
    /// Candidates the validator refused.
    pub rejected: usize,
}

/// Converges the store to a scraped snapshot.
pub struct Reconciler<S> {
    store: S,
}

impl<S: ProfileStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Reconciler { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Diff `scraped` against the full stored snapshot and apply the result
    /// in one transaction. Nothing is written when there is nothing to do.
    pub fn reconcile(&mut self, scraped: &[ProfileRecord]) -> StoreResult<ProfileChanges> {
        let stored = self.store.find_all()?;
        self.reconcile_against(scraped.to_vec(), &stored)
    }

    /// Validate raw candidates against the stored snapshot, then reconcile.
    pub fn reconcile_candidates(&mut self, candidates: &[ScrapedProfile]) -> StoreResult<SyncOutcome> {
        let stored = self.store.find_all()?;
        let (scraped, unidentified, rejected) = prepare(candidates, &stored);
        let changes = self.reconcile_against(scraped, &stored)?;
        Ok(SyncOutcome {
            changes,
            unidentified,
            rejected,
        })
    }

    /// Same as [`Reconciler::reconcile_candidates`] without writing anything.
    pub fn plan(&self, candidates: &[ScrapedProfile]) -> StoreResult<SyncOutcome> {
        let stored = self.store.find_all()?;
        let (mut scraped, unidentified, rejected) = prepare(candidates, &stored);
        keep_stored_names(&mut scraped, &stored);
        Ok(SyncOutcome {
            changes: diff(&scraped, &stored),
            unidentified,
            rejected,
        })
    }

    fn reconcile_against(
        &mut self,
        mut scraped: Vec<ProfileRecord>,
        stored: &[ProfileRecord],
    ) -> StoreResult<ProfileChanges> {
        keep_stored_names(&mut scraped, stored);
        let changes = diff(&scraped, stored);
        self.apply(&changes)?;
        Ok(changes)
    }

    fn apply(&mut self, changes: &ProfileChanges) -> StoreResult<()> {
        if changes.is_empty() {
            debug!("No profile changes, skipping write");
            return Ok(());
        }

        self.store.run_in_transaction(|w| {
            if changes.has_upserts() {
                w.bulk_upsert(&changes.upserts(), &PROFILE_UPDATABLE_FIELDS)?;
            }
            if !changes.deleted.is_empty() {
                w.delete_ids(&changes.deleted_ids())?;
            }
            Ok(())
        })?;

        info!(
            "Applied {} inserts, {} updates, {} deletes",
            changes.inserted.len(),
            changes.updated.len(),
            changes.deleted.len()
        );
        Ok(())
    }
}

/// Drop unidentifiable candidates and validate the rest.
///
/// A candidate is an insert when its id is not stored yet.
fn prepare(candidates: &[ScrapedProfile], stored: &[ProfileRecord]) -> (Vec<ProfileRecord>, usize, usize) {
    let stored_ids: HashSet<ProfileId> = stored.iter().map(|p| p.profile_id).collect();

    let mut accepted = Vec::with_capacity(candidates.len());
    let mut unidentified = 0;
    let mut rejected = 0;

    for candidate in candidates {
        let Some(id) = candidate.profile_id else {
            debug!("Dropping profile without id: {:?}", candidate.profile_url);
            unidentified += 1;
            continue;
        };

        match validate(candidate, !stored_ids.contains(&id)) {
            Ok(profile) => accepted.push(profile),
            Err(e) => {
                debug!("Rejected profile: {}", e);
                rejected += 1;
            }
        }
    }

    (accepted, unidentified, rejected)
}

/// A scraped record without a name leaves the stored name as it is.
fn keep_stored_names(scraped: &mut [ProfileRecord], stored: &[ProfileRecord]) {
    let names: HashMap<ProfileId, &str> = stored
        .iter()
        .filter_map(|p| Some((p.profile_id, p.name.as_deref()?)))
        .collect();
    for p in scraped.iter_mut().filter(|p| p.name.is_none()) {
        p.name = names.get(&p.profile_id).map(|n| n.to_string());
    }
}
