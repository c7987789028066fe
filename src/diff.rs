use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::profile::{ProfileField, ProfileId, ProfileRecord, PROFILE_UPDATABLE_FIELDS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: ProfileField,
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub profile: ProfileRecord,
    pub changed_fields: Vec<FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    pub inserted: Vec<ProfileRecord>,
    pub deleted: Vec<ProfileRecord>,
    pub updated: Vec<ProfileUpdate>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }

    pub fn has_upserts(&self) -> bool {
        !self.inserted.is_empty() || !self.updated.is_empty()
    }

    /// Inserted records first, then the new state of every updated one.
    pub fn upserts(&self) -> Vec<&ProfileRecord> {
        self.inserted
            .iter()
            .chain(self.updated.iter().map(|u| &u.profile))
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<ProfileId> {
        self.deleted.iter().map(|p| p.profile_id).collect()
    }
}

/// Compare a scraped snapshot with the stored one.
///
/// Both sides are keyed by `profile_id`; when an id repeats, the last
/// record wins and keeps its position. Output order follows the input.
pub fn diff(scraped: &[ProfileRecord], stored: &[ProfileRecord]) -> ProfileChanges {
    let scraped = last_wins(scraped);
    let stored = last_wins(stored);

    let scraped_ids: HashSet<ProfileId> = scraped.iter().map(|p| p.profile_id).collect();
    let stored_map: HashMap<ProfileId, &ProfileRecord> =
        stored.iter().map(|p| (p.profile_id, *p)).collect();

    let deleted = stored
        .iter()
        .filter(|p| !scraped_ids.contains(&p.profile_id))
        .map(|p| (*p).clone())
        .collect();

    let mut inserted = Vec::new();
    let mut updated = Vec::new();

    for profile in scraped {
        let Some(existing) = stored_map.get(&profile.profile_id) else {
            inserted.push(profile.clone());
            continue;
        };

        let changed_fields = changed_fields(profile, existing);
        if !changed_fields.is_empty() {
            updated.push(ProfileUpdate {
                profile: profile.clone(),
                changed_fields,
            });
        }
    }

    ProfileChanges {
        inserted,
        deleted,
        updated,
    }
}

/// Updatable fields that differ. A scraped record without a name says
/// nothing about the name, so it never reports a name change.
pub fn changed_fields(scraped: &ProfileRecord, stored: &ProfileRecord) -> Vec<FieldChange> {
    PROFILE_UPDATABLE_FIELDS
        .iter()
        .filter(|f| !(**f == ProfileField::Name && scraped.name.is_none()))
        .filter(|f| scraped.get(**f) != stored.get(**f))
        .map(|f| FieldChange {
            field: *f,
            old: stored.get(*f).map(str::to_string),
            new: scraped.get(*f).map(str::to_string),
        })
        .collect()
}

/// Drop every record whose id shows up again later in the slice.
fn last_wins(records: &[ProfileRecord]) -> Vec<&ProfileRecord> {
    let last: HashMap<ProfileId, usize> = records
        .iter()
        .enumerate()
        .map(|(i, p)| (p.profile_id, i))
        .collect();
    records
        .iter()
        .enumerate()
        .filter(|(i, p)| last[&p.profile_id] == *i)
        .map(|(_, p)| p)
        .collect()
}
