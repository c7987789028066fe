use thiserror::Error;
use url::Url;

use crate::parser::ScrapedProfile;
use crate::profile::ProfileRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("profile has no usable id")]
    MissingId,
    #[error("new profile {0} has no name")]
    MissingName(u32),
}

/// Check a scraped candidate before it takes part in reconciliation.
///
/// Only a bad id (or a nameless insert) rejects the record. Optional fields
/// that fail their own check are dropped to `None`; on the update path an
/// invalid name is dropped the same way.
pub fn validate(candidate: &ScrapedProfile, is_insert: bool) -> Result<ProfileRecord, Rejection> {
    let profile_id = candidate
        .profile_id
        .filter(|id| *id > 0)
        .ok_or(Rejection::MissingId)?;

    let name = non_empty(candidate.name.as_deref());
    if name.is_none() && is_insert {
        return Err(Rejection::MissingName(profile_id));
    }

    Ok(ProfileRecord {
        profile_id,
        name,
        job_title: non_empty(candidate.job_title.as_deref()),
        profile_url: absolute_url(candidate.profile_url.as_deref()),
        profile_image_url: absolute_url(candidate.profile_image_url.as_deref()),
        section_title: candidate.section_title.clone(),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn absolute_url(value: Option<&str>) -> Option<String> {
    let raw = value?;
    match Url::parse(raw) {
        Ok(u) if u.has_host() => Some(raw.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ScrapedProfile {
        ScrapedProfile {
            profile_id: Some(7),
            name: Some("Jane Doe".into()),
            job_title: Some("Editor".into()),
            profile_url: Some("https://news.sky.com/story/jane-doe-7".into()),
            profile_image_url: Some("https://e3.365dm.com/jane.jpg".into()),
            section_title: None,
        }
    }

    #[test]
    fn accepts_complete_candidate() {
        let p = validate(&candidate(), true).unwrap();
        assert_eq!(p.profile_id, 7);
        assert_eq!(p.name.as_deref(), Some("Jane Doe"));
        assert_eq!(p.job_title.as_deref(), Some("Editor"));
        assert!(p.profile_url.is_some());
        assert!(p.profile_image_url.is_some());
    }

    #[test]
    fn rejects_missing_id() {
        let mut c = candidate();
        c.profile_id = None;
        assert_eq!(validate(&c, false), Err(Rejection::MissingId));
        c.profile_id = Some(0);
        assert_eq!(validate(&c, false), Err(Rejection::MissingId));
    }

    #[test]
    fn name_required_only_on_insert() {
        let mut c = candidate();
        c.name = Some(String::new());
        assert_eq!(validate(&c, true), Err(Rejection::MissingName(7)));

        let p = validate(&c, false).unwrap();
        assert_eq!(p.name, None);
        assert_eq!(p.job_title.as_deref(), Some("Editor"));
    }

    #[test]
    fn invalid_optional_fields_are_dropped() {
        let mut c = candidate();
        c.job_title = Some(String::new());
        c.profile_url = Some("/story/jane-doe-7".into());
        c.profile_image_url = Some("not a url".into());
        let p = validate(&c, true).unwrap();
        assert_eq!(p.job_title, None);
        assert_eq!(p.profile_url, None);
        assert_eq!(p.profile_image_url, None);
        assert_eq!(p.name.as_deref(), Some("Jane Doe"));
    }
}
