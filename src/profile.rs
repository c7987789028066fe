use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static PROFILE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9][0-9]*$").unwrap());

pub type ProfileId = u32;

/// A profile as compared and persisted. `name` is only ever `None` on the
/// update path, where the validator declined to promote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub profile_id: ProfileId,
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub profile_url: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
}

impl ProfileRecord {
    pub fn new(profile_id: ProfileId, name: &str) -> Self {
        ProfileRecord {
            profile_id,
            name: Some(name.to_string()),
            job_title: None,
            profile_url: None,
            profile_image_url: None,
            section_title: None,
        }
    }

    pub fn get(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::Name => self.name.as_deref(),
            ProfileField::JobTitle => self.job_title.as_deref(),
            ProfileField::ProfileUrl => self.profile_url.as_deref(),
            ProfileField::ProfileImageUrl => self.profile_image_url.as_deref(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("?")
    }
}

/// Fields compared during change detection and overwritten on upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    Name,
    JobTitle,
    ProfileUrl,
    ProfileImageUrl,
}

/// Order matters: it is the order of `changed_fields` in every update.
pub const PROFILE_UPDATABLE_FIELDS: [ProfileField; 4] = [
    ProfileField::Name,
    ProfileField::JobTitle,
    ProfileField::ProfileUrl,
    ProfileField::ProfileImageUrl,
];

impl ProfileField {
    pub fn column(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::JobTitle => "job_title",
            ProfileField::ProfileUrl => "profile_url",
            ProfileField::ProfileImageUrl => "profile_image_url",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProfileField::Name => "name",
            ProfileField::JobTitle => "jobTitle",
            ProfileField::ProfileUrl => "profileUrl",
            ProfileField::ProfileImageUrl => "profileImageUrl",
        };
        f.write_str(label)
    }
}

/// Profile id from a hyphen-delimited profile URL, e.g. `.../jane-doe-123`.
///
/// Only the segment after the last `-` is considered, and it must be a
/// positive integer without leading zeros. Anything else is `None`.
pub fn profile_id_from_url(url: &str) -> Option<ProfileId> {
    let last = url.rsplit('-').next()?;
    if !PROFILE_ID_RE.is_match(last) {
        return None;
    }
    last.parse().ok().filter(|id| *id > 0)
}

/// Trim, lowercase, then capitalise each whitespace-separated word.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(capitalise)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalise(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_json_is_camel_case() {
        let mut p = ProfileRecord::new(4, "Dee");
        p.profile_image_url = Some("https://img/4.jpg".into());
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["profileId"], 4);
        assert_eq!(v["profileImageUrl"], "https://img/4.jpg");
        assert!(v.get("sectionTitle").is_none());
        assert_eq!(serde_json::to_value(ProfileField::JobTitle).unwrap(), "jobTitle");
    }

    #[test]
    fn id_from_trailing_segment() {
        assert_eq!(
            profile_id_from_url("https://news.sky.com/story/jane-doe-people-123"),
            Some(123)
        );
        assert_eq!(profile_id_from_url("no-hyphen-at-all-7"), Some(7));
    }

    #[test]
    fn id_rejects_malformed_segments() {
        assert_eq!(profile_id_from_url("https://x/people-0123"), None);
        assert_eq!(profile_id_from_url("https://x/people-abc"), None);
        assert_eq!(profile_id_from_url("https://x/people-"), None);
        assert_eq!(profile_id_from_url(""), None);
        assert_eq!(profile_id_from_url("https://x/people-12a"), None);
        assert_eq!(profile_id_from_url("https://x/people-99999999999"), None);
    }

    #[test]
    fn id_without_hyphen_uses_whole_string() {
        assert_eq!(profile_id_from_url("42"), Some(42));
        assert_eq!(profile_id_from_url("https://x/people"), None);
    }

    #[test]
    fn title_case_normalises_spacing_and_case() {
        assert_eq!(title_case("  sKY news   PRESENTER "), "Sky News Presenter");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn updatable_fields_are_fixed() {
        let cols: Vec<&str> = PROFILE_UPDATABLE_FIELDS.iter().map(|f| f.column()).collect();
        assert_eq!(cols, ["name", "job_title", "profile_url", "profile_image_url"]);
        assert_eq!(ProfileField::JobTitle.to_string(), "jobTitle");
    }
}
