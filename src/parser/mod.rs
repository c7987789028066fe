pub mod fields;
pub mod stories;

use scraper::Html;
use serde::Serialize;

use crate::profile::{title_case, ProfileId};

/// A profile as found on the listing page, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedProfile {
    pub profile_id: Option<ProfileId>,
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub profile_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub section_title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub title_case_job_titles: bool,
}

/// Two-step pipeline: html → story elements → candidate profiles.
pub fn extract_profiles(html: &str, opts: ExtractOptions) -> Vec<ScrapedProfile> {
    let doc = Html::parse_document(html);
    let mut profiles: Vec<ScrapedProfile> = stories::find_stories(&doc)
        .into_iter()
        .map(fields::extract)
        .collect();

    if opts.title_case_job_titles {
        for p in &mut profiles {
            p.job_title = p.job_title.as_deref().map(title_case);
        }
    }

    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/profiles.html").unwrap()
    }

    #[test]
    fn extracts_in_document_order() {
        let profiles = extract_profiles(&fixture(), ExtractOptions::default());
        assert_eq!(profiles.len(), 5);
        let ids: Vec<_> = profiles.iter().map(|p| p.profile_id).collect();
        assert_eq!(ids, [Some(12345), Some(67890), Some(24680), None, None]);
    }

    #[test]
    fn full_story_fields() {
        let profiles = extract_profiles(&fixture(), ExtractOptions::default());
        let p = &profiles[0];
        assert_eq!(p.name.as_deref(), Some("Jane Doe"));
        assert_eq!(p.job_title.as_deref(), Some("political EDITOR"));
        assert_eq!(
            p.profile_url.as_deref(),
            Some("https://news.sky.com/story/jane-doe-12345")
        );
        assert_eq!(
            p.profile_image_url.as_deref(),
            Some("https://e3.365dm.com/profiles/jane.jpg")
        );
        assert_eq!(p.section_title.as_deref(), Some("Presenters"));
    }

    #[test]
    fn missing_elements_are_none() {
        let profiles = extract_profiles(&fixture(), ExtractOptions::default());
        let no_image = &profiles[2];
        assert_eq!(no_image.profile_image_url, None);
        assert_eq!(no_image.section_title.as_deref(), Some("Correspondents"));

        let no_link = &profiles[3];
        assert_eq!(no_link.profile_url, None);
        assert_eq!(no_link.profile_id, None);

        let empty_name = &profiles[4];
        assert_eq!(empty_name.name.as_deref(), Some(""));
        assert_eq!(empty_name.profile_id, None);
    }

    #[test]
    fn title_case_is_opt_in() {
        let opts = ExtractOptions {
            title_case_job_titles: true,
        };
        let profiles = extract_profiles(&fixture(), opts);
        assert_eq!(profiles[0].job_title.as_deref(), Some("Political Editor"));
    }

    #[test]
    fn no_stories_is_empty() {
        let profiles = extract_profiles("<html><body><p>nothing</p></body></html>", ExtractOptions::default());
        assert!(profiles.is_empty());
    }
}
