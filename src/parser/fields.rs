use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::stories::{section_title, text_of};
use super::ScrapedProfile;
use crate::profile::profile_id_from_url;

static TAG: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".ui-story-tag").unwrap());
static HEADLINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ui-story-headline").unwrap());
static MEDIA: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img.ui-story-media").unwrap());

/// Pull one candidate profile out of a story element.
///
/// A missing element gives `None`; a present element with no text gives
/// `Some("")`, which the validator treats as invalid.
pub fn extract(story: ElementRef<'_>) -> ScrapedProfile {
    let headline = story.select(&HEADLINE).next();

    let name = story.select(&TAG).next().map(text_of);
    let job_title = headline.map(text_of);
    let profile_url = headline.and_then(|h| attr(h, "href"));
    let profile_id = profile_id_from_url(profile_url.as_deref().unwrap_or(""));
    let profile_image_url = story.select(&MEDIA).next().and_then(|img| attr(img, "src"));

    ScrapedProfile {
        profile_id,
        name,
        job_title,
        profile_url,
        profile_image_url,
        section_title: section_title(story),
    }
}

fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(|v| v.to_string())
}
