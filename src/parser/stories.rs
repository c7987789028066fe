use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static STORY: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".ui-story").unwrap());
static SECTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("section").unwrap());
static SECTION_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ui-section-header-title").unwrap());

/// Every profile story element, in document order.
pub fn find_stories(doc: &Html) -> Vec<ElementRef<'_>> {
    doc.select(&STORY).collect()
}

/// Heading of the `section` the story sits in, if it has one.
pub fn section_title(story: ElementRef<'_>) -> Option<String> {
    let section = closest(story, &SECTION)?;
    let title = section.select(&SECTION_TITLE).next()?;
    Some(text_of(title))
}

/// Nearest ancestor matching `selector`.
pub fn closest<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| selector.matches(a))
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
