use chrono::NaiveDateTime;

/// Timestamp layout used by the API, e.g. `2020-01-01T12:00:00Z`.
pub const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Layout shown next to each article, e.g. `Jan 1, 2020 12:00`.
pub const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y %H:%M";

/// One news article as shown in the list.
///
/// Every field is stored exactly as received (apart from the teaser, which is
/// stripped of markup by the parser) and defaults to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSummary {
    category: String,
    headline: String,
    trail_text: String,
    byline: String,
    published: String,
    web_url: String,
    thumbnail_url: String,
}

impl ArticleSummary {
    pub fn new(
        category: impl Into<String>,
        headline: impl Into<String>,
        trail_text: impl Into<String>,
        byline: impl Into<String>,
        published: impl Into<String>,
        web_url: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            headline: headline.into(),
            trail_text: trail_text.into(),
            byline: byline.into(),
            published: published.into(),
            web_url: web_url.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn trail_text(&self) -> &str {
        &self.trail_text
    }

    pub fn byline(&self) -> &str {
        &self.byline
    }

    /// Raw publication timestamp, not validated.
    pub fn published(&self) -> &str {
        &self.published
    }

    pub fn web_url(&self) -> &str {
        &self.web_url
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail_url.is_empty()
    }

    /// Publication date reformatted for display, or an empty string when the
    /// stored timestamp does not match [`API_DATE_FORMAT`].
    pub fn display_date(&self) -> String {
        format_display_date(&self.published)
    }
}

pub fn format_display_date(timestamp: &str) -> String {
    match NaiveDateTime::parse_from_str(timestamp, API_DATE_FORMAT) {
        Ok(dt) => dt.format(DISPLAY_DATE_FORMAT).to_string(),
        Err(_) => String::new(),
    }
}
