//! Extract search results, pagers, biographies and achievements from raw
//! Lodestone HTML using CSS selectors.
//!
//! Everything here is synchronous: `scraper::Html` is not `Send`, so crawl
//! sessions parse a body into one of these plain structs before awaiting.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Numeric id parsed from a `/character/<id>/` link.
pub type LodestoneId = u64;

/// "Page X of Y" from a search results pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerState {
    pub current_page: u32,
    pub total_pages: u32,
}

/// Everything a crawl session needs from one search results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Ids of entries whose name matched exactly (ignoring case).
    pub matches: Vec<LodestoneId>,
    pub pager: Option<PagerState>,
    /// Parse problems on this page. Collected, never fatal on their own.
    pub errors: Vec<String>,
}

/// One achievement from an achievement listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementEntry {
    pub name: String,
}

/// Achievements and in-scope links found on one achievement page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementPage {
    pub entries: Vec<AchievementEntry>,
    pub links: Vec<String>,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn child_text(element: &ElementRef<'_>, sel: &Selector) -> String {
    element
        .select(sel)
        .flat_map(|child| child.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn character_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/character/(\d+)/").expect("character link regex is valid"))
}

fn pager_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Page\s+(\d+)\s+of\s+(\d+)").expect("pager regex is valid"))
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""(.*?)""#).expect("quoted name regex is valid"))
}

/// Pull the character id out of a detail link such as
/// `/lodestone/character/12345/`.
pub fn parse_character_id(href: &str) -> Option<LodestoneId> {
    character_link_re()
        .captures(href)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse `Page X of Y`.
pub fn parse_pager(text: &str) -> Option<PagerState> {
    let caps = pager_re().captures(text)?;
    Some(PagerState {
        current_page: caps.get(1)?.as_str().parse().ok()?,
        total_pages: caps.get(2)?.as_str().parse().ok()?,
    })
}

/// Parse one search results page, keeping entries named `full_name`.
pub fn parse_search_page(html: &str, full_name: &str) -> SearchPage {
    let document = Html::parse_document(html);
    let entry_sel = selector(".ldst__window .entry");
    let name_sel = selector(".entry__name");
    let link_sel = selector(".entry__link");
    let pager_sel = selector(".ldst__window ul.btn__pager");
    let current_sel = selector(".btn__pager__current");

    let mut page = SearchPage::default();
    let wanted = full_name.to_lowercase();

    for entry in document.select(&entry_sel) {
        let name = child_text(&entry, &name_sel);
        if name.to_lowercase() != wanted {
            continue;
        }
        let href = entry
            .select(&link_sel)
            .find_map(|link| link.value().attr("href"))
            .unwrap_or("");
        match parse_character_id(href) {
            Some(id) => page.matches.push(id),
            None => page
                .errors
                .push(format!("Could not parse lodestone URL: `{href}`")),
        }
    }

    if let Some(pager) = document.select(&pager_sel).next() {
        let text = child_text(&pager, &current_sel);
        match parse_pager(&text) {
            Some(state) => page.pager = Some(state),
            None => page.errors.push(format!("Could not parse pager: `{text}`")),
        }
    }

    page
}

/// Read the free-text self introduction from a character profile page.
pub fn parse_self_introduction(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let content_sel = selector(".character__content.selected");
    let intro_sel = selector(".character__selfintroduction");

    document
        .select(&content_sel)
        .map(|content| child_text(&content, &intro_sel))
        .last()
}

/// Extract the achievement name from an entry's activity text.
///
/// Returns the first double-quoted portion without its quotes, or the whole
/// trimmed text when nothing is quoted.
pub fn achievement_name(text: &str) -> String {
    quoted_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Parse one achievement page.
///
/// Links are resolved against `page_url`, stripped of fragments, and kept
/// only when they start with `scope` (the character's URL prefix).
pub fn parse_achievement_page(html: &str, page_url: &str, scope: &str) -> AchievementPage {
    let document = Html::parse_document(html);
    let entry_sel = selector("li.entry");
    let text_sel = selector(".entry__activity__txt");
    let link_sel = selector("a[href]");
    let base = url::Url::parse(page_url).ok();

    let mut page = AchievementPage::default();

    for entry in document.select(&entry_sel) {
        let text = child_text(&entry, &text_sel);
        page.entries.push(AchievementEntry {
            name: achievement_name(&text),
        });
    }

    for link in document.select(&link_sel) {
        let href = link.value().attr("href").unwrap_or("");
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        let resolved = match base.as_ref().and_then(|b| b.join(href).ok()) {
            Some(mut u) => {
                u.set_fragment(None);
                u.to_string()
            }
            None => continue,
        };
        if resolved.starts_with(scope) && !page.links.contains(&resolved) {
            page.links.push(resolved);
        }
    }

    page
}
