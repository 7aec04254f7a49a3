//! Synthetic Lodestone pages and a mock server wired to them.

#![allow(dead_code)]

use std::time::Duration;

use clearway::http_client::HttpClient;
use clearway::Lodestone;
use wiremock::MockServer;

/// A search results page with `(name, id)` entries and an optional pager.
pub fn search_page(entries: &[(&str, u64)], pager: Option<&str>) -> String {
    let mut body = String::from(
        r#"<html><body><div class="ldst__window"><div class="ldst__window__head">Results</div>"#,
    );
    for (name, id) in entries {
        body.push_str(&format!(
            r#"<div class="entry"><a href="/lodestone/character/{id}/" class="entry__link"><div class="entry__box"><p class="entry__name">{name}</p><p class="entry__world">Gaia [Mana]</p></div></a></div>"#
        ));
    }
    if let Some(text) = pager {
        body.push_str(&format!(
            r#"<ul class="btn__pager"><li><a class="btn__pager__prev"></a></li><li class="btn__pager__current">{text}</li></ul>"#
        ));
    }
    body.push_str("</div></body></html>");
    body
}

/// A profile page whose self introduction is `bio`.
pub fn profile_page(bio: &str) -> String {
    format!(
        r#"<html><body>
        <div class="character__content selected">
          <div class="character__selfintroduction">{bio}</div>
        </div>
        </body></html>"#
    )
}

/// An achievement page with quoted entries and raw `<a href>` links.
pub fn achievement_page(entries: &[&str], links: &[&str]) -> String {
    let mut body = String::from(r#"<html><body><ul class="ldst__achievement">"#);
    for name in entries {
        body.push_str(&format!(
            r#"<li class="entry"><div class="entry__activity"><p class="entry__activity__txt">Jane Doe earned the achievement "{name}"!</p></div></li>"#
        ));
    }
    for href in links {
        body.push_str(&format!(r#"<li><a href="{href}">more</a></li>"#));
    }
    body.push_str("</ul></body></html>");
    body
}

/// Lodestone rooted at the mock server with no crawl delay.
pub fn lodestone(server: &MockServer) -> Lodestone {
    lodestone_with_timeout(server, Duration::from_secs(5))
}

pub fn lodestone_with_timeout(server: &MockServer, timeout: Duration) -> Lodestone {
    Lodestone::with_client(
        HttpClient::new(timeout),
        &format!("{}/lodestone", server.uri()),
        Duration::ZERO,
    )
}

/// Lodestone rooted at the mock server that spaces fetches by `delay`.
pub fn lodestone_with_delay(server: &MockServer, delay: Duration) -> Lodestone {
    Lodestone::with_client(
        HttpClient::new(Duration::from_secs(5)),
        &format!("{}/lodestone", server.uri()),
        delay,
    )
}
