use std::collections::HashMap;

use serde::Serialize;

use crate::util::{between, parse_query, strip_html};

/// Uploader details scraped from the watch page.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Author {
    pub name: Option<String>,
    pub user: Option<String>,
    pub channel_url: Option<String>,
}

/// Descriptive metadata scraped from the watch-page HTML. Every field is
/// best-effort: the page layout is not under our control, so a failed
/// extraction yields an absent field, never an error.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PageMetadata {
    pub author: Option<Author>,
    pub published: Option<String>,
    pub description: Option<String>,
    pub media: HashMap<String, String>,
    pub related_videos: Vec<HashMap<String, String>>,
}

pub fn scrape(body: &str) -> PageMetadata {
    PageMetadata {
        author: get_author(body),
        published: get_published(body),
        description: get_description(body),
        media: get_media(body),
        related_videos: get_related_videos(body),
    }
}

fn get_author(body: &str) -> Option<Author> {
    let name = between(body, r#""author":""#, r#"""#).map(str::to_string);
    let user = between(body, r#"href="/user/"#, r#"""#)
        .map(|u| u.split(&['?', '"'][..]).next().unwrap_or(u).to_string());
    let channel_url = between(body, r#""channelId":""#, r#"""#)
        .map(|id| format!("https://www.youtube.com/channel/{}", id));
    if name.is_none() && user.is_none() && channel_url.is_none() {
        return None;
    }
    Some(Author {
        name,
        user,
        channel_url,
    })
}

fn get_published(body: &str) -> Option<String> {
    between(body, r#"itemprop="datePublished" content=""#, r#"""#)
        .or_else(|| between(body, r#""publishDate":""#, r#"""#))
        .map(str::to_string)
}

fn get_description(body: &str) -> Option<String> {
    if let Some(raw) = between(body, r#"<p id="eow-description""#, "</p>") {
        let text = raw.split_once('>').map(|(_, rest)| rest).unwrap_or(raw);
        return Some(strip_html(text));
    }
    between(body, r#"<meta name="description" content=""#, r#"""#).map(strip_html)
}

/// The "Music in this video" style table: one row per metadata item.
fn get_media(body: &str) -> HashMap<String, String> {
    let mut media = HashMap::new();
    for chunk in body.split(r#"<li class="watch-meta-item"#).skip(1) {
        let title = between(chunk, r#"<h4 class="title">"#, "</h4>").map(strip_html);
        let content = between(chunk, r#"<ul class="content"#, "</ul>")
            .and_then(|c| c.split_once('>').map(|(_, rest)| rest))
            .map(strip_html);
        if let (Some(title), Some(content)) = (title, content) {
            if !title.is_empty() {
                media.insert(title, content);
            }
        }
    }
    media
}

/// Related videos travel as urlencoded entries in the page's
/// RELATED_PLAYER_ARGS blob, one comma-separated entry per video.
fn get_related_videos(body: &str) -> Vec<HashMap<String, String>> {
    let Some(blob) = between(body, "'RELATED_PLAYER_ARGS': ", ",\n") else {
        return Vec::new();
    };
    let Ok(args) = serde_json::from_str::<serde_json::Value>(blob) else {
        tracing::debug!("Related player args did not parse as JSON");
        return Vec::new();
    };
    let Some(rvs) = args.get("rvs").and_then(|v| v.as_str()) else {
        return Vec::new();
    };
    rvs.split(',').map(parse_query).collect()
}
