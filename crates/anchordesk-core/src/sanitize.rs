//! Content policy: strip executable and media-embedding markup, reject
//! links to media hosts.
//!
//! Every function here is pure and idempotent: sanitizing sanitized content
//! returns it unchanged. [`sanitize_html`] reaches that by repeating its
//! passes until nothing changes, so markup that only forms after a removal
//! (`<scr<script>ipt>`) is caught as well.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::domain::{Broadcast, DialogueLine};
use crate::error::{StudioError, StudioResult};

/// Replacement topic when a blocked media link is present.
pub const BLOCKED_TOPIC_PLACEHOLDER: &str = "[Removed - contained inappropriate links]";

/// Media hosts whose links may not appear in a broadcast.
pub const BLOCKED_MEDIA_DOMAINS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "dailymotion.com",
    "twitch.tv",
    "streamable.com",
    "soundcloud.com",
    "spotify.com",
    "apple.music.com",
    "tiktok.com",
    "instagram.com/reel",
    "facebook.com/watch",
    "twitter.com/i/status",
    "vk.com/video",
    "mixcloud.com",
    "bandcamp.com",
    "periscope.tv",
    "linkedin.com/video",
];

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    let pattern = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("sanitizer patterns are valid");
    Rule {
        pattern,
        replacement,
    }
}

/// Paired element first, then any lone opening tag.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"<\s*video[^>]*>[\s\S]*?<\s*/\s*video\s*>", "[Video content removed]"),
        rule(r"<\s*video[^>]*>", "[Video tag removed]"),
        rule(r"<\s*audio[^>]*>[\s\S]*?<\s*/\s*audio\s*>", "[Audio content removed]"),
        rule(r"<\s*audio[^>]*>", "[Audio tag removed]"),
        rule(r"<\s*iframe[^>]*>[\s\S]*?<\s*/\s*iframe\s*>", "[External content removed]"),
        rule(r"<\s*iframe[^>]*>", "[Iframe tag removed]"),
        rule(r"<\s*source[^>]*>", "[Media source removed]"),
        rule(r"<\s*embed[^>]*>[\s\S]*?<\s*/\s*embed\s*>", "[Embedded content removed]"),
        rule(r"<\s*embed[^>]*>", "[Embed tag removed]"),
        rule(r"<\s*object[^>]*>[\s\S]*?<\s*/\s*object\s*>", "[Object content removed]"),
        rule(r"<\s*object[^>]*>", "[Object tag removed]"),
        rule(r"<\s*script[^>]*>[\s\S]*?<\s*/\s*script\s*>", ""),
        rule(r"<\s*script[^>]*>", ""),
        rule(r#"\son\w+\s*=\s*["'][^"']*["']"#, ""),
    ]
});

static DOMAIN_BOUNDARIES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    BLOCKED_MEDIA_DOMAINS
        .iter()
        .map(|domain| {
            let pattern = format!("[^a-z0-9]{}[^a-z0-9]", regex::escape(domain));
            let re = Regex::new(&pattern).expect("escaped domain pattern is valid");
            (*domain, re)
        })
        .collect()
});

fn sanitize_pass(input: &str) -> String {
    RULES.iter().fold(input.to_string(), |text, rule| {
        rule.pattern.replace_all(&text, rule.replacement).into_owned()
    })
}

/// Remove media-embedding elements, scripts, and inline event handlers.
///
/// Terminates: every tag rule consumes a `<` and no replacement adds one,
/// and the event-handler rule only ever shortens the text.
pub fn sanitize_html(content: &str) -> String {
    let mut current = content.to_string();
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Whether `text` links to a blocked media host.
pub fn contains_blocked_media_urls(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    let padded = format!(" {lower} ");

    for (domain, boundary) in DOMAIN_BOUNDARIES.iter() {
        let hit = lower.contains(&format!("http://{domain}"))
            || lower.contains(&format!("https://{domain}"))
            || lower.contains(&format!("www.{domain}"))
            || lower.contains(&format!("{domain}/"))
            || boundary.is_match(&padded);
        if hit {
            tracing::warn!(target: "anchordesk.sanitize", domain, "Blocked media URL detected");
            return true;
        }
    }
    false
}

/// Sanitize a topic, replacing it entirely if it links to a blocked host.
pub fn sanitize_topic(topic: &str) -> String {
    if topic.is_empty() {
        return String::new();
    }
    let cleaned = sanitize_html(topic);
    if contains_blocked_media_urls(topic) || contains_blocked_media_urls(&cleaned) {
        return BLOCKED_TOPIC_PLACEHOLDER.to_string();
    }
    cleaned
}

pub fn sanitize_dialogue(dialogue: &[DialogueLine]) -> Vec<DialogueLine> {
    dialogue
        .iter()
        .map(|line| DialogueLine::new(line.speaker, sanitize_html(&line.text)))
        .collect()
}

pub fn sanitize_broadcast(broadcast: &Broadcast) -> Broadcast {
    Broadcast {
        topic: sanitize_topic(&broadcast.topic),
        dialogue: sanitize_dialogue(&broadcast.dialogue),
        ..broadcast.clone()
    }
}

/// Reject sanitized content that has nothing left to broadcast.
pub fn ensure_broadcastable(topic: &str, dialogue: &[DialogueLine]) -> StudioResult<()> {
    if topic.trim().is_empty() {
        return Err(StudioError::content_policy("topic is empty after sanitization"));
    }
    if topic == BLOCKED_TOPIC_PLACEHOLDER {
        return Err(StudioError::content_policy(
            "topic links to a blocked media host",
        ));
    }
    if dialogue.iter().all(|line| line.text.trim().is_empty()) {
        return Err(StudioError::content_policy(
            "dialogue is empty after sanitization",
        ));
    }
    Ok(())
}
