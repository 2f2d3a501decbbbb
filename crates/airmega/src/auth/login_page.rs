//! Scraping of the identity provider's HTML pages.
//!
//! Only one thing is needed from these pages: the `action` URL of a form
//! located by its element id. Keeping that behind [`LoginPageParser`] isolates
//! the markup dependency so it can be tested against saved pages.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Start tag; quoted attribute values may contain `>`.
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[a-zA-Z][a-zA-Z0-9-]*((?:\s+(?:"[^"]*"|'[^']*'|[^'">\s])*)*)\s*/?>"#).unwrap()
});

static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .unwrap()
});

static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

pub trait LoginPageParser: Send + Sync {
    /// Entity-decoded `action` of the element with id `element_id`.
    fn extract_form_action(&self, html: &str, element_id: &str) -> Option<String>;
}

/// Attribute scanner over the raw markup; no DOM is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormParser;

impl LoginPageParser for HtmlFormParser {
    fn extract_form_action(&self, html: &str, element_id: &str) -> Option<String> {
        find_attribute(html, element_id, "action")
            .filter(|action| !action.trim().is_empty())
    }
}

/// Read `attribute` from the first element whose `id` equals `element_id`.
pub fn find_attribute(html: &str, element_id: &str, attribute: &str) -> Option<String> {
    for tag in TAG_REGEX.captures_iter(html) {
        let Some(attrs) = tag.get(1) else {
            continue;
        };
        let attrs = parse_attributes(attrs.as_str());

        let matches_id = attrs
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case("id") && value == element_id);
        if !matches_id {
            continue;
        }

        return attrs
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, value)| value);
    }
    None
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_REGEX
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            Some((name, decode_entities(value).into_owned()))
        })
        .collect()
}

/// Decode the HTML character references that show up in attribute values.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    ENTITY_REGEX.replace_all(input, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = if let Some(hex) = entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = entity.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => None,
            }
        };

        match decoded {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        }
    })
}
