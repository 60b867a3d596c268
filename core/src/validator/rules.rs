//! Static binding rule tables.
//!
//! Three tables decide which (target kind, attribute) pairs are bindable:
//! attributes bindable on any target, sizing attributes bindable on any
//! `AMP-` target, and per-target attribute lists. A pair missing from every
//! table is not bindable.

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Constraints on the values an attribute may take.
#[derive(Debug, Clone, Default)]
pub struct Constraint {
    /// Schemes an explicit URL scheme must belong to.
    pub allowed_protocols: Option<&'static [&'static str]>,
    /// Values matching this (case-insensitive) pattern are rejected.
    pub denylist: Option<Regex>,
    /// Validate with the rule of this attribute on the same target instead.
    pub alias_of: Option<&'static str>,
}

/// The rule for one bindable attribute.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Bindable with no constraint on the value.
    Any,
    Constrained(Constraint),
}

/// Attributes that carry URLs.
pub const URL_ATTRIBUTES: &[&str] = &["src", "srcset", "href", "xlink:href"];

pub fn is_url_attribute(attribute: &str) -> bool {
    URL_ATTRIBUTES.contains(&attribute)
}

const IMAGE_PROTOCOLS: &[&str] = &["data", "http", "https"];
const HTTPS_ONLY: &[&str] = &["https"];
const LINK_PROTOCOLS: &[&str] = &[
    "ftp",
    "geo",
    "http",
    "https",
    "mailto",
    "maps",
    "bip",
    "bbmi",
    "chrome",
    "itms-services",
    "facetime",
    "fb-me",
    "fb-messenger",
    "intent",
    "line",
    "skype",
    "sms",
    "snapchat",
    "tel",
    "tg",
    "threema",
    "twitter",
    "viber",
    "webcal",
    "web+mastodon",
    "wh",
    "whatsapp",
];

fn denylist(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid denylist pattern {:?}: {}", pattern, e))
}

fn protocols(allowed: &'static [&'static str]) -> Rule {
    Rule::Constrained(Constraint {
        allowed_protocols: Some(allowed),
        ..Constraint::default()
    })
}

fn alias_of(attribute: &'static str) -> Rule {
    Rule::Constrained(Constraint {
        alias_of: Some(attribute),
        ..Constraint::default()
    })
}

fn denied(pattern: &str) -> Rule {
    Rule::Constrained(Constraint {
        denylist: Some(denylist(pattern)),
        ..Constraint::default()
    })
}

type AttributeRules = HashMap<&'static str, Rule>;

fn unconstrained(attributes: &[&'static str]) -> AttributeRules {
    attributes.iter().map(|a| (*a, Rule::Any)).collect()
}

/// Attributes bindable on every target.
pub static GLOBAL_RULES: Lazy<AttributeRules> = Lazy::new(|| {
    let mut rules = unconstrained(&["hidden", "text"]);
    rules.insert("class", denied(r"(^|\W)i-amphtml-"));
    rules
});

/// Attributes bindable on every `AMP-` target.
pub static AMP_RULES: Lazy<AttributeRules> = Lazy::new(|| unconstrained(&["width", "height"]));

/// Attributes bindable on specific targets, keyed by upper-case target kind.
pub static ELEMENT_RULES: Lazy<HashMap<&'static str, AttributeRules>> = Lazy::new(|| {
    let mut tables = HashMap::new();

    let with = |mut rules: AttributeRules, extra: Vec<(&'static str, Rule)>| {
        rules.extend(extra);
        rules
    };

    tables.insert("AMP-AUTOCOMPLETE", with(HashMap::new(), vec![("src", protocols(HTTPS_ONLY))]));
    tables.insert(
        "AMP-BASE-CAROUSEL",
        unconstrained(&[
            "advance-count",
            "auto-advance-count",
            "auto-advance-interval",
            "auto-advance-loops",
            "horizontal",
            "initial-index",
            "loop",
            "mixed-length",
            "side-slide-count",
            "slide",
            "snap",
            "snap-align",
            "snap-by",
            "visible-count",
        ]),
    );
    tables.insert(
        "AMP-BRIGHTCOVE",
        unconstrained(&[
            "data-account",
            "data-embed",
            "data-player",
            "data-player-id",
            "data-playlist-id",
            "data-video-id",
        ]),
    );
    tables.insert("AMP-CAROUSEL", unconstrained(&["slide"]));
    tables.insert("AMP-DATE-PICKER", unconstrained(&["min", "max"]));
    tables.insert("AMP-GOOGLE-DOCUMENT-EMBED", unconstrained(&["src", "title"]));
    tables.insert("AMP-IFRAME", unconstrained(&["src"]));
    tables.insert(
        "AMP-IMG",
        with(
            unconstrained(&["alt", "attribution"]),
            vec![("src", protocols(IMAGE_PROTOCOLS)), ("srcset", alias_of("src"))],
        ),
    );
    tables.insert("AMP-LIGHTBOX", unconstrained(&["open"]));
    tables.insert(
        "AMP-LIST",
        with(
            unconstrained(&["state", "is-layout-container"]),
            vec![("src", protocols(HTTPS_ONLY))],
        ),
    );
    tables.insert("AMP-SELECTOR", unconstrained(&["disabled", "selected"]));
    tables.insert("AMP-STATE", unconstrained(&["src"]));
    tables.insert("AMP-TIMEAGO", unconstrained(&["datetime", "title"]));
    tables.insert("AMP-TWITTER", unconstrained(&["data-tweetid"]));
    tables.insert(
        "AMP-VIDEO",
        unconstrained(&[
            "alt",
            "attribution",
            "controls",
            "loop",
            "poster",
            "preload",
            "src",
            "title",
        ]),
    );
    tables.insert("AMP-YOUTUBE", unconstrained(&["data-videoid"]));

    tables.insert("A", with(HashMap::new(), vec![("href", protocols(LINK_PROTOCOLS))]));
    tables.insert("BUTTON", unconstrained(&["disabled", "type", "value"]));
    tables.insert("DETAILS", unconstrained(&["open"]));
    tables.insert("FIELDSET", unconstrained(&["disabled"]));
    tables.insert(
        "IMG",
        with(
            unconstrained(&["alt", "referrerpolicy", "sizes"]),
            vec![("src", protocols(IMAGE_PROTOCOLS)), ("srcset", alias_of("src"))],
        ),
    );
    tables.insert(
        "INPUT",
        with(
            unconstrained(&[
                "accept",
                "accesskey",
                "autocomplete",
                "checked",
                "disabled",
                "height",
                "inputmode",
                "max",
                "maxlength",
                "min",
                "minlength",
                "multiple",
                "pattern",
                "placeholder",
                "readonly",
                "required",
                "selectiondirection",
                "size",
                "spellcheck",
                "step",
                "value",
                "width",
            ]),
            vec![("type", denied(r"(^|\s)(button|image|)(\s|$)"))],
        ),
    );
    tables.insert("OPTION", unconstrained(&["disabled", "label", "selected", "value"]));
    tables.insert("OPTGROUP", unconstrained(&["disabled", "label"]));
    tables.insert("SECTION", unconstrained(&["data-expand"]));
    tables.insert(
        "SELECT",
        unconstrained(&["autofocus", "disabled", "multiple", "required", "size"]),
    );
    tables.insert("SOURCE", unconstrained(&["src", "type"]));
    tables.insert("TRACK", unconstrained(&["label", "src", "srclang"]));
    tables.insert(
        "TEXTAREA",
        unconstrained(&[
            "autocomplete",
            "autofocus",
            "cols",
            "disabled",
            "maxlength",
            "minlength",
            "placeholder",
            "readonly",
            "required",
            "rows",
            "selectiondirection",
            "selectionend",
            "selectionstart",
            "spellcheck",
            "wrap",
            "defaultText",
        ]),
    );

    tracing::debug!(targets = tables.len(), "built element binding rules");
    tables
});
