//! Color rules. Only inline `style` declarations can be judged statically, so
//! contrast is checked where an element sets both its foreground and its
//! background color.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::declare_rule;
use crate::rules::{ANY_TAG, Check, Rule, RuleContext};

/// WCAG AA minimum for normal-size text.
pub const MIN_CONTRAST_RATIO: f64 = 4.5;

static RGB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})").expect("Invalid regex pattern")
});

pub type Rgb = (u8, u8, u8);

pub fn rules() -> Vec<Rule> {
    vec![declare_rule!(
        id = "color-contrast",
        name = "Elements must meet minimum color contrast ratio thresholds",
        category = Color,
        wcag = ("1.4.3", AA),
        severity = Serious,
        description = "Inline text and background colors have a contrast ratio below 4.5:1",
        help = "Darken the text or lighten the background until the ratio reaches 4.5:1",
        help_url = "https://www.w3.org/WAI/WCAG22/Understanding/contrast-minimum.html",
        check = Check::Element {
            tags: ANY_TAG,
            predicate: inline_contrast_sufficient,
        },
    )]
}

fn inline_contrast_sufficient(element: &ElementRef<'_>, _ctx: &RuleContext<'_>) -> bool {
    let Some(style) = element.value().attr("style") else {
        return true;
    };

    let mut foreground = None;
    let mut background = None;
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => foreground = parse_color(value),
            "background-color" => background = parse_color(value),
            "background" => {
                background = value.split_ascii_whitespace().find_map(parse_color);
            }
            _ => {}
        }
    }

    match (foreground, background) {
        (Some(fg), Some(bg)) => contrast_ratio(fg, bg) >= MIN_CONTRAST_RATIO,
        _ => true,
    }
}

pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        parse_hex(hex)
    } else if let Some(caps) = RGB.captures(&value) {
        let channel = |i: usize| caps[i].parse::<u8>().ok();
        Some((channel(1)?, channel(2)?, channel(3)?))
    } else {
        named_color(&value)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let double = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Some((double(0)?, double(1)?, double(2)?))
        }
        6 | 8 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    match name {
        "white" => Some((255, 255, 255)),
        "black" => Some((0, 0, 0)),
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "yellow" => Some((255, 255, 0)),
        "gray" | "grey" => Some((128, 128, 128)),
        "silver" => Some((192, 192, 192)),
        "navy" => Some((0, 0, 128)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    }
}

/// Relative luminance as defined by WCAG 2.x.
pub fn relative_luminance((r, g, b): Rgb) -> f64 {
    let linear = [r, g, b].map(|c| {
        let v = f64::from(c) / 255.0;
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * linear[0] + 0.7152 * linear[1] + 0.0722 * linear[2]
}

/// Contrast ratio between two colors, in `1.0..=21.0`.
pub fn contrast_ratio(fg: Rgb, bg: Rgb) -> f64 {
    let l1 = relative_luminance(fg);
    let l2 = relative_luminance(bg);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}
