//! Stylesheet preprocessing.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid regex pattern"));

/// Removes `/* ... */` comments, keeping their line breaks so line-based
/// snippets still line up with the file.
pub fn strip_comments(css: &str) -> Cow<'_, str> {
    BLOCK_COMMENT.replace_all(css, |caps: &regex::Captures<'_>| {
        "\n".repeat(caps[0].matches('\n').count())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_block_comments() {
        assert_eq!(strip_comments("a { color: red; } /* note */ b {}"), "a { color: red; }  b {}");
    }

    #[test]
    fn keeps_line_breaks_of_multiline_comments() {
        let css = "/* one\ntwo\nthree */\nbutton { outline: none; }";

        assert_eq!(strip_comments(css), "\n\n\nbutton { outline: none; }");
    }

    #[test]
    fn leaves_uncommented_css_untouched() {
        let css = "a:focus { outline: 2px solid; }";

        assert!(matches!(strip_comments(css), Cow::Borrowed(_)));
    }
}
