//! Help text and template escaping.

/// Script listings longer than this are cut to head and tail
pub const LISTING_LIMIT: usize = 300;
/// Lines kept at each end of a cut listing
pub const LISTING_KEEP: usize = 100;

/// Escape the characters the descriptor template layer interprets
#[must_use]
pub fn cheetah_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '$' | '#') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Script lines indented four spaces, blank lines dropped, long scripts cut
/// to head and tail around a marker
#[must_use]
pub fn script_listing(script: &str) -> Vec<String> {
    let lines: Vec<String> = script
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("    {}", cheetah_escape(l.trim_end())))
        .collect();
    if lines.len() <= LISTING_LIMIT {
        return lines;
    }
    let mut cut = lines[..LISTING_KEEP].to_vec();
    cut.push(format!("    >{} lines - stuff deleted", LISTING_LIMIT));
    cut.push("    ......".to_string());
    cut.extend_from_slice(&lines[lines.len() - LISTING_KEEP..]);
    cut
}

/// Full help section: escaped user help (or a request for some), then the
/// script listing when there is a script
#[must_use]
pub fn compose_help(help_text: &str, author: &str, script: Option<&str>) -> String {
    let mut help = help_text
        .lines()
        .map(|l| cheetah_escape(l.trim_end()))
        .collect::<Vec<_>>()
        .join("\n");
    if help.trim().is_empty() {
        help = format!(
            "Ask the tool author ({}) to rebuild with help text please\n",
            author
        );
    }
    if let Some(script) = script {
        help.push_str("\n\n------\n\n\nScript::\n\n");
        help.push_str(&script_listing(script).join("\n"));
        help.push('\n');
    }
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(cheetah_escape("cost $5 # note"), "cost \\$5 \\# note");
        assert_eq!(cheetah_escape("plain"), "plain");
    }

    #[test]
    fn test_default_help_names_author() {
        let help = compose_help("  \n", "me@example.org", None);
        assert!(help.contains("me@example.org"));
    }

    #[test]
    fn test_listing_indented_and_escaped() {
        let help = compose_help("Reverses lines", "a@b", Some("#!/bin/bash\n\nrev $1\n"));
        assert!(help.starts_with("Reverses lines"));
        assert!(help.contains("Script::"));
        assert!(help.contains("    \\#!/bin/bash\n    rev \\$1"));
    }

    #[test]
    fn test_long_listing_is_cut() {
        let script: String = (0..350).map(|i| format!("line{}\n", i)).collect();
        let listing = script_listing(&script);
        assert_eq!(listing.len(), 2 * LISTING_KEEP + 2);
        assert_eq!(listing[0], "    line0");
        assert_eq!(listing[LISTING_KEEP], "    >300 lines - stuff deleted");
        assert_eq!(listing.last().map(String::as_str), Some("    line349"));
    }
}
