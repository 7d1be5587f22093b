//! Extraction of prompt lists from completion text.

use std::sync::OnceLock;

use regex::Regex;

/// Strips leading list markers: `1.`, `2)`, `-`, `*`, and surrounding quotes.
fn list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*(?:\d+[.)]\s*|[-*]\s*)?"?(.*?)"?\s*$"#).expect("valid regex"))
}

/// Parses one prompt per line out of completion output.
///
/// Models return numbered or bulleted lists, sometimes wrapped in code
/// fences; markers and fences are stripped, blank lines dropped, and
/// duplicates removed preserving first occurrence.
#[must_use]
pub fn parse_prompt_list(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .filter_map(|line| {
            let cleaned = list_marker()
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())?;
            if cleaned.is_empty() || !seen.insert(cleaned.to_lowercase()) {
                None
            } else {
                Some(cleaned)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_list() {
        let text = "1. best analytics platforms\n2. top brand monitoring tools\n3) AI visibility trackers";
        assert_eq!(
            parse_prompt_list(text),
            vec![
                "best analytics platforms",
                "top brand monitoring tools",
                "AI visibility trackers",
            ]
        );
    }

    #[test]
    fn parses_bulleted_list_with_fences() {
        let text = "```\n- what is share of voice\n* how to track brand mentions\n```";
        assert_eq!(
            parse_prompt_list(text),
            vec!["what is share of voice", "how to track brand mentions"]
        );
    }

    #[test]
    fn strips_wrapping_quotes() {
        let text = "1. \"which analytics tool do marketers prefer\"";
        assert_eq!(
            parse_prompt_list(text),
            vec!["which analytics tool do marketers prefer"]
        );
    }

    #[test]
    fn drops_blank_lines_and_duplicates() {
        let text = "1. alpha\n\n2. Alpha\n3. beta";
        assert_eq!(parse_prompt_list(text), vec!["alpha", "beta"]);
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        assert!(parse_prompt_list("").is_empty());
        assert!(parse_prompt_list("```\n```").is_empty());
    }
}
