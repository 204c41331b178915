//! Text shape helpers shared by validators, the structure checker and the
//! sort planner.
//!
//! Multi-line fields follow one layout: a primary line, then optional
//! parenthesized explanation lines. Only the primary line is subject to
//! keyword rules and sort keys.

/// Arrow markers that separate mechanism stages.
pub const ARROWS: &[&str] = &["->", "→"];

/// Non-empty, trimmed lines of a field value.
pub fn lines(value: &str) -> Vec<&str> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// First non-empty line with a trailing parenthetical removed.
///
/// `"부족: 절연지 파손 (권선 말단)"` -> `"부족: 절연지 파손"`.
pub fn primary_line(value: &str) -> &str {
    let Some(first) = lines(value).into_iter().next() else {
        return "";
    };
    strip_trailing_parenthetical(first)
}

fn strip_trailing_parenthetical(line: &str) -> &str {
    let trimmed = line.trim_end();
    let closes = trimmed.ends_with(')') || trimmed.ends_with('）');
    if !closes {
        return trimmed;
    }
    let open = trimmed.rfind('(').into_iter().chain(trimmed.rfind('（')).max();
    match open {
        Some(0) | None => trimmed,
        Some(index) => trimmed[..index].trim_end(),
    }
}

/// Lines after the first non-empty one.
pub fn detail_lines(value: &str) -> Vec<&str> {
    lines(value).into_iter().skip(1).collect()
}

/// True when the whole line is wrapped in parentheses.
pub fn is_parenthesized(line: &str) -> bool {
    let line = line.trim();
    (line.starts_with('(') || line.starts_with('（'))
        && (line.ends_with(')') || line.ends_with('）'))
}

/// Text after the first occurrence of `marker`, or the whole text when the
/// marker is absent.
pub fn after_marker<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.split_once(marker) {
        Some((_, rest)) => rest.trim(),
        None => text.trim(),
    }
}

/// Number of arrow separators in a mechanism chain.
pub fn arrow_count(value: &str) -> usize {
    ARROWS.iter().map(|arrow| value.matches(arrow).count()).sum()
}

/// Ordered, trimmed stages of a mechanism chain.
pub fn mechanism_stages(value: &str) -> Vec<&str> {
    let mut stages = vec![value];
    for arrow in ARROWS {
        stages = stages
            .into_iter()
            .flat_map(|stage| stage.split(arrow))
            .collect();
    }
    stages.into_iter().map(str::trim).collect()
}

/// Comparison key: non-empty lines, each trimmed with interior whitespace
/// runs collapsed to one space, joined by newlines.
pub fn normalized_key(value: &str) -> String {
    lines(value)
        .into_iter()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_line_drops_trailing_parenthetical() {
        assert_eq!(primary_line("부족: 절연지 파손 (권선 말단)"), "부족: 절연지 파손");
        assert_eq!(primary_line("\n  과도: 토크 \n(볼트 체결)"), "과도: 토크");
        assert_eq!(primary_line("(전체 괄호)"), "(전체 괄호)");
        assert_eq!(primary_line(""), "");
    }

    #[test]
    fn mechanism_split_mixes_arrow_styles() {
        assert_eq!(arrow_count("A -> B → C"), 2);
        assert_eq!(mechanism_stages("A -> B → C"), vec!["A", "B", "C"]);
        assert_eq!(mechanism_stages("A ->  -> C"), vec!["A", "", "C"]);
    }

    #[test]
    fn normalized_key_collapses_runs_but_keeps_lines() {
        assert_eq!(
            normalized_key("  부족:\t 단선  \n\n (권선   인출부) "),
            "부족: 단선\n(권선 인출부)"
        );
        assert_eq!(normalized_key("부족: 단선"), normalized_key("부족:   단선"));
        assert_eq!(normalized_key(" \n "), "");
    }

    #[test]
    fn parenthesized_accepts_fullwidth() {
        assert!(is_parenthesized("(권선 말단부)"));
        assert!(is_parenthesized("（권선 말단부）"));
        assert!(!is_parenthesized("권선 (말단부)"));
    }
}
