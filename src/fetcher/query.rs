use std::sync::LazyLock;

use regex::Regex;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\(\[][^\)\]]*[\)\]]").expect("valid regex"));

static FEATURING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.*$").expect("valid regex"));

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip video-title noise ("(Official Video)", "[Lyrics]", "feat. X") from a
/// title before it is sent to the search endpoint.
///
/// Falls back to the trimmed input when stripping would leave nothing.
pub fn optimize_title(title: &str) -> String {
    let stripped = BRACKETED.replace_all(title, "");
    let stripped = FEATURING.replace(&stripped, "");
    let collapsed = SPACES.replace_all(stripped.trim(), " ");
    let collapsed = collapsed.trim_matches(|c: char| c == '-' || c.is_whitespace());

    if collapsed.is_empty() {
        title.trim().to_string()
    } else {
        collapsed.to_string()
    }
}
