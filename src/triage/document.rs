//! Patient-name hint from scanned document text.
//!
//! The hint is only passed through to the caller for confirmation against
//! the patient registry; it never influences matching or severity.

use std::sync::LazyLock;

use regex::Regex;

/// Tried in order; the first pattern whose first match yields a plausible
/// name wins.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // "Patient name: Jane Doe", "Name - Jane Doe"
        r"(?im)(?:patient|patient\s*name|name\s*of\s*patient|name)\s*[:\-]\s*(.+)",
        // "Mrs. Jane Doe"
        r"(?i)(?:mr|mrs|ms|dr)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)",
        // Capitalized first line
        r"(?im)^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid name pattern"))
    .collect()
});

static TRAILING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;:\d/\-]+$").expect("Invalid trailing-noise pattern"));

const MAX_NAME_CHARS: usize = 60;

/// Best-effort patient name from the document, `None` when nothing plausible.
pub fn extract_patient_name(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    NAME_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let raw = caps.get(1)?.as_str();
        clean_candidate(raw)
    })
}

fn clean_candidate(raw: &str) -> Option<String> {
    let first_line = raw.trim().lines().next().unwrap_or_default().trim();
    let candidate = TRAILING_NOISE.replace(first_line, "");
    let candidate = candidate.trim();

    let words = candidate.split_whitespace().count();
    if (2..=5).contains(&words) && candidate.chars().count() <= MAX_NAME_CHARS {
        Some(candidate.to_string())
    } else {
        None
    }
}
