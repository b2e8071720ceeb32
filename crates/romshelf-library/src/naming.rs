//! Title cleaning and file name helpers

use crate::candidate::{Candidate, CandidateKind};
use regex::Regex;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").expect("tag pattern is valid"));

/// Remove region codes, dump flags and other bracketed tags from a name.
///
/// `Super Mario World (USA) [!]` becomes `Super Mario World`.
pub fn clean_title(name: &str) -> String {
    let clean = TAG_PATTERN.replace_all(name, " ");
    clean
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string()
}

/// Name a candidate is searched under, before cleaning.
///
/// Single files lose their extension; multi-disc markers and remote titles
/// are used verbatim since they carry none.
pub fn raw_name(candidate: &Candidate) -> String {
    match &candidate.kind {
        CandidateKind::File { path, discs } if discs.is_empty() => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default(),
        _ => candidate.source_name(),
    }
}

/// Normalized search term, or `None` when nothing is left after cleaning
pub fn search_term(candidate: &Candidate) -> Option<String> {
    let term = clean_title(&raw_name(candidate));
    if term.is_empty() { None } else { Some(term) }
}

/// Make a display name safe to use as a file name
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("Super Mario World (USA)"), "Super Mario World");
        assert_eq!(clean_title("Zelda (Europe) [!]"), "Zelda");
        assert_eq!(clean_title("Pokemon Red (U) (Rev 1)"), "Pokemon Red");
        assert_eq!(clean_title("game_name"), "game name");
        assert_eq!(clean_title("Sonic {Beta} - "), "Sonic");
    }

    #[test]
    fn test_search_term_strips_extension() {
        let candidate = Candidate::file("/roms/snes/Super Mario World (USA).sfc");
        assert_eq!(search_term(&candidate).as_deref(), Some("Super Mario World"));
    }

    #[test]
    fn test_search_term_keeps_dots_in_set_names() {
        let mut candidate = Candidate::file("/roms/psx/Dr. Mario (USA)");
        if let CandidateKind::File { discs, .. } = &mut candidate.kind {
            discs.push("Dr. Mario (USA) (Disc 1).cue".to_string());
        }
        assert_eq!(search_term(&candidate).as_deref(), Some("Dr. Mario"));
    }

    #[test]
    fn test_search_term_remote_title() {
        let candidate = Candidate::steam(220, "Half-Life 2: Ep. One");
        assert_eq!(search_term(&candidate).as_deref(), Some("Half-Life 2: Ep. One"));
    }

    #[test]
    fn test_empty_term_is_none() {
        assert_eq!(search_term(&Candidate::file("/roms/(USA) [!].zip")), None);
        assert_eq!(search_term(&Candidate::steam(1, "  ")), None);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Portal 2: Co-op"), "Portal 2 Co-op");
        assert_eq!(sanitize_file_name("What/Why?"), "What Why");
        assert_eq!(sanitize_file_name("Ends."), "Ends");
    }
}
