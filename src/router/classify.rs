// Complexity classifier (C5 / glossary): keyword + length heuristics,
// deterministic so identical inputs always classify the same way.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Trivial,
    Simple,
    Moderate,
    Complex,
    Novel,
}

const TRIVIAL_GREETINGS: &[&str] = &["hi", "hello", "hey", "thanks", "thank you", "ok", "okay", "bye"];
const COMPLEX_KEYWORDS: &[&str] = &["implement", "refactor", "architecture", "design a", "migrate"];
const NOVEL_KEYWORDS: &[&str] = &["latest", "state of the art", "cutting edge", "most recent"];

pub fn classify(query: &str) -> Complexity {
    let trimmed = query.trim();
    let lower = trimmed.to_lowercase();
    let word_count = trimmed.split_whitespace().count();

    if NOVEL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Complexity::Novel;
    }
    if COMPLEX_KEYWORDS.iter().any(|k| lower.contains(k)) || word_count > 40 {
        return Complexity::Complex;
    }
    if word_count <= 3 && TRIVIAL_GREETINGS.iter().any(|g| lower.contains(g)) {
        return Complexity::Trivial;
    }
    if word_count <= 12 {
        return Complexity::Simple;
    }
    Complexity::Moderate
}
