//! Text preparation applied to solutions before they are checked and executed.

/// Prepare a solution for restriction matching and for embedding into comparison queries.
///
/// Surrounding whitespace and every semicolon are removed, line breaks become single
/// spaces and the whole text is uppercased. Applying it twice gives the same text.
#[must_use]
pub fn normalize_solution(solution: &str) -> String {
    solution
        .trim()
        .replace(';', "")
        .replace("\r\n", "\n")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_uppercase()
}

/// Find the first restriction the normalized solution contains.
/// Matching is done against the uppercased restriction; blank restrictions never match.
#[must_use]
pub fn find_violation<'a>(normalized: &str, restrictions: &'a [String]) -> Option<&'a str> {
    restrictions
        .iter()
        .map(String::as_str)
        .find(|restriction| {
            let token = restriction.trim();
            !token.is_empty() && normalized.contains(&token.to_uppercase())
        })
}
