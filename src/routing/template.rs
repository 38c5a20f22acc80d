//! Path templates and path cleaning.
//!
//! # Responsibilities
//! - Compile `"/svc/<id>"`-style templates at route-load time
//! - Match cleaned request paths as an anchored prefix
//! - Report how many bytes of the path the template consumed
//!
//! # Design Decisions
//! - `<name>` placeholders match any characters (including `/`), greedily
//! - Anchored at the start, unanchored at the end: a path that merely
//!   begins with the template is accepted, enabling sub-path proxying
//! - No regex; a small backtracking scan keeps matching allocation-free
//! - Matching is case-sensitive (paths), query strings never participate

/// One compiled piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// Literal text that must appear verbatim.
    Literal(String),
    /// A `<name>` placeholder; matches any run of characters.
    Wildcard,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    parts: Vec<Part>,
}

impl PathTemplate {
    /// Compile a template string. Placeholders are `<` .. `>` spans;
    /// the placeholder name is ignored.
    pub fn compile(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut in_placeholder = false;

        for ch in source.chars() {
            match ch {
                '<' if !in_placeholder => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    in_placeholder = true;
                }
                '>' if in_placeholder => {
                    parts.push(Part::Wildcard);
                    in_placeholder = false;
                }
                _ if in_placeholder => {} // placeholder name, not significant
                _ => literal.push(ch),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Self {
            source: source.to_string(),
            parts,
        }
    }

    /// The template as configured. Registry ordering sorts on its length.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if the cleaned `path` starts with this template.
    pub fn matches(&self, path: &str) -> bool {
        self.matched_len(path).is_some()
    }

    /// Number of bytes of `path` consumed by the template, or `None` if it
    /// does not match. Used for prefix stripping before forwarding.
    pub fn matched_len(&self, path: &str) -> Option<usize> {
        match_parts(&self.parts, path)
    }
}

fn match_parts(parts: &[Part], path: &str) -> Option<usize> {
    let Some((first, rest)) = parts.split_first() else {
        return Some(0);
    };
    match first {
        Part::Literal(lit) => {
            let tail = path.strip_prefix(lit.as_str())?;
            match_parts(rest, tail).map(|n| n + lit.len())
        }
        Part::Wildcard => {
            // Greedy: a trailing wildcard swallows the rest of the path;
            // otherwise backtrack from the longest split.
            if rest.is_empty() {
                return Some(path.len());
            }
            for split in (0..=path.len()).rev() {
                if !path.is_char_boundary(split) {
                    continue;
                }
                if let Some(n) = match_parts(rest, &path[split..]) {
                    return Some(split + n);
                }
            }
            None
        }
    }
}

/// Strip the query string and any trailing slashes from a request path.
///
/// Matching always runs against the cleaned form; the query string is
/// preserved separately for forwarding.
pub fn clean_path(path: &str) -> String {
    let without_query = match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    };
    without_query.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_prefix() {
        let t = PathTemplate::compile("/api");
        assert!(t.matches("/api"));
        assert!(t.matches("/api/v1/users"));
        assert!(!t.matches("/images"));
        assert_eq!(t.matched_len("/api/v1/users"), Some(4));
    }

    #[test]
    fn test_trailing_wildcard() {
        let t = PathTemplate::compile("/svc/<id>");
        assert!(t.matches("/svc/42"));
        assert!(t.matches("/svc/42/details"));
        assert!(!t.matches("/svc"));
        // trailing wildcard consumes everything
        assert_eq!(t.matched_len("/svc/42/details"), Some("/svc/42/details".len()));
    }

    #[test]
    fn test_inner_wildcard() {
        let t = PathTemplate::compile("/users/<id>/avatar");
        assert!(t.matches("/users/7/avatar"));
        assert!(t.matches("/users/7/avatar/large"));
        assert!(!t.matches("/users/7/profile"));
        assert_eq!(t.matched_len("/users/7/avatar"), Some("/users/7/avatar".len()));
    }

    #[test]
    fn test_greedy_backtracking() {
        // wildcard must backtrack past later occurrences of the literal
        let t = PathTemplate::compile("/a/<x>/b");
        assert_eq!(t.matched_len("/a/1/b/2/b"), Some("/a/1/b/2/b".len()));
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path("/api/v1/"), "/api/v1");
        assert_eq!(clean_path("/api/v1///"), "/api/v1");
        assert_eq!(clean_path("/api?x=1"), "/api");
        assert_eq!(clean_path("/api/?x=1"), "/api");
        assert_eq!(clean_path("/"), "");
    }

    #[test]
    fn test_placeholder_name_not_significant() {
        let a = PathTemplate::compile("/svc/<id>");
        let b = PathTemplate::compile("/svc/<anything>");
        assert_eq!(a.matched_len("/svc/42"), b.matched_len("/svc/42"));
    }
}
