//! Path normalization.
//!
//! # Responsibilities
//! - Ensure a leading slash
//! - Collapse duplicate slashes
//! - Strip the query string from request targets
//! - Join mount prefixes with route paths
//!
//! # Design Decisions
//! - Trailing slashes are significant (`/a` and `/a/` differ)
//! - Path matching is case-sensitive

/// Normalize a route or request path.
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Normalize a mount prefix. An empty or `/` prefix means "no prefix".
pub fn normalize_prefix(prefix: &str) -> String {
    normalize(prefix).trim_end_matches('/').to_string()
}

/// Join a prefix and a route path.
///
/// A bare `/` under a non-empty prefix addresses the prefix itself, so a
/// plugin at `/api/v1` registering `/` answers at `/api/v1`.
pub fn join(prefix: &str, path: &str) -> String {
    let prefix = normalize_prefix(prefix);
    let path = normalize(path);

    if prefix.is_empty() {
        path
    } else if path == "/" {
        prefix
    } else {
        normalize(&format!("{prefix}{path}"))
    }
}
