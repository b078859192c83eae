//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes keyed by method and normalized path
//! - Reject duplicate (method, path) pairs
//! - Look up the route for a request, or report NotFound
//!
//! # Design Decisions
//! - O(1) lookup via nested HashMaps
//! - An exact method beats an `ALL` route at the same path
//! - `HEAD` falls back to `GET` when no `HEAD` route exists
//! - Explicit NotFound rather than silent default

use std::collections::HashMap;

use axum::http::Method;

use crate::error::RegistrationError;

/// Result of looking up a request.
#[derive(Debug)]
pub enum RouteLookup<'a, T> {
    Match(&'a T),
    NotFound,
}

/// Routes keyed by method (or any method) and normalized path.
#[derive(Debug)]
pub struct RouteTable<T> {
    exact: HashMap<Method, HashMap<String, T>>,
    any: HashMap<String, T>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            any: HashMap::new(),
        }
    }
}

impl<T> RouteTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `(method, path)` is taken. `None` stands for `ALL`.
    pub fn contains(&self, method: Option<&Method>, path: &str) -> bool {
        match method {
            Some(m) => self.exact.get(m).is_some_and(|paths| paths.contains_key(path)),
            None => self.any.contains_key(path),
        }
    }

    /// Insert a route; fails if the pair is already registered.
    pub fn insert(
        &mut self,
        method: Option<Method>,
        path: String,
        route: T,
    ) -> Result<(), RegistrationError> {
        if self.contains(method.as_ref(), &path) {
            return Err(RegistrationError::conflict(method.as_ref(), &path));
        }
        match method {
            Some(m) => {
                self.exact.entry(m).or_default().insert(path, route);
            }
            None => {
                self.any.insert(path, route);
            }
        }
        Ok(())
    }

    /// Find the route serving `method` at an already-normalized `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, T> {
        let exact = |m: &Method| self.exact.get(m).and_then(|paths| paths.get(path));

        let found = exact(method)
            .or_else(|| {
                if *method == Method::HEAD {
                    exact(&Method::GET)
                } else {
                    None
                }
            })
            .or_else(|| self.any.get(path));

        match found {
            Some(route) => RouteLookup::Match(route),
            None => RouteLookup::NotFound,
        }
    }

    /// Total number of routes.
    pub fn len(&self) -> usize {
        self.exact.values().map(HashMap::len).sum::<usize>() + self.any.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.insert(Some(Method::GET), "/".into(), "index").unwrap();
        table.insert(Some(Method::POST), "/json".into(), "echo").unwrap();
        table.insert(None, "/any".into(), "any").unwrap();
        table.insert(Some(Method::DELETE), "/any".into(), "delete").unwrap();
        table
    }

    fn matched(lookup: RouteLookup<'_, &'static str>) -> Option<&'static str> {
        match lookup {
            RouteLookup::Match(route) => Some(*route),
            RouteLookup::NotFound => None,
        }
    }

    #[test]
    fn test_exact_match() {
        let table = table();
        assert_eq!(matched(table.lookup(&Method::GET, "/")), Some("index"));
        assert_eq!(matched(table.lookup(&Method::POST, "/json")), Some("echo"));
        assert_eq!(matched(table.lookup(&Method::GET, "/json")), None);
        assert_eq!(matched(table.lookup(&Method::GET, "/missing")), None);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_any_method_and_precedence() {
        let table = table();
        assert_eq!(matched(table.lookup(&Method::PUT, "/any")), Some("any"));
        assert_eq!(matched(table.lookup(&Method::DELETE, "/any")), Some("delete"));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let table = table();
        assert_eq!(matched(table.lookup(&Method::HEAD, "/")), Some("index"));
        assert_eq!(matched(table.lookup(&Method::HEAD, "/json")), None);
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let mut table = table();
        let err = table.insert(Some(Method::GET), "/".into(), "again").unwrap_err();
        assert!(matches!(err, RegistrationError::Conflict { .. }));
        assert_eq!(matched(table.lookup(&Method::GET, "/")), Some("index"));

        assert!(table.insert(None, "/any".into(), "again").is_err());
    }
}
