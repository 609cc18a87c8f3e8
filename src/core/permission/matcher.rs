//! Wildcard permission matching
//!
//! Patterns follow the `resource:action[:scope...]` convention. A `*` segment
//! matches any value at that position, and a pattern with fewer segments than
//! the permission matches as a prefix. A pattern with more segments than the
//! permission never matches.

/// Check whether `pattern` matches `permission`.
///
/// ```
/// use authgate_rs::core::permission::matcher::matches;
///
/// assert!(matches("leads:*", "leads:write:own"));
/// assert!(matches("leads:read", "leads:read"));
/// assert!(!matches("leads:write:own", "leads:write"));
/// ```
pub fn matches(pattern: &str, permission: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split(':').collect();
    let permission_segments: Vec<&str> = permission.split(':').collect();

    if pattern_segments.len() > permission_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(permission_segments.iter())
        .all(|(p, s)| *p == "*" || p == s)
}

/// Find the first permission in `permissions` that `pattern` matches.
pub fn find_match<'a, I>(pattern: &str, permissions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    permissions.into_iter().find(|p| matches(pattern, p))
}
