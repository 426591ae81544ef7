//! Set-difference reconciliation of stored collections.

use std::collections::HashSet;
use std::hash::Hash;

/// Drop stored members whose key is absent from `incoming`, then append
/// incoming members whose key is not stored yet.
///
/// Members that survive keep their identity (and database id), so
/// reconciling against the same values twice changes nothing.
pub(crate) fn reconcile<S, N, K>(
    stored: &mut Vec<S>,
    incoming: Vec<N>,
    stored_key: impl Fn(&S) -> K,
    incoming_key: impl Fn(&N) -> K,
    create: impl Fn(N) -> S,
) where
    K: Eq + Hash,
{
    let wanted = incoming.iter().map(&incoming_key).collect::<HashSet<_>>();
    stored.retain(|s| wanted.contains(&stored_key(s)));
    let mut present = stored.iter().map(&stored_key).collect::<HashSet<_>>();
    for item in incoming {
        if present.insert(incoming_key(&item)) {
            stored.push(create(item));
        }
    }
}

/// Append numbers to a pipe-delimited trail, skipping ones already on it.
pub(crate) fn extend_trail<'a>(trail: &mut String, numbers: impl IntoIterator<Item = &'a str>) {
    let mut parts = trail.split('|').filter(|p| !p.is_empty()).map(str::to_string).collect::<Vec<_>>();
    for number in numbers {
        if !parts.iter().any(|p| p == number) {
            parts.push(number.to_string());
        }
    }
    *trail = parts.join("|");
}
