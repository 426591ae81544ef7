//! Renewal claimant encoding.
//!
//! The `claimants` cell holds `name|type` pairs separated by `||`, e.g.
//! `Jane Doe|A||Acme Publishing|PWH`. A pair without a type keeps the name.

use crate::models::ParsedClaimant;

pub fn parse(encoded: &str) -> Vec<ParsedClaimant> {
    encoded
        .split("||")
        .filter_map(|pair| {
            let (name, kind) = match pair.split_once('|') {
                Some((name, kind)) => (name, Some(kind)),
                None => (pair, None),
            };
            if name.trim().is_empty() {
                return None;
            }
            Some(ParsedClaimant {
                name: name.to_string(),
                claimant_type: kind.filter(|k| !k.is_empty()).map(str::to_string),
            })
        })
        .collect()
}
