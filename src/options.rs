//! Declarative option-flag construction for installer command lines
//!
//! Each installer operation recognizes a fixed set of option names; requested
//! options outside that set, or with an empty value, are dropped rather than
//! rejected.

use std::collections::BTreeMap;

/// Requested options for a single installer invocation, keyed by option name.
///
/// Backed by a `BTreeMap` so iteration is always in ascending name order and
/// assembled commands come out identical across calls.
pub type OptionMap = BTreeMap<String, String>;

/// Format the requested options as `--<name>=<value>` flags.
///
/// A flag is emitted for every entry whose name appears in `available` and
/// whose value is non-empty; everything else is silently skipped. The
/// returned iterator is lazy and yields flags in ascending option-name
/// order regardless of how the map was populated.
pub fn format_flags<'a>(
    given: &'a OptionMap,
    available: &'a [&'a str],
) -> impl Iterator<Item = String> + 'a {
    given
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .filter(move |(name, _)| available.contains(&name.as_str()))
        .map(|(name, value)| format!("--{}={}", name, value))
}
