//! Rename-on-conflict naming for files.

use docvault_core::config::PathConfig;

use super::normalize::validate_segment;

/// The `n`th alternative for `name`: `report.pdf` becomes `report (n).pdf`.
///
/// The counter goes before the last extension. A name whose only dot is the
/// leading one (`.env`) has no extension.
pub fn numbered_name(name: &str, n: u32) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &name[..dot], &name[dot..]),
        _ => format!("{name} ({n})"),
    }
}

/// Candidate names in the order they are tried. Stops at the first numbered
/// name that is no longer a valid segment, since later ones only grow.
pub fn candidates<'a>(name: &'a str, config: &'a PathConfig) -> impl Iterator<Item = String> + 'a {
    std::iter::once(name.to_string()).chain(
        (1..=config.max_rename_attempts)
            .map(move |n| numbered_name(name, n))
            .take_while(move |candidate| validate_segment(candidate, config).is_ok()),
    )
}
