//! Case-preserving identifier renames for the project name.
//!
//! A single case-insensitive scan picks up every spelling of the upstream
//! name; the replacer maps each occurrence onto the matching casing template
//! of the fork name. Unrecognized casings are an error, not a guess.

use crate::errors::{Error, Result};
use crate::substitute::{ANY, Substitution};

/// Compound identifiers that must be claimed before the general pass runs,
/// in order: `(needle, match_after, replacement)`. The longer, concatenated
/// names would otherwise be partially rewritten by the single-word rule.
const COMPOUND_SUBSTITUTIONS: &[(&str, &str, &str)] = &[
    ("BITCOIND", "", "UNITED"),
    ("BITCOINCLI", "", "UNITECLI"),
    ("BITCOINTX", "", "UNITETX"),
    ("BITCOINQT", "", "UNITEQT"),
    ("BITCOIN", "[_C]", "UNITE"),
    ("bitcoin address", "", "Unit-e address"),
    ("bitcoin transaction", "", "Unit-e transaction"),
    ("Bitcoin", "[A-CE-Z]", "UnitE"),
];

/// Maps one occurrence of the project name onto the fork name with the
/// same casing template.
pub fn unite_name_for(occurrence: &str) -> Result<&'static str> {
    match occurrence {
        "bitcoin" => Ok("unite"),
        "BITCOIN" => Ok("UNIT-E"),
        "Bitcoin" => Ok("Unit-e"),
        other => Err(Error::UnhandledCase(other.to_string())),
    }
}

/// Maps one occurrence of the upstream product name ("bitcoin core") onto
/// the fork name.
pub fn unite_core_name_for(occurrence: &str) -> Result<&'static str> {
    match occurrence {
        "bitcoin core" | "Bitcoin Core" | "Bitcoin core" => Ok("unit-e"),
        other => Err(Error::UnhandledCase(other.to_string())),
    }
}

/// Rewrites every spelling of the project name in `contents`.
///
/// The compound pass runs first and claims the concatenated executable-name
/// identifiers; the general case-insensitive pass then handles the plain
/// word through [`unite_name_for`]. Blacklisted contexts survive both.
pub fn substitute_bitcoin_identifiers(contents: &str, blacklist: &[String]) -> Result<String> {
    let mut contents = contents.to_string();
    for &(needle, match_after, replacement) in COMPOUND_SUBSTITUTIONS {
        let substitution =
            Substitution::with_boundaries(needle, ANY, match_after)?.guarded(blacklist);
        contents = substitution.replace(&contents, replacement)?;
    }
    let general = Substitution::exact("bitcoin")?
        .case_insensitive()
        .guarded(blacklist);
    general.apply(&contents, |occurrence| {
        unite_name_for(occurrence).map(str::to_string)
    })
}

/// Rewrites every spelling of "bitcoin core" in `contents`.
pub fn substitute_bitcoin_core_identifiers(contents: &str, blacklist: &[String]) -> Result<String> {
    let substitution = Substitution::exact("bitcoin core")?
        .case_insensitive()
        .guarded(blacklist);
    substitution.apply(contents, |occurrence| {
        unite_core_name_for(occurrence).map(str::to_string)
    })
}
