use crate::errors::Result;
use regex::Regex;
use std::borrow::Cow;

/// Boundary pattern for whole-identifier matches: end of string, or a
/// character outside the identifier alphabet.
pub const IDENT_BOUNDARY: &str = "$|[^a-zA-Z0-9]";

/// Boundary pattern that places no constraint on the adjacent character.
pub const ANY: &str = "";

/// A compiled find-and-replace rule.
///
/// A `Substitution` scans a string left-to-right for a literal needle and
/// decides per occurrence whether to rewrite it. Three gates apply:
///
/// - the single character before the match must satisfy `match_before`,
/// - the single character after the match must satisfy `match_after`,
/// - no [`ContextGuard`] may suppress the occurrence.
///
/// Boundary patterns are tested against exactly one adjacent character, with
/// out-of-bounds represented as the empty string, so `"$|[^a-zA-Z0-9]"`
/// reads as "end of string, or not alphanumeric". The empty pattern matches
/// anything.
///
/// Applying a substitution is pure: no state is carried between calls, and
/// replacement text is never re-scanned for further matches.
pub struct Substitution {
    needle: String,
    folded_needle: String,
    match_before: Regex,
    match_after: Regex,
    case_sensitive: bool,
    guards: Vec<ContextGuard>,
}

/// A blacklist entry compiled against a needle.
///
/// Holds the literal context phrase together with every byte offset at which
/// the needle is embedded in it. At match time the guard re-derives where the
/// phrase would have to start for the current occurrence to be part of it,
/// and suppresses the occurrence when the original text reproduces the
/// phrase exactly at that window. Any aligned embedded occurrence suppresses;
/// windows running off either end of the text never do.
pub struct ContextGuard {
    context: String,
    offsets: Vec<usize>,
}

impl ContextGuard {
    /// Compiles a guard for `needle` inside `context`. Returns `None` when
    /// the context does not embed the needle at all (the entry can then
    /// never suppress and is dropped up front).
    pub fn new(context: &str, needle: &str, case_sensitive: bool) -> Option<Self> {
        let folded_context = fold(context, case_sensitive);
        let folded_needle = fold(needle, case_sensitive);
        let mut offsets = Vec::new();
        let mut ix = 0;
        while let Some(pos) = folded_context[ix..].find(folded_needle.as_ref()) {
            let found = ix + pos;
            offsets.push(found);
            // Step a single character so overlapping embeddings are kept.
            let step = folded_context[found..].chars().next().map_or(1, char::len_utf8);
            ix = found + step;
        }
        if offsets.is_empty() {
            None
        } else {
            Some(Self {
                context: context.to_string(),
                offsets,
            })
        }
    }

    /// True when this entry, aligned so that one of its embedded needle
    /// occurrences coincides with the match starting at `start`, reproduces
    /// the original text exactly.
    pub fn suppresses(&self, text: &str, start: usize) -> bool {
        for &offset in &self.offsets {
            let Some(context_start) = start.checked_sub(offset) else {
                continue;
            };
            let context_end = context_start + self.context.len();
            if context_end > text.len() {
                continue;
            }
            if !text.is_char_boundary(context_start) || !text.is_char_boundary(context_end) {
                continue;
            }
            if &text[context_start..context_end] == self.context {
                return true;
            }
        }
        false
    }
}

impl Substitution {
    /// Creates a rule matching `needle` as a whole identifier (both adjacent
    /// characters must be outside `[a-zA-Z0-9]`, or the string must end).
    pub fn new(needle: &str) -> Result<Self> {
        Self::with_boundaries(needle, IDENT_BOUNDARY, IDENT_BOUNDARY)
    }

    /// Creates a rule matching `needle` anywhere, with no boundary checks.
    pub fn exact(needle: &str) -> Result<Self> {
        Self::with_boundaries(needle, ANY, ANY)
    }

    /// Creates a rule with explicit boundary patterns. The patterns are
    /// anchored and tested against the single adjacent character, or against
    /// the empty string at either end of the text.
    pub fn with_boundaries(needle: &str, match_before: &str, match_after: &str) -> Result<Self> {
        // Zero-length needles would never advance the scan; calling this
        // way is a bug in the caller.
        debug_assert!(!needle.is_empty(), "zero-length needle");
        Ok(Self {
            needle: needle.to_string(),
            folded_needle: needle.to_string(),
            match_before: compile_boundary(match_before)?,
            match_after: compile_boundary(match_after)?,
            case_sensitive: true,
            guards: Vec::new(),
        })
    }

    /// Switches the rule to case-insensitive matching using the fixed ASCII
    /// fold (never locale folding). Guards already attached are recompiled
    /// under the new folding.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self.folded_needle = self.needle.to_ascii_lowercase();
        let contexts: Vec<String> = self.guards.drain(..).map(|g| g.context).collect();
        for context in &contexts {
            self.push_guard(context);
        }
        self
    }

    /// Attaches blacklist context phrases. Entries that do not embed the
    /// needle are dropped.
    pub fn guarded<S: AsRef<str>>(mut self, blacklist: &[S]) -> Self {
        for item in blacklist {
            self.push_guard(item.as_ref());
        }
        self
    }

    fn push_guard(&mut self, context: &str) {
        if let Some(guard) = ContextGuard::new(context, &self.needle, self.case_sensitive) {
            self.guards.push(guard);
        }
    }

    /// Replaces every eligible occurrence with a fixed string.
    pub fn replace(&self, text: &str, replacement: &str) -> Result<String> {
        self.apply(text, |_| Ok(replacement.to_string()))
    }

    /// Scans `text` once, left-to-right, calling `replacer` for every
    /// occurrence that passes the boundary and guard checks. The replacer
    /// receives the matched substring in its original casing even under
    /// case-insensitive matching, so callers can dispatch on exact casing.
    /// Suppressed and boundary-rejected spans are kept verbatim.
    pub fn apply<F>(&self, text: &str, mut replacer: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<String>,
    {
        // The ASCII fold preserves byte lengths, so offsets found in the
        // folded haystack are valid in the original text.
        let haystack = fold(text, self.case_sensitive);
        let mut out = String::with_capacity(text.len());
        let mut ix = 0;
        while let Some(pos) = haystack[ix..].find(&self.folded_needle) {
            let start = ix + pos;
            let end = start + self.folded_needle.len();
            let suppressed = self.guards.iter().any(|g| g.suppresses(text, start));
            if !suppressed
                && boundary_matches(&self.match_before, text[..start].chars().next_back())
                && boundary_matches(&self.match_after, text[end..].chars().next())
            {
                out.push_str(&text[ix..start]);
                out.push_str(&replacer(&text[start..end])?);
            } else {
                out.push_str(&text[ix..end]);
            }
            ix = end;
        }
        out.push_str(&text[ix..]);
        Ok(out)
    }
}

fn fold(s: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.to_ascii_lowercase())
    }
}

fn compile_boundary(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})"))?)
}

fn boundary_matches(pattern: &Regex, adjacent: Option<char>) -> bool {
    match adjacent {
        Some(c) => pattern.is_match(c.encode_utf8(&mut [0u8; 4])),
        None => pattern.is_match(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_identifier_boundaries() {
        let sub = Substitution::new("COIN").unwrap();
        let out = sub.replace("COIN * COIN_TO_SAT, BITCOIN", "UNIT").unwrap();
        assert_eq!(out, "UNIT * UNIT_TO_SAT, BITCOIN");
    }

    #[test]
    fn test_boundary_excluding_trailing_letters() {
        // The before-boundary leaves 'c', 'm' and 'u' eligible so metric
        // prefixes keep working, while refusing other alphabetic runs.
        let sub =
            Substitution::with_boundaries("BTC", "$|[^a-bd-ln-tv-zA-Z]", IDENT_BOUNDARY).unwrap();
        assert_eq!(
            sub.replace("10 BTC and 5 mBTC", "UTE").unwrap(),
            "10 UTE and 5 mUTE"
        );
        assert_eq!(sub.replace("LIBBTC stays", "UTE").unwrap(), "LIBBTC stays");
        assert_eq!(sub.replace("BTCx stays", "UTE").unwrap(), "BTCx stays");
    }

    #[test]
    fn test_empty_boundary_matches_anywhere() {
        let sub = Substitution::exact("coin").unwrap();
        assert_eq!(sub.replace("bitcoins", "unit").unwrap(), "bitunits");
    }

    #[test]
    fn test_guard_suppresses_single_occurrence() {
        let sub = Substitution::exact("bitcoin")
            .unwrap()
            .guarded(&["bitcoincore.org"]);
        let text = "https://bitcoincore.org/depends-sources";
        assert_eq!(sub.replace(text, "unite").unwrap(), text);
        // A sibling occurrence outside the phrase is still rewritten.
        assert_eq!(
            sub.replace("see bitcoincore.org and bitcoin", "unite").unwrap(),
            "see bitcoincore.org and unite"
        );
    }

    #[test]
    fn test_guard_alignment_is_positional() {
        // The guard phrase must surround the occurrence; matching text
        // elsewhere in the string does not suppress.
        let sub = Substitution::exact("bitcoin")
            .unwrap()
            .guarded(&["bitcoincore.org"]);
        assert_eq!(
            sub.replace("git clone https://github.com/bitcoin/bitcoin.git", "unite")
                .unwrap(),
            "git clone https://github.com/unite/unite.git"
        );
    }

    #[test]
    fn test_guard_with_repeated_embedded_needle() {
        let sub = Substitution::exact("bitcoin")
            .unwrap()
            .guarded(&["ppa:bitcoin/bitcoin"]);
        let text = "sudo add-apt-repository ppa:bitcoin/bitcoin";
        // Both embedded occurrences align, so both are suppressed.
        assert_eq!(sub.replace(text, "unite").unwrap(), text);
    }

    #[test]
    fn test_guard_window_off_the_ends_never_suppresses() {
        let sub = Substitution::exact("bitcoin")
            .unwrap()
            .guarded(&["xbitcoinx"]);
        assert_eq!(sub.replace("bitcoin", "unite").unwrap(), "unite");
    }

    #[test]
    fn test_replacer_sees_original_casing() {
        let sub = Substitution::exact("bitcoin").unwrap().case_insensitive();
        let mut seen = Vec::new();
        let out = sub
            .apply("Bitcoin BITCOIN bitcoin", |occurrence| {
                seen.push(occurrence.to_string());
                Ok(occurrence.to_string())
            })
            .unwrap();
        assert_eq!(out, "Bitcoin BITCOIN bitcoin");
        assert_eq!(seen, ["Bitcoin", "BITCOIN", "bitcoin"]);
    }

    #[test]
    fn test_single_pass_does_not_rescan_replacements() {
        let sub = Substitution::exact("aa").unwrap();
        // Matches at 0 and 2 only; the scan never revisits emitted text.
        assert_eq!(sub.replace("aaaa", "b").unwrap(), "bb");
        let sub = Substitution::exact("unit").unwrap();
        assert_eq!(sub.replace("a unit", "unit unit").unwrap(), "a unit unit");
    }

    #[test]
    fn test_apply_is_idempotent_for_disjoint_alphabets() {
        let sub = Substitution::new("8332").unwrap();
        let once = sub.replace("port=8332 rpcport=8332", "7181").unwrap();
        let twice = sub.replace(&once, "7181").unwrap();
        assert_eq!(once, "port=7181 rpcport=7181");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_replacer_error_propagates() {
        let sub = Substitution::exact("bitcoin").unwrap();
        let result = sub.apply("bitcoin", |occurrence| {
            Err(crate::errors::Error::UnhandledCase(occurrence.to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_context_guard_in_isolation() {
        let guard = ContextGuard::new("The Bitcoin Core developers", "bitcoin", false).unwrap();
        let text = "Copyright The Bitcoin Core developers and Bitcoin Core";
        // "Bitcoin" inside the full phrase is suppressed.
        assert!(guard.suppresses(text, 14));
        // The trailing "Bitcoin Core" is not part of the phrase.
        assert!(!guard.suppresses(text, 42));
        // Entries that do not embed the needle compile to nothing.
        assert!(ContextGuard::new("unrelated phrase", "bitcoin", false).is_none());
    }

    #[test]
    fn test_non_ascii_text_around_matches() {
        let sub = Substitution::new("₿").unwrap();
        assert_eq!(sub.replace("fee: ₿ 21", "U⋮").unwrap(), "fee: U⋮ 21");
    }
}
