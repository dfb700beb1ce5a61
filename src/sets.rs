//! Named follow-up substitution sets.
//!
//! When the rename catalog changes, trees produced by an earlier version of
//! the tool have to be migrated to what the current catalog would have
//! produced. Each set here is one such migration, applied to an
//! already-forked tree. No commits are made; the operator reviews and
//! commits the result.

use crate::cli::SubstitutionSet;
use crate::errors::Result;
use crate::processor::Processor;

/// Applies one named set to the tree.
pub fn apply(processor: &Processor, set: &SubstitutionSet) -> Result<()> {
    match set {
        SubstitutionSet::Naming => substitute_naming(processor),
        SubstitutionSet::Urls => substitute_urls(processor),
    }
}

/// Replaces `UnitE` by `Unit-e` and `UnitE Core` by `unit-e`.
fn substitute_naming(processor: &Processor) -> Result<()> {
    processor.replace_recursively("unite core", "unit-e")?;
    processor.replace_recursively("UnitE Core", "unit-e")?;
    processor.replace_in_file("src/init.h", "UnitE core", "unit-e")?;

    processor.replace_recursively("UnitE", "Unit-e")?;

    processor.replace_recursively("unite address", "Unit-e address")?;
    processor.replace_recursively("unite addresses", "Unit-e addresses")?;
    processor.replace_recursively("unite transaction", "Unit-e transaction")?;

    // Follow the convention "BITCOIN" -> "UNIT-E" where dashes are allowed
    processor.replace_in_file("doc/man/unite-cli.1", "UNITE-CLI", "UNIT-E-CLI")?;
    processor.replace_in_file("doc/man/unite-qt.1", "UNITE-QT", "UNIT-E-QT")?;
    processor.replace_in_file("doc/man/unite-tx.1", "UNITE-TX", "UNIT-E-TX")?;
    processor.replace_in_file("doc/tor.md", "UNITE", "UNIT-E")?;

    // Special cases
    processor.replace_in_file("doc/zmq.md", "UnitEd", "The unit-e daemon")?;
    processor.replace_in_file("test/functional/wallet_labels.py", "UnitEs", "UTEs")?;
    processor.replace_in_file(
        "test/functional/rpc_signmessage.py",
        "expected_signature = 'HzSnrVR/sJC1Rg4SQqeecq9GAmIFtlj1u87aIh5i6Mi1bEkm7b+bsI7pIKWJsRZkjAQRkKhcTTYuVJAl0bmdWvY='",
        "expected_signature = 'IBn0HqnF0UhqTgGOiEaQouMyisWG4AOVQS+OJwVXGF2eK+11/YswSl3poGNeDLqYcNIIfTxMMy7o3XfEnxozgIM='",
    )?;
    processor.replace_in_file(
        "src/util.cpp",
        "strPrefix + \"The Bitcoin Core developers\";",
        "strPrefix + \"The Unit-e developers\";",
    )?;
    processor.replace_in_file(
        "configure.ac",
        "COPYRIGHT_HOLDERS_SUBSTITUTION,[[unit-e]])",
        "COPYRIGHT_HOLDERS_SUBSTITUTION,[[Unit-e]])",
    )?;
    Ok(())
}

/// Points URLs that an earlier catalog rewrote too eagerly back at their
/// upstream targets, and moves the fork's own pages to their final hosts.
fn substitute_urls(processor: &Processor) -> Result<()> {
    processor.replace_recursively("github.com/unite/bips", "github.com/bitcoin/bips")?;
    processor.replace_recursively("github.com/unite/unite", "github.com/bitcoin/bitcoin")?;
    processor.replace_in_file("contrib/devtools/README.md", "unite/unite", "dtr-org/unit-e")?;
    processor.replace_in_file_regex(
        "src/protocol.h",
        r"https://unite\.org/en/developer-reference#(\w+)",
        "https://docs.unit-e.io/reference/p2p/$1.html",
    )?;
    processor.replace_recursively("www.unite.org", "unit-e.io")?;
    processor.replace_recursively("unite.org", "bitcoin.org")?;
    Ok(())
}
