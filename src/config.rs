use crate::errors::Result;
use crate::git;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Name of the optional per-branch configuration document, read from the
/// fork branch with `git show`.
pub const BRANCH_CONFIG_FILE: &str = ".clonemill";

/// The optional YAML document on the fork branch. Both keys are additive:
/// values are unioned with the built-in defaults, never replacing them.
#[derive(Debug, Default, Deserialize)]
pub struct BranchConfig {
    /// Files kept byte-identical to the fork branch instead of renamed.
    #[serde(default)]
    pub appropriated_files: Vec<String>,
    /// Files deleted outright at the start of the pipeline.
    #[serde(default)]
    pub removed_files: Vec<String>,
}

/// The built-in catalog driving the fork pipeline.
#[derive(Debug, Clone)]
pub struct ForkConfig {
    /// Context phrases that exempt an embedded occurrence of the project
    /// name from substitution.
    pub substitution_blacklist: Vec<String>,
    /// Path prefixes never touched by tree-wide operations.
    pub excluded_paths: Vec<String>,
    /// Per-basename ordered literal replacements for constants and tests
    /// that the name changes invalidate.
    pub file_substitutions: HashMap<String, Vec<(String, String)>>,
    /// Files pulled verbatim from the fork branch.
    pub appropriated_files: Vec<String>,
    /// Files deleted outright.
    pub removed_files: Vec<String>,
}

impl Default for ForkConfig {
    fn default() -> Self {
        let substitution_blacklist = to_strings(&[
            // the mac build downloads dependencies from here
            "bitcoincore.org",
            // copyright notice must be retained
            "The Bitcoin Core developers",
            // also copyright
            "Bitcoin Developer",
            // also copyright
            "Bitcoin Core Developers",
            // that's a test fixture which checks SHA256 hashing
            "As Bitcoin relies on 80 byte header hashes",
            // onion routing in feature_proxy.py
            "bitcoinostk4e4re",
            // binary data in custom_dsstore.py
            "\\x07bitcoin",
            // some comments link to discussions in bitcointalk
            "bitcointalk.org",
            // some comments link to discussions on stackexchange
            "bitcoin.stackexchange",
            // references to bitcoin specific infrastructure such as the
            // upstream sources for git subtrees
            "bitcoin-core",
            "branch bitcoin-fork",
            // Python packages used in functional tests
            "python-bitcoinrpc",
            "python-bitcoinlib",
            // PPA for getting BDB 4.8 packages
            "ppa:bitcoin/bitcoin",
            // Fuzzer inputs (doc/fuzzing.md)
            "download.visucore.com/bitcoin/bitcoin_fuzzy_in.tar.xz",
            // DNS seeder reference implementation (doc/dnsseed-policy.md)
            "bitcoin-seeder",
            // Test case (contrib/testgen/base58.py)
            "gitorious.org/bitcoin/python-base58.git",
            // Upstream build instructions
            "projects.archlinux.org/svntogit/community.git/tree/bitcoin/trunk/PKGBUILD",
            // Bitcoin home page
            "bitcoin.org",
            // BIPs
            "github.com/bitcoin/bips",
        ]);

        let excluded_paths = to_strings(&[
            // git subtrees
            "src/secp256k1",
            "src/crypto/ctaes",
            "src/univalue",
            "src/leveldb",
            // Removed directories
            "doc/release-notes",
            "src/qt",
            "contrib/debian",
            // CRLF line endings, which the substitution passes would mangle
            "doc/README_windows.txt",
        ]);

        let mut file_substitutions = HashMap::new();
        file_substitutions.insert(
            "guiutil.cpp".to_string(),
            // "unite:" is 2 characters shorter than "bitcoin:"
            vec![pair(
                r#"uri.replace(0, 10, "unite:");"#,
                r#"uri.replace(0, 8, "unite:");"#,
            )],
        );
        file_substitutions.insert(
            "addrman_tests.cpp".to_string(),
            // the address manager select tests draw 20 addresses which does
            // not pop out our port, a hundred do though
            vec![pair(
                "for (int i = 0; i < 20; ++i) {",
                "for (int i = 0; i < 100; ++i) {",
            )],
        );
        file_substitutions.insert(
            "clientversion.cpp".to_string(),
            // this renames the client from 'Satoshi' to 'Feuerland'
            vec![pair(
                r#"const std::string CLIENT_NAME("Satoshi");"#,
                r#"const std::string CLIENT_NAME("Feuerland");"#,
            )],
        );
        file_substitutions.insert(
            "rpc_signmessage.py".to_string(),
            // strMessageMagic now contains "Unit-e" instead of "Bitcoin",
            // so the fixture signature changes
            vec![pair(
                "expected_signature = 'INbVnW4e6PeRmsv2Qgu8NuopvrVjkcxob+sX8OcZG0SALhWybUjzMLPdAsXI46YZGb0KQTRii+wWIQzRpG/U+S0='",
                "expected_signature = 'IBn0HqnF0UhqTgGOiEaQouMyisWG4AOVQS+OJwVXGF2eK+11/YswSl3poGNeDLqYcNIIfTxMMy7o3XfEnxozgIM='",
            )],
        );
        file_substitutions.insert(
            "util_tests.cpp".to_string(),
            // capitalization of substituted strings does not work
            vec![pair(
                r#"(Capitalize("unite"), "Unit-e")"#,
                r#"(Capitalize("unit"), "Unit")"#,
            )],
        );
        file_substitutions.insert(
            "test_node.py".to_string(),
            // executable name used as variable
            vec![
                pair("timewait, unit-e, unit_e_cli", "timewait, unit_e, unit_e_cli"),
                pair("self.binary = unit-e", "self.binary = unit_e"),
            ],
        );

        let appropriated_files = to_strings(&[
            "README.md",
            "CONTRIBUTING.md",
            "doc/developer-notes.md",
            "contrib/devtools/copyright_header.py",
        ]);

        let removed_files = to_strings(&[".github/ISSUE_TEMPLATE.md"]);

        Self {
            substitution_blacklist,
            excluded_paths,
            file_substitutions,
            appropriated_files,
            removed_files,
        }
    }
}

impl ForkConfig {
    /// Reads [`BRANCH_CONFIG_FILE`] from `branch` and unions its keys into
    /// the built-ins. A branch without the document leaves the config
    /// unchanged; a document that fails to parse is an error.
    pub fn merge_from_branch(&mut self, root: &Path, branch: &str) -> Result<()> {
        let Some(contents) = git::show(root, &format!("{branch}:{BRANCH_CONFIG_FILE}"))? else {
            return Ok(());
        };
        let branch_config: BranchConfig = serde_yaml::from_str(&contents)?;
        self.merge(branch_config);
        Ok(())
    }

    /// Unions a [`BranchConfig`] into the built-ins, keeping order and
    /// dropping duplicates.
    pub fn merge(&mut self, branch_config: BranchConfig) {
        merge_unique(&mut self.appropriated_files, branch_config.appropriated_files);
        merge_unique(&mut self.removed_files, branch_config.removed_files);
    }
}

fn merge_unique(into: &mut Vec<String>, extra: Vec<String>) {
    for item in extra {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pair(needle: &str, replacement: &str) -> (String, String) {
    (needle.to_string(), replacement.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_config_is_additive() {
        let mut config = ForkConfig::default();
        let builtin_appropriated = config.appropriated_files.len();
        let document = "\
appropriated_files:
  - README.md
  - doc/new-guide.md
removed_files:
  - .github/PULL_REQUEST_TEMPLATE.md
";
        let branch_config: BranchConfig = serde_yaml::from_str(document).unwrap();
        config.merge(branch_config);
        // README.md is already a built-in; only the new entry is added.
        assert_eq!(config.appropriated_files.len(), builtin_appropriated + 1);
        assert!(config.appropriated_files.contains(&"doc/new-guide.md".to_string()));
        assert!(config
            .removed_files
            .contains(&".github/PULL_REQUEST_TEMPLATE.md".to_string()));
    }

    #[test]
    fn test_branch_config_keys_are_optional() {
        let branch_config: BranchConfig =
            serde_yaml::from_str("appropriated_files: [a.md]").unwrap();
        assert_eq!(branch_config.appropriated_files, ["a.md"]);
        assert!(branch_config.removed_files.is_empty());
    }
}
