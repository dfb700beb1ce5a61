use crate::config::ForkConfig;
use crate::errors::{Error, Result};
use crate::git;
use crate::processor::{Discovery, Processor};
use crate::substitute::{ANY, IDENT_BOUNDARY};
use std::path::{Path, PathBuf};

/// Port renumbering catalog: `(upstream, fork, description)`.
const PORTS: &[(&str, &str, &str)] = &[
    ("8332", "7181", "mainnet rpc port"),
    ("8333", "7182", "mainnet port"),
    ("18332", "17181", "testnet rpc port"),
    ("18333", "17182", "testnet port"),
    ("18443", "17291", "regtest rpc port"),
    ("18444", "17292", "regtest port"),
    ("28332", "27181", "ssl rpc proxy port"),
];

/// Unit identifier catalog: `(upstream, fork, description)`.
const UNITS: &[(&str, &str, &str)] = &[
    ("COIN", "UNIT", "identifier COIN to UNIT"),
    ("CENT", "EEES", "identifier CENT to EEES"),
];

/// Runs the fixed sequence of rebranding steps against a working tree,
/// checkpointing the tree with a descriptive commit after each step.
///
/// The order is not interchangeable: executable renames and path moves must
/// precede the content substitutions that assume the new paths, and the
/// compound identifier pass inside the general rename must precede the
/// single-word pass.
pub struct Fork {
    processor: Processor,
    fork_branch: Option<String>,
    upstream_branch: Option<String>,
}

impl Fork {
    /// Builds the pipeline for `root`. When a fork branch is given, its
    /// `.clonemill` document is merged into the built-in catalog.
    pub fn new(
        root: impl Into<PathBuf>,
        fork_branch: Option<String>,
        upstream_branch: Option<String>,
    ) -> Result<Self> {
        let root = root.into();
        let mut config = ForkConfig::default();
        if let Some(branch) = &fork_branch {
            config.merge_from_branch(&root, branch)?;
        }
        Ok(Self {
            processor: Processor::new(root, config),
            fork_branch,
            upstream_branch,
        })
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Runs every step in order.
    pub fn run(&self) -> Result<()> {
        self.remove_files()?;
        self.replace_ports()?;
        self.replace_testnet3()?;
        self.replace_currency_symbol()?;
        self.adapt_executables()?;
        self.move_paths()?;
        self.adapt_urls()?;
        self.replace_bitcoin_core_identifiers()?;
        self.replace_bitcoin_identifiers()?;
        self.adjust_code()?;
        self.replace_unit_names()?;
        self.remove_trailing_whitespace()?;
        if self.fork_branch.is_some() {
            self.appropriate_files()?;
        }
        Ok(())
    }

    /// Applies the identifier substitution passes to one file, in pipeline
    /// order. No commit is made.
    pub fn process_file(&self, path: &Path) -> Result<()> {
        self.processor.substitute_bitcoin_core_identifiers_in_file(path)?;
        self.processor.substitute_bitcoin_identifiers_in_file(path)
    }

    /// Prints the upstream changes of appropriated and removed files since
    /// the merge base of the two branches.
    pub fn show_upstream_diff(&self) -> Result<()> {
        let (Some(fork_branch), Some(upstream_branch)) =
            (&self.fork_branch, &self.upstream_branch)
        else {
            return Err(Error::Config(
                "both branch names are required to show the upstream diff".to_string(),
            ));
        };
        let root = self.processor.root();
        let merge_base = git::merge_base(root, upstream_branch, fork_branch)?;
        let range = format!("{merge_base}..{upstream_branch}");
        println!("Changes of appropriated files since last merge:");
        for file in &self.processor.config().appropriated_files {
            git::log_patch(root, &range, file)?;
        }
        println!("Changes of removed files since last merge:");
        for file in &self.processor.config().removed_files {
            git::log_patch(root, &range, file)?;
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        if git::commit_all(self.processor.root(), message)? {
            let summary = message.lines().next().unwrap_or(message);
            println!("Committed: {summary}");
        }
        Ok(())
    }

    fn remove_files(&self) -> Result<()> {
        self.processor.remove_files()?;
        self.commit("Remove files")
    }

    fn replace_ports(&self) -> Result<()> {
        let mut message = String::from("Change ports\n\n");
        for &(upstream, fork, description) in PORTS {
            self.processor.replace_recursively(upstream, fork)?;
            message.push_str(&format!("* Change {description} {upstream} into {fork}\n"));
        }
        self.commit(&message)
    }

    fn replace_testnet3(&self) -> Result<()> {
        self.processor.replace_recursively("testnet3", "testnet")?;
        self.commit("Change testnet directory name testnet3 to testnet")
    }

    fn replace_currency_symbol(&self) -> Result<()> {
        let mut message = String::from("Change currency symbol\n\n");

        // 'c', 'm' and 'u' stay eligible before the token so metric
        // prefixes (cBTC, mBTC, uBTC) are renamed along with it.
        self.processor
            .replace_recursively_with("BTC", "UTE", "$|[^a-bd-ln-tv-zA-Z]", IDENT_BOUNDARY)?;
        message.push_str("* Change currency token BTC to UTE\n");

        self.processor.replace_in_file("src/test/fs_tests.cpp", "₿", "U⋮")?;
        self.processor.replace_in_file("test/functional/test_runner.py", "₿", "U⋮")?;
        message.push_str("* Change unicode symbol\n");

        self.commit(&message)
    }

    fn adapt_executables(&self) -> Result<()> {
        let p = &self.processor;

        p.replace_in_file(
            "test/functional/test_framework/test_framework.py",
            "options.bitcoind",
            "options.unit_e",
        )?;
        p.apply_recursively(Discovery::AllFiles, |path| {
            p.git_move_file(path, "bitcoind", "unit-e")
        })?;
        p.replace_recursively_with("bitcoind", "unit_e", "_", IDENT_BOUNDARY)?;
        p.replace_recursively_with("bitcoind", "unit_e", IDENT_BOUNDARY, "[_=]")?;
        p.replace_recursively("bitcoind", "unit-e")?;
        p.replace_recursively("BITCOIND", "UNIT_E")?;
        p.replace_recursively("bitcoinds", "unit-e daemons")?;

        p.replace_in_file(
            "test/functional/test_framework/test_framework.py",
            "options.bitcoincli",
            "options.unit_e_cli",
        )?;
        p.apply_recursively(Discovery::AllFiles, |path| {
            p.git_move_file(path, "bitcoin-cli", "unit-e-cli")
        })?;
        p.git_move_file(
            Path::new("test/functional/interface_bitcoin_cli.py"),
            "bitcoin_cli",
            "unit_e_cli",
        )?;
        p.replace_recursively("bitcoin-cli", "unit-e-cli")?;
        p.replace_recursively("bitcoin_cli", "unit_e_cli")?;
        p.replace_recursively("BITCOINCLI", "UNIT_E_CLI")?;

        p.apply_recursively(Discovery::AllFiles, |path| {
            p.git_move_file(path, "bitcoin-tx", "unit-e-tx")
        })?;
        p.replace_recursively("bitcoin-tx", "unit-e-tx")?;
        p.replace_recursively("bitcoin_tx", "unit_e_tx")?;
        p.replace_recursively("BITCOINTX", "UNIT_E_TX")?;

        p.replace_recursively("bitcoin.conf", "unit-e.conf")?;

        self.commit("Adapt names of executables")
    }

    fn move_paths(&self) -> Result<()> {
        let p = &self.processor;
        p.apply_recursively(Discovery::AllFiles, |path| {
            p.git_move_file(path, "bitcoin", "unite")
        })?;
        self.commit("Move paths containing \"bitcoin\" to respective \"unite\" paths")
    }

    fn adapt_urls(&self) -> Result<()> {
        let p = &self.processor;
        // home page
        p.replace_recursively("www.bitcoin.org", "unit-e.io")?;
        // git instructions
        p.replace_in_file("contrib/devtools/README.md", "bitcoin/bitcoin", "dtr-org/unit-e")?;
        // links to p2p message documentation
        p.replace_in_file_regex(
            "src/protocol.h",
            r"https://bitcoin\.org/en/developer-reference#(\w+)",
            "https://docs.unit-e.io/reference/p2p/$1.html",
        )?;
        self.commit("Adapt URLs")
    }

    fn replace_bitcoin_core_identifiers(&self) -> Result<()> {
        let p = &self.processor;
        // Identifier in copyright statement
        p.replace_in_file("src/util.cpp", ".find(\"Bitcoin Core\")", ".find(\"Unit-e\")")?;
        p.replace_in_file(
            "src/util.cpp",
            "strPrefix + \"The Bitcoin Core developers\";",
            "strPrefix + \"The Unit-e developers\";",
        )?;
        p.replace_in_file(
            "configure.ac",
            "COPYRIGHT_HOLDERS_SUBSTITUTION,[[Bitcoin Core]])",
            "COPYRIGHT_HOLDERS_SUBSTITUTION,[[Unit-e]])",
        )?;
        // all other cases
        p.apply_recursively(Discovery::ContainingAnyCase("bitcoin core"), |path| {
            p.substitute_bitcoin_core_identifiers_in_file(path)
        })?;
        self.commit("Rename occurrences of \"bitcoin core\" to \"unit-e\"")
    }

    fn replace_bitcoin_identifiers(&self) -> Result<()> {
        let p = &self.processor;
        // special case of daemon name at beginning of the sentence
        p.replace_in_file("doc/zmq.md", "Bitcoind appends", "The unit-e daemon appends")?;
        // it's a unit, not a name, in this file
        p.replace_in_file("test/functional/wallet_labels.py", "50 Bitcoins", "50 UTEs")?;
        // default datadir on Unix
        p.replace_recursively_with("/.bitcoin", "/.unit-e", ANY, IDENT_BOUNDARY)?;
        // all other cases
        p.apply_recursively(Discovery::ContainingAnyCase("bitcoin"), |path| {
            p.substitute_bitcoin_identifiers_in_file(path)
        })?;
        self.commit("Rename occurrences of \"bitcoin\" to \"unit-e\"")
    }

    fn adjust_code(&self) -> Result<()> {
        let p = &self.processor;
        p.apply_recursively(Discovery::AllFiles, |path| p.apply_file_substitutions(path))?;
        self.commit("Apply adjustments to tests and constants for name changes")
    }

    fn replace_unit_names(&self) -> Result<()> {
        let mut message = String::from("Change unit identifier\n\n");
        for &(upstream, fork, description) in UNITS {
            self.processor.replace_recursively(upstream, fork)?;
            message.push_str(&format!("* Change {description}\n"));
        }
        self.commit(&message)
    }

    fn remove_trailing_whitespace(&self) -> Result<()> {
        self.processor.remove_trailing_whitespace("*.md")?;
        self.processor.remove_trailing_whitespace("*.py")?;
        self.commit("Remove trailing whitespace")
    }

    fn appropriate_files(&self) -> Result<()> {
        let Some(branch) = &self.fork_branch else {
            return Ok(());
        };
        let source_revision = self.processor.appropriate_files(branch)?;
        self.commit(&format!(
            "Appropriate files from {branch}\n\nSource revision: {source_revision}\n"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(root: &Path, args: &[&str]) {
        let status = Command::new("git").args(args).current_dir(root).status().unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn write(root: &Path, path: &str, contents: &str) {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, contents).unwrap();
    }

    fn read(root: &Path, path: &str) -> String {
        fs::read_to_string(root.join(path)).unwrap()
    }

    fn commit_count(root: &Path) -> usize {
        let output = Command::new("git")
            .args(["rev-list", "--count", "HEAD"])
            .current_dir(root)
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
    }

    fn seed_tree(root: &Path) {
        git(root, &["init", "-q"]);
        git(root, &["config", "user.email", "clonemill@example.com"]);
        git(root, &["config", "user.name", "clonemill tests"]);
        write(
            root,
            "doc/setup.md",
            "Connect to port 8333 (rpc 8332).\n\
             git clone https://github.com/bitcoin/bitcoin.git\n\
             Download depends from https://bitcoincore.org/depends-sources\n",
        );
        write(
            root,
            "contrib/bitcoind.bash-completion",
            "# bitcoind(1) completion\ncomplete -F _bitcoind bitcoind\n",
        );
        write(root, "src/amount.h", "static const CAmount COIN = 100000000;\n");
        write(root, "test/functional/example_test.py", "one \ntwo  two  \nno\n");
        write(root, ".github/ISSUE_TEMPLATE.md", "upstream template\n");
        git(root, &["add", "."]);
        git(root, &["commit", "-qm", "import upstream"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pipeline_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        seed_tree(root);

        let fork = Fork::new(root, None, None).unwrap();
        fork.run().unwrap();

        assert_eq!(
            read(root, "doc/setup.md"),
            "Connect to port 7182 (rpc 7181).\n\
             git clone https://github.com/unite/unite.git\n\
             Download depends from https://bitcoincore.org/depends-sources\n"
        );
        // Renamed path, renamed contents.
        assert_eq!(
            read(root, "contrib/unit-e.bash-completion"),
            "# unit-e(1) completion\ncomplete -F _unit_e unit-e\n"
        );
        assert_eq!(read(root, "src/amount.h"), "static const CAmount UNIT = 100000000;\n");
        assert_eq!(
            read(root, "test/functional/example_test.py"),
            "one\ntwo  two\nno\n"
        );
        assert!(!root.join(".github/ISSUE_TEMPLATE.md").exists());

        let commits_after_first_run = commit_count(root);
        assert!(commits_after_first_run > 1);

        // A second run must change nothing and commit nothing.
        let fork = Fork::new(root, None, None).unwrap();
        fork.run().unwrap();
        assert_eq!(commit_count(root), commits_after_first_run);
    }

    #[test]
    fn test_process_file_applies_identifier_passes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "doc/about.md", "Bitcoin Core is built on Bitcoin.\n");
        let fork = Fork::new(root, None, None).unwrap();
        fork.process_file(Path::new("doc/about.md")).unwrap();
        assert_eq!(read(root, "doc/about.md"), "unit-e is built on Unit-e.\n");
    }

    #[test]
    fn test_branch_config_feeds_removed_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        git(root, &["init", "-q"]);
        git(root, &["config", "user.email", "clonemill@example.com"]);
        git(root, &["config", "user.name", "clonemill tests"]);
        write(root, ".clonemill", "removed_files:\n  - doc/legacy.md\n");
        write(root, "doc/legacy.md", "old\n");
        git(root, &["add", "."]);
        git(root, &["commit", "-qm", "init"]);

        let fork = Fork::new(root, Some("HEAD".to_string()), None).unwrap();
        assert!(fork
            .processor()
            .config()
            .removed_files
            .contains(&"doc/legacy.md".to_string()));
    }
}
