use crate::config::ForkConfig;
use crate::errors::{Error, Result};
use crate::git;
use crate::identifiers;
use crate::substitute::{IDENT_BOUNDARY, Substitution};
use ignore::WalkBuilder;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

/// How [`Processor::apply_recursively`] discovers candidate files.
pub enum Discovery<'a> {
    /// Every regular file in the working tree.
    AllFiles,
    /// Tracked files containing the given literal, via `git grep -l`.
    Containing(&'a str),
    /// Case-insensitive variant, via `git grep -il`.
    ContainingAnyCase(&'a str),
}

/// Applies transformations across a working tree.
///
/// A `Processor` owns the catalog configuration and an explicit tree root;
/// every path it hands out or takes in is relative to that root. Files are
/// read whole, rewritten in memory, and overwritten in place.
pub struct Processor {
    root: PathBuf,
    config: ForkConfig,
}

impl Processor {
    pub fn new(root: impl Into<PathBuf>, config: ForkConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ForkConfig {
        &self.config
    }

    /// Runs `transform` on every discovered file that is neither under a
    /// hidden directory nor under a configured exclusion prefix.
    pub fn apply_recursively<F>(&self, discovery: Discovery, mut transform: F) -> Result<()>
    where
        F: FnMut(&Path) -> Result<()>,
    {
        for path in self.discover(&discovery)? {
            if is_hidden_path(&path) || self.is_excluded(&path) {
                continue;
            }
            transform(&path)?;
        }
        Ok(())
    }

    fn discover(&self, discovery: &Discovery) -> Result<Vec<PathBuf>> {
        match discovery {
            Discovery::AllFiles => self.walk_files(),
            Discovery::Containing(needle) => git::grep_files(&self.root, needle, false),
            Discovery::ContainingAnyCase(needle) => git::grep_files(&self.root, needle, true),
        }
    }

    /// Every regular file under the root, as sorted root-relative paths.
    /// Hidden directories are pruned during traversal; hidden files at any
    /// level are still listed.
    fn walk_files(&self) -> Result<Vec<PathBuf>> {
        let mut walker = WalkBuilder::new(&self.root);
        walker.hidden(false).filter_entry(|entry| {
            // The root itself may live under a dotted directory.
            if entry.depth() == 0 {
                return true;
            }
            let hidden_dir = entry.file_type().is_some_and(|t| t.is_dir())
                && is_hidden_segment(&entry.file_name().to_string_lossy());
            !hidden_dir
        });
        let mut files = Vec::new();
        for entry in walker.build() {
            let entry = entry?;
            if entry.file_type().is_some_and(|t| t.is_file()) {
                let relative = entry
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                files.push(relative);
            }
        }
        files.sort();
        Ok(files)
    }

    /// True when the normalized path starts with a configured exclusion
    /// prefix.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        self.config
            .excluded_paths
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()))
    }

    /// Substitutes `needle` by `replacement` as a whole identifier in every
    /// file containing it.
    pub fn replace_recursively(&self, needle: &str, replacement: &str) -> Result<()> {
        self.replace_recursively_with(needle, replacement, IDENT_BOUNDARY, IDENT_BOUNDARY)
    }

    /// Like [`Self::replace_recursively`], with explicit boundary patterns.
    pub fn replace_recursively_with(
        &self,
        needle: &str,
        replacement: &str,
        match_before: &str,
        match_after: &str,
    ) -> Result<()> {
        let substitution = Substitution::with_boundaries(needle, match_before, match_after)?;
        self.apply_recursively(Discovery::Containing(needle), |path| {
            self.rewrite_file(path, |contents| substitution.replace(contents, replacement))
        })
    }

    /// Point fix on one named file. A missing file logs a warning and is
    /// skipped; the tree's shape varies across upstream versions.
    pub fn replace_in_file(&self, path: &str, needle: &str, replacement: &str) -> Result<()> {
        self.replace_in_file_with(path, needle, replacement, IDENT_BOUNDARY, IDENT_BOUNDARY)
    }

    /// Like [`Self::replace_in_file`], with explicit boundary patterns.
    pub fn replace_in_file_with(
        &self,
        path: &str,
        needle: &str,
        replacement: &str,
        match_before: &str,
        match_after: &str,
    ) -> Result<()> {
        if !self.root.join(path).exists() {
            eprintln!(
                "WARNING: File '{path}' does not exist for replacement of '{needle}' by '{replacement}'"
            );
            return Ok(());
        }
        let substitution = Substitution::with_boundaries(needle, match_before, match_after)?;
        self.rewrite_file(Path::new(path), |contents| {
            substitution.replace(contents, replacement)
        })
    }

    /// Point fix with a real regex, for rewrites that need capture groups.
    /// Missing files warn and are skipped, like [`Self::replace_in_file`].
    pub fn replace_in_file_regex(&self, path: &str, pattern: &str, replacement: &str) -> Result<()> {
        if !self.root.join(path).exists() {
            eprintln!(
                "WARNING: File '{path}' does not exist for replacement of '{pattern}' by '{replacement}'"
            );
            return Ok(());
        }
        let regex = Regex::new(pattern)?;
        self.rewrite_file(Path::new(path), |contents| {
            Ok(regex.replace_all(contents, replacement).into_owned())
        })
    }

    /// Rewrites every spelling of the project name in one file.
    pub fn substitute_bitcoin_identifiers_in_file(&self, path: &Path) -> Result<()> {
        self.rewrite_file(path, |contents| {
            identifiers::substitute_bitcoin_identifiers(contents, &self.config.substitution_blacklist)
        })
    }

    /// Rewrites every spelling of "bitcoin core" in one file.
    pub fn substitute_bitcoin_core_identifiers_in_file(&self, path: &Path) -> Result<()> {
        self.rewrite_file(path, |contents| {
            identifiers::substitute_bitcoin_core_identifiers(
                contents,
                &self.config.substitution_blacklist,
            )
        })
    }

    /// Applies the per-basename literal substitution table to `path`, if
    /// its basename has an entry.
    pub fn apply_file_substitutions(&self, path: &Path) -> Result<()> {
        let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(());
        };
        let Some(replacements) = self.config.file_substitutions.get(basename) else {
            return Ok(());
        };
        self.rewrite_file(path, |contents| {
            let mut contents = contents.to_string();
            for (needle, replacement) in replacements {
                contents = contents.replace(needle.as_str(), replacement.as_str());
            }
            Ok(contents)
        })
    }

    /// Renames `path` with `git mv` when the needle occurs in the path
    /// string, creating intermediate directories. A failed move is fatal;
    /// a missing source file warns and is skipped (point-fix moves name
    /// files that not every upstream version has).
    pub fn git_move_file(&self, path: &Path, needle: &str, replacement: &str) -> Result<()> {
        let source = path.to_string_lossy();
        let target = source.replace(needle, replacement);
        if target == source {
            return Ok(());
        }
        if !self.root.join(path).exists() {
            eprintln!("WARNING: File '{source}' does not exist for move to '{target}'");
            return Ok(());
        }
        let target_path = PathBuf::from(&target);
        if let Some(parent) = target_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(self.root.join(parent))?;
            }
        }
        git::mv(&self.root, Path::new(source.as_ref()), &target_path)
    }

    /// Strips trailing whitespace from every file matching `file_pattern`,
    /// using the platform stream editor (GNU sed semantics are required, so
    /// macOS uses `gsed`). Unrecognized platforms fail fast.
    pub fn remove_trailing_whitespace(&self, file_pattern: &str) -> Result<()> {
        let sed = match std::env::consts::OS {
            "linux" => "sed",
            "macos" => "gsed",
            other => return Err(Error::UnsupportedPlatform(other.to_string())),
        };
        let args = [
            ".",
            "-type",
            "f",
            "-name",
            file_pattern,
            "-exec",
            sed,
            "--in-place",
            r"s/[[:space:]]\+$//",
            "{}",
            "+",
        ];
        let status = Command::new("find").args(args).current_dir(&self.root).status()?;
        if !status.success() {
            return Err(Error::Subprocess {
                command: format!("find -name {file_pattern} -exec {sed}"),
                status,
            });
        }
        Ok(())
    }

    /// Checks out every appropriated file from `branch` and returns the
    /// revision id the branch resolves to.
    pub fn appropriate_files(&self, branch: &str) -> Result<String> {
        for file in &self.config.appropriated_files {
            git::checkout_file(&self.root, branch, file)?;
        }
        git::rev_parse(&self.root, branch)
    }

    /// Removes every configured file that exists in this tree revision.
    pub fn remove_files(&self) -> Result<()> {
        for file in &self.config.removed_files {
            if self.root.join(file).exists() {
                git::rm(&self.root, file)?;
            }
        }
        Ok(())
    }

    fn rewrite_file<F>(&self, path: &Path, transform: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let full = self.root.join(path);
        let contents = fs::read_to_string(&full)?;
        let rewritten = transform(&contents)?;
        if rewritten != contents {
            fs::write(&full, rewritten)?;
        }
        Ok(())
    }
}

/// True when any directory segment of `path` is longer than one character
/// and starts with `.`. The basename itself is not considered: hidden files
/// are processed, hidden directories are not.
pub fn is_hidden_path(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    parent
        .components()
        .any(|c| is_hidden_segment(&c.as_os_str().to_string_lossy()))
}

fn is_hidden_segment(segment: &str) -> bool {
    segment.len() > 1 && segment.starts_with('.')
}

fn normalize(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn processor(root: &Path) -> Processor {
        Processor::new(root, ForkConfig::default())
    }

    fn init_repo(root: &Path) {
        let git = |args: &[&str]| {
            let status = Command::new("git").args(args).current_dir(root).status().unwrap();
            assert!(status.success(), "git {args:?} failed");
        };
        git(&["init", "-q"]);
        git(&["config", "user.email", "clonemill@example.com"]);
        git(&["config", "user.name", "clonemill tests"]);
    }

    fn add_all(root: &Path) {
        let status = Command::new("git").args(["add", "."]).current_dir(root).status().unwrap();
        assert!(status.success());
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

    #[test]
    fn test_hidden_path_rule_applies_to_directories_only() {
        assert!(is_hidden_path(Path::new(".github/workflows/ci.yml")));
        assert!(is_hidden_path(Path::new("src/.cache/data")));
        assert!(!is_hidden_path(Path::new(".travis.yml")));
        assert!(!is_hidden_path(Path::new("src/init.cpp")));
    }

    #[test]
    fn test_exclusion_prefixes_after_normalizing() {
        let dir = TempDir::new().unwrap();
        let p = processor(dir.path());
        assert!(p.is_excluded(Path::new("src/secp256k1/README")));
        assert!(p.is_excluded(Path::new("./src/leveldb/db/db_impl.cc")));
        assert!(!p.is_excluded(Path::new("src/wallet/wallet.cpp")));
    }

    #[test]
    fn test_replace_in_file_missing_target_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let p = processor(dir.path());
        p.replace_in_file("doc/none.md", "bitcoin", "unite").unwrap();
        assert!(!dir.path().join("doc/none.md").exists());
    }

    #[test]
    fn test_replace_in_file_respects_boundaries() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "doc/a.md", "run bitcoind or bitcoin\n");
        let p = processor(dir.path());
        p.replace_in_file("doc/a.md", "bitcoin", "unite").unwrap();
        assert_eq!(read(dir.path(), "doc/a.md"), "run bitcoind or unite\n");
    }

    #[test]
    fn test_replace_in_file_regex_rewrites_captures() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/protocol.h",
            "// https://bitcoin.org/en/developer-reference#getheaders\n",
        );
        let p = processor(dir.path());
        p.replace_in_file_regex(
            "src/protocol.h",
            r"https://bitcoin\.org/en/developer-reference#(\w+)",
            "https://docs.unit-e.io/reference/p2p/$1.html",
        )
        .unwrap();
        assert_eq!(
            read(dir.path(), "src/protocol.h"),
            "// https://docs.unit-e.io/reference/p2p/getheaders.html\n"
        );
    }

    #[test]
    fn test_apply_file_substitutions_keys_on_basename() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/clientversion.cpp",
            "const std::string CLIENT_NAME(\"Satoshi\");\n",
        );
        write(dir.path(), "src/other.cpp", "const std::string CLIENT_NAME(\"Satoshi\");\n");
        let p = processor(dir.path());
        p.apply_file_substitutions(Path::new("src/clientversion.cpp")).unwrap();
        p.apply_file_substitutions(Path::new("src/other.cpp")).unwrap();
        assert_eq!(
            read(dir.path(), "src/clientversion.cpp"),
            "const std::string CLIENT_NAME(\"Feuerland\");\n"
        );
        assert_eq!(
            read(dir.path(), "src/other.cpp"),
            "const std::string CLIENT_NAME(\"Satoshi\");\n"
        );
    }

    #[test]
    fn test_replace_recursively_skips_hidden_and_excluded() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        init_repo(root);
        write(root, "doc/ports.md", "rpc port 8332\n");
        write(root, "src/secp256k1/notes.md", "port 8332\n");
        write(root, ".github/ci.yml", "port: 8332\n");
        add_all(root);

        let p = processor(root);
        p.replace_recursively("8332", "7181").unwrap();

        assert_eq!(read(root, "doc/ports.md"), "rpc port 7181\n");
        assert_eq!(read(root, "src/secp256k1/notes.md"), "port 8332\n");
        assert_eq!(read(root, ".github/ci.yml"), "port: 8332\n");
    }

    #[test]
    fn test_replace_recursively_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        init_repo(root);
        write(root, "doc/ports.md", "rpc port 8332\n");
        add_all(root);

        let p = processor(root);
        p.replace_recursively("8332", "7181").unwrap();
        let once = read(root, "doc/ports.md");
        p.replace_recursively("8332", "7181").unwrap();
        assert_eq!(read(root, "doc/ports.md"), once);
    }

    #[test]
    fn test_git_move_file_renames_and_creates_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        init_repo(root);
        write(root, "contrib/bitcoin-cli.bash-completion", "completion\n");
        add_all(root);

        let p = processor(root);
        p.git_move_file(
            Path::new("contrib/bitcoin-cli.bash-completion"),
            "bitcoin-cli",
            "unite-cli",
        )
        .unwrap();

        assert!(root.join("contrib/unite-cli.bash-completion").exists());
        assert!(!root.join("contrib/bitcoin-cli.bash-completion").exists());
    }

    #[test]
    fn test_git_move_file_missing_source_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        init_repo(root);
        let p = processor(root);
        p.git_move_file(Path::new("test/interface_bitcoin_cli.py"), "bitcoin_cli", "unit_e_cli")
            .unwrap();
    }

    #[test]
    fn test_walk_files_prunes_hidden_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "doc/a.md", "a\n");
        write(root, ".github/ci.yml", "b\n");
        write(root, ".travis.yml", "c\n");

        let p = processor(root);
        let files = p.walk_files().unwrap();
        assert!(files.contains(&PathBuf::from("doc/a.md")));
        assert!(files.contains(&PathBuf::from(".travis.yml")));
        assert!(!files.iter().any(|f| f.starts_with(".github")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_remove_trailing_whitespace() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "test.py", "one \ntwo  two  \nno\n");
        write(root, "keep.md", "one \n");

        let p = processor(root);
        p.remove_trailing_whitespace("*.py").unwrap();
        assert_eq!(read(root, "test.py"), "one\ntwo  two\nno\n");
        // Only the named pattern is touched.
        assert_eq!(read(root, "keep.md"), "one \n");

        // Stable under re-application.
        p.remove_trailing_whitespace("*.py").unwrap();
        assert_eq!(read(root, "test.py"), "one\ntwo  two\nno\n");
    }
}
