//! Shared plumbing for the `find-cycles` and `evaluate` binaries.
//!
//! Both tools accept free-form `key=value` words anywhere among their flags.
//! Only `if=<path>` (the rule tree to load) and `of=<path>` (where to write
//! one) are understood; other words are ignored.

use std::path::{Path, PathBuf};
use tracing::info;
use whisker_dispatch_pooled::{ThreadPoolConfig, ThreadPoolError};
use whisker_types::{TreeError, WhiskerTree};

/// Separate `key=value` words from everything clap should parse.
///
/// The first item (the program name) always stays with the flags. A word
/// counts as a keyword if it contains `=` and does not start with `-`, so
/// `--seed=7` is still a flag.
pub fn split_keyword_args<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut flags: Vec<String> = args.next().into_iter().collect();
    let mut keywords = Vec::new();
    for arg in args {
        if !arg.starts_with('-') && arg.contains('=') {
            keywords.push(arg);
        } else {
            flags.push(arg);
        }
    }
    (flags, keywords)
}

/// The value of the last `<key>=<value>` word in `words`, if any.
pub fn keyword_value<'a, I>(words: I, key: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    words
        .into_iter()
        .filter_map(|word| word.split_once('='))
        .filter(|(k, _)| *k == key)
        .map(|(_, value)| value)
        .last()
}

/// The rule-tree path named by `if=<path>`.
pub fn input_path<'a, I>(words: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a String>,
{
    keyword_value(words, "if").map(PathBuf::from)
}

/// The output path named by `of=<path>`.
pub fn output_path<'a, I>(words: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a String>,
{
    keyword_value(words, "of").map(PathBuf::from)
}

/// Load the rule tree at `path`, or the single-whisker default tree when no
/// path was given.
pub fn load_base_tree(path: Option<&Path>) -> Result<WhiskerTree, TreeError> {
    match path {
        Some(path) => {
            let tree = WhiskerTree::load(path)?;
            info!(path = %path.display(), whiskers = tree.len(), "Using rule tree");
            Ok(tree)
        }
        None => {
            info!("No rule tree given, using the default tree");
            Ok(WhiskerTree::default())
        }
    }
}

/// Worker pool settings for `--threads`; one less than the core count when
/// unset.
pub fn pool_config(threads: Option<usize>) -> Result<ThreadPoolConfig, ThreadPoolError> {
    match threads {
        Some(threads) => ThreadPoolConfig::builder().threads(threads).build(),
        None => Ok(ThreadPoolConfig::auto()),
    }
}
