use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Read the category list: one name per line, `#` starts a comment.
pub fn read_categories(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read categories file {:?}", path))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

pub fn links_path(links_dir: &Path, category: &str) -> PathBuf {
    links_dir.join(format!("{}-product-links.txt", category))
}

/// Read the product URLs listed for one category.
pub fn read_links(links_dir: &Path, category: &str) -> Result<Vec<String>> {
    let path = links_path(links_dir, category);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read links file {:?}", path))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Store collection for a category: "Men's Jackets" -> "men_s_jackets".
pub fn collection_name(category: &str) -> String {
    let lower = category.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}
