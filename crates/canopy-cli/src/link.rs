//! The link file tying a local directory to its target directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use canopy_types::TreePath;

/// Read the target path the directory `dir` is linked to.
pub fn read(dir: &Path, link_file: &str) -> anyhow::Result<TreePath> {
    let path = dir.join(link_file);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            bail!("{:?} is not a linked directory", dir.display().to_string())
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    TreePath::parse(text.trim()).with_context(|| format!("invalid link in {}", path.display()))
}

/// Link `dir` to `target`. Fails if `dir` is already linked.
pub fn write(dir: &Path, link_file: &str, target: &TreePath) -> anyhow::Result<PathBuf> {
    let path = dir.join(link_file);
    if path.exists() {
        let existing = read(dir, link_file)?;
        bail!("{} is already linked to {existing}", dir.display());
    }
    fs::write(&path, format!("{target}\n"))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
