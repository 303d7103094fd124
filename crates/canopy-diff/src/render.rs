//! Human-readable views of deltas and target directories.
//!
//! ```text
//! ~ .
//! ├── + four.txt
//! └── ~ sub/
//!     ├── ~ one.txt
//!     ├── + three.txt
//!     └── - two.txt
//! ```

use std::convert::Infallible;

use canopy_tree::{TreeReader, TreeResult};
use canopy_types::TreePath;

use crate::delta::{Delta, DeltaKind};
use crate::walk::{for_each_child, for_each_last};

/// Styles one rendered line, e.g. with terminal colours.
pub trait Painter {
    fn paint(&self, kind: &DeltaKind, text: &str) -> String;
}

/// No styling.
#[derive(Clone, Copy, Debug, Default)]
pub struct Plain;

impl Painter for Plain {
    fn paint(&self, _kind: &DeltaKind, text: &str) -> String {
        text.to_string()
    }
}

/// Render `delta` as an indented tree, one line per recorded entry.
pub fn render(delta: &Delta) -> String {
    render_with(delta, &Plain)
}

pub fn render_with(delta: &Delta, painter: &dyn Painter) -> String {
    let mut out = String::new();
    out.push_str(&painter.paint(&delta.kind, &label(delta)));
    out.push('\n');
    render_children(delta, "", painter, &mut out);
    out
}

fn label(delta: &Delta) -> String {
    let slash = if delta.is_dir() && delta.name != "." {
        "/"
    } else {
        ""
    };
    format!("{} {}{}", delta.kind.marker(), delta.name, slash)
}

/// Branch marker for an entry and the indent continuing below it.
fn branch(last: bool) -> (&'static str, &'static str) {
    if last {
        ("└── ", "    ")
    } else {
        ("├── ", "│   ")
    }
}

fn render_children(delta: &Delta, prefix: &str, painter: &dyn Painter, out: &mut String) {
    let walked = for_each_child::<Infallible>(delta, |child, last| {
        let (branch, indent) = branch(last);
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&painter.paint(&child.kind, &label(child)));
        out.push('\n');
        render_children(child, &format!("{prefix}{indent}"), painter, out);
        Ok(())
    });
    match walked {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// Render `delta` as pretty-printed JSON.
pub fn render_json(delta: &Delta) -> serde_json::Result<String> {
    serde_json::to_string_pretty(delta)
}

/// Render the directory at `path` of `reader` as a tree, recursively.
pub fn render_listing(reader: &dyn TreeReader, path: &TreePath) -> TreeResult<String> {
    let mut out = format!("{path}\n");
    listing_level(reader, path, "", &mut out)?;
    Ok(out)
}

fn listing_level(
    reader: &dyn TreeReader,
    dir: &TreePath,
    prefix: &str,
    out: &mut String,
) -> TreeResult<()> {
    for_each_last(reader.list(dir)?, |entry, last| {
        let (branch, indent) = branch(last);
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&entry.name);
        if !entry.is_dir() {
            out.push('\n');
            return Ok(());
        }
        out.push_str("/\n");
        listing_level(reader, &dir.join(&entry.name), &format!("{prefix}{indent}"), out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use canopy_store::InMemoryObjectStore;
    use canopy_tree::{MutationOptions, TargetTree, VersionedTree};

    fn fixture_delta() -> Delta {
        let sub = Delta::directory(
            DeltaKind::Changed,
            "sub",
            BTreeMap::from([
                ("one.txt".into(), Delta::file(DeltaKind::Changed, "one.txt")),
                ("three.txt".into(), Delta::file(DeltaKind::Added, "three.txt")),
                ("two.txt".into(), Delta::file(DeltaKind::Removed, "two.txt")),
            ]),
        );
        Delta::rollup(
            ".",
            BTreeMap::from([
                ("four.txt".into(), Delta::file(DeltaKind::Added, "four.txt")),
                ("sub".into(), sub),
            ]),
        )
    }

    #[test]
    fn renders_tree_with_markers() {
        let expected = "\
~ .
├── + four.txt
└── ~ sub/
    ├── ~ one.txt
    ├── + three.txt
    └── - two.txt
";
        assert_eq!(render(&fixture_delta()), expected);
    }

    #[test]
    fn nested_prefixes_continue_open_branches() {
        let inner = Delta::directory(
            DeltaKind::Added,
            "a",
            BTreeMap::from([("x".into(), Delta::file(DeltaKind::Added, "x"))]),
        );
        let delta = Delta::rollup(
            ".",
            BTreeMap::from([
                ("a".into(), inner),
                ("b".into(), Delta::file(DeltaKind::Removed, "b")),
            ]),
        );
        assert_eq!(render(&delta), "~ .\n├── + a/\n│   └── + x\n└── - b\n");
    }

    #[test]
    fn unchanged_root_renders_alone() {
        assert_eq!(render(&Delta::rollup(".", BTreeMap::new())), "= .\n");
    }

    struct Brackets;

    impl Painter for Brackets {
        fn paint(&self, kind: &DeltaKind, text: &str) -> String {
            format!("[{kind}:{text}]")
        }
    }

    #[test]
    fn painter_styles_each_line() {
        let out = render_with(&fixture_delta(), &Brackets);
        assert!(out.starts_with("[changed:~ .]\n"));
        assert!(out.contains("└── [removed:- two.txt]"));
    }

    #[test]
    fn json_round_trips_through_serde_value() {
        let json = render_json(&fixture_delta()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["children"]["sub"]["children"]["two.txt"]["kind"], "removed");
    }

    #[test]
    fn listing_of_target_directory() {
        let tree = VersionedTree::create(Arc::new(InMemoryObjectStore::new())).unwrap();
        for path in ["public/b/sub/one.txt", "public/b/four.txt", "public/a.txt"] {
            tree.write(&TreePath::parse(path).unwrap(), b"x", MutationOptions::STAGE)
                .unwrap();
        }
        let out = render_listing(&tree, &TreePath::parse("public").unwrap()).unwrap();
        let expected = "\
public
├── a.txt
└── b/
    ├── four.txt
    └── sub/
        └── one.txt
";
        assert_eq!(out, expected);
    }
}
