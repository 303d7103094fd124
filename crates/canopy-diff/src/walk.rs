//! Sorted traversal shared by the diff engine, the renderer and the applier.

use std::cmp::Ordering;

use canopy_types::DirEntry;

use crate::delta::Delta;

/// Anything listed under a unique, sortable name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for DirEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Delta {
    fn name(&self) -> &str {
        &self.name
    }
}

/// One name of a merged listing with the item from each side, if present.
#[derive(Debug, PartialEq, Eq)]
pub struct Paired<L, R> {
    pub name: String,
    pub left: Option<L>,
    pub right: Option<R>,
}

/// Merge two listings sorted by name into their union, in ascending order.
///
/// Both inputs must already be sorted with unique names, which is what
/// [`TreeReader::list`](canopy_tree::TreeReader::list) guarantees.
pub fn merge_sorted<L, R>(
    left: impl IntoIterator<Item = L>,
    right: impl IntoIterator<Item = R>,
) -> Vec<Paired<L, R>>
where
    L: Named,
    R: Named,
{
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    let mut out = Vec::new();

    loop {
        let order = match (left.peek(), right.peek()) {
            (None, None) => break,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(l), Some(r)) => l.name().cmp(r.name()),
        };
        let (l, r) = match order {
            Ordering::Less => (left.next(), None),
            Ordering::Greater => (None, right.next()),
            Ordering::Equal => (left.next(), right.next()),
        };
        let name = l
            .as_ref()
            .map(|l| l.name())
            .or_else(|| r.as_ref().map(|r| r.name()))
            .unwrap_or_default()
            .to_string();
        out.push(Paired {
            name,
            left: l,
            right: r,
        });
    }
    out
}

/// Visit `items` in order, telling `visit` whether each is the last one.
/// The first error stops the walk.
pub fn for_each_last<I, E>(
    items: I,
    mut visit: impl FnMut(I::Item, bool) -> Result<(), E>,
) -> Result<(), E>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
{
    let items = items.into_iter();
    let count = items.len();
    for (index, item) in items.enumerate() {
        visit(item, index + 1 == count)?;
    }
    Ok(())
}

/// Visit the recorded children of `delta` in ascending name order.
///
/// `visit` receives each child and whether it is the last one.
pub fn for_each_child<E>(
    delta: &Delta,
    visit: impl FnMut(&Delta, bool) -> Result<(), E>,
) -> Result<(), E> {
    for_each_last(delta.children.values(), visit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::DeltaKind;
    use std::collections::BTreeMap;

    fn dirs(names: &[&str]) -> Vec<DirEntry> {
        names.iter().map(|n| DirEntry::directory(*n)).collect()
    }

    #[test]
    fn union_in_order() {
        let merged = merge_sorted(dirs(&["a", "c", "d"]), dirs(&["b", "c"]));
        let shape: Vec<_> = merged
            .iter()
            .map(|p| (p.name.as_str(), p.left.is_some(), p.right.is_some()))
            .collect();
        assert_eq!(
            shape,
            [
                ("a", true, false),
                ("b", false, true),
                ("c", true, true),
                ("d", true, false),
            ]
        );
    }

    #[test]
    fn empty_sides() {
        assert!(merge_sorted(dirs(&[]), dirs(&[])).is_empty());
        let merged = merge_sorted(dirs(&[]), dirs(&["x"]));
        assert_eq!(merged.len(), 1);
        assert!(merged[0].left.is_none());
    }

    #[test]
    fn visits_children_in_order_and_stops_on_error() {
        let delta = Delta::rollup(
            ".",
            BTreeMap::from([
                ("b".into(), Delta::file(DeltaKind::Added, "b")),
                ("a".into(), Delta::file(DeltaKind::Added, "a")),
                ("c".into(), Delta::file(DeltaKind::Added, "c")),
            ]),
        );

        let mut seen = Vec::new();
        for_each_child::<()>(&delta, |child, last| {
            seen.push((child.name.clone(), last));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            [("a".into(), false), ("b".into(), false), ("c".into(), true)]
        );

        let mut visited = 0;
        let result = for_each_child(&delta, |child, _| {
            visited += 1;
            if child.name == "b" {
                Err("stop")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(visited, 2);
    }

    #[test]
    fn last_flag_on_plain_items() {
        let mut seen = Vec::new();
        for_each_last::<_, ()>(["x", "y"], |item, last| {
            seen.push((item, last));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, [("x", false), ("y", true)]);
        assert_eq!(for_each_last(Vec::<u8>::new(), |_, _| Err("never")), Ok(()));
    }
}
