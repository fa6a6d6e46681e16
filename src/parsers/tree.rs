//! Rebuilds parent/child edges from depth-annotated lines.
//!
//! Used by the text formats that print a dependency tree with indentation
//! (`mvn dependency:tree`, `gradle dependencies`). Records arrive in
//! pre-order with a depth; a record attaches to the nearest shallower record
//! still open, or becomes top-level when there is none.

use crate::model::PackageRecord;

#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    stack: Vec<(usize, PackageRecord)>,
    finished: Vec<(usize, PackageRecord)>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a record at the given depth
    pub(crate) fn push(&mut self, depth: usize, record: PackageRecord) {
        self.close_to(depth);
        self.stack.push((depth, record));
    }

    /// Close every open record at `depth` or deeper
    pub(crate) fn close_to(&mut self, depth: usize) {
        while self.stack.last().is_some_and(|(d, _)| *d >= depth) {
            let Some((d, record)) = self.stack.pop() else {
                break;
            };
            match self.stack.last_mut() {
                Some((_, parent)) => parent.add_dependency(record),
                None => self.finished.push((d, record)),
            }
        }
    }

    /// Close everything and return the top-level records with their depth
    pub(crate) fn finish(mut self) -> Vec<(usize, PackageRecord)> {
        self.close_to(0);
        self.finished
    }
}

/// Length of the tree-drawing prefix (`|`, `+`, `-`, `\`, spaces)
pub(crate) fn tree_prefix_len(line: &str) -> usize {
    line.chars()
        .take_while(|c| matches!(c, '|' | ' ' | '+' | '-' | '\\'))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ecosystem;

    fn rec(name: &str) -> PackageRecord {
        PackageRecord::new(Ecosystem::Maven, name).with_version("1")
    }

    #[test]
    fn test_nesting_and_siblings() {
        let mut builder = TreeBuilder::new();
        builder.push(1, rec("a"));
        builder.push(2, rec("b"));
        builder.push(3, rec("c"));
        builder.push(2, rec("d"));
        builder.push(1, rec("e"));
        let top = builder.finish();

        let names: Vec<&str> = top.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "e"]);
        let a = &top[0].1;
        let children: Vec<&str> = a.dependencies.keys().map(String::as_str).collect();
        assert_eq!(children, vec!["b", "d"]);
        assert_eq!(a.tree_size(), 4);
    }

    #[test]
    fn test_orphan_attaches_to_nearest_ancestor() {
        let mut builder = TreeBuilder::new();
        builder.push(0, rec("root"));
        builder.push(3, rec("deep"));
        let top = builder.finish();
        assert_eq!(top.len(), 1);
        assert!(top[0].1.dependencies.contains_key("deep"));
    }

    #[test]
    fn test_prefix_len() {
        assert_eq!(tree_prefix_len("+- a:b:jar:1:compile"), 3);
        assert_eq!(tree_prefix_len("|  \\- a:b:jar:1:compile"), 6);
        assert_eq!(tree_prefix_len("|    +--- a:b:1"), 10);
        assert_eq!(tree_prefix_len("a:b:jar:1"), 0);
    }
}
