use crate::collector::DiffCollector;
use crate::path;
use crate::tree::{Node, NodeValue};
use std::borrow::Cow;
use std::collections::HashMap;
use yamldiff_common::{CompareOptions, Difference};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Recursive structural comparison of two document trees.
///
/// Output order is deterministic: for a mapping, matched and added keys
/// follow the new document's key order, then deleted keys follow the old
/// document's key order; sequences are walked by index. Recursion is
/// depth-first. An added or deleted subtree is reported once, at its root.
#[derive(Debug, Clone, Default)]
pub struct NodeComparator {
    options: CompareOptions,
    min_fan_out: Option<usize>,
}

/// One child comparison scheduled by a mapping or sequence node
struct Branch<'a> {
    path: String,
    old: Option<&'a Node>,
    new: Option<&'a Node>,
}

impl NodeComparator {
    pub fn new(options: CompareOptions) -> Self {
        Self {
            options,
            min_fan_out: None,
        }
    }

    /// Compare children on the rayon pool when a node has at least
    /// `min_fan_out` of them. Results are merged in traversal order, so the
    /// output is identical to a sequential run.
    pub fn with_parallelism(mut self, min_fan_out: usize) -> Self {
        self.min_fan_out = Some(min_fan_out.max(1));
        self
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn min_fan_out(&self) -> Option<usize> {
        self.min_fan_out
    }

    /// Compare two optional roots starting from the empty path
    pub fn diff(&self, old: Option<&Node>, new: Option<&Node>) -> DiffCollector {
        let mut collector = DiffCollector::new();
        self.compare(old, new, "", &mut collector);
        collector
    }

    /// Compare `old` against `new` at `path`, appending to `collector`
    pub fn compare(
        &self,
        old: Option<&Node>,
        new: Option<&Node>,
        path: &str,
        collector: &mut DiffCollector,
    ) {
        let (old, new) = match (old, new) {
            (None, None) => return,
            (None, Some(new)) => {
                collector.push(Difference::added(path, new.summary(), new.location()));
                return;
            }
            (Some(old), None) => {
                collector.push(Difference::deleted(path, old.summary(), old.location()));
                return;
            }
            (Some(old), Some(new)) => (old, new),
        };

        let old_target = old.resolve();
        let new_target = new.resolve();

        if old_target.kind() != new_target.kind() {
            collector.push(Difference::type_changed(
                path,
                old_target.kind().label(),
                new_target.kind().label(),
                new.location(),
            ));
            return;
        }

        match (old_target.value(), new_target.value()) {
            (NodeValue::Scalar(old_text), NodeValue::Scalar(new_text)) => {
                if self.normalize_value(old_text) != self.normalize_value(new_text) {
                    collector.push(Difference::modified(
                        path,
                        old_text.as_str(),
                        new_text.as_str(),
                        new.location(),
                    ));
                }
            }
            (NodeValue::Mapping(old_entries), NodeValue::Mapping(new_entries)) => {
                let branches = self.mapping_branches(old_entries, new_entries, path);
                self.run_branches(&branches, collector);
            }
            (NodeValue::Sequence(old_items), NodeValue::Sequence(new_items)) => {
                let len = old_items.len().max(new_items.len());
                let branches: Vec<Branch<'_>> = (0..len)
                    .map(|i| Branch {
                        path: path::append_index(path, i),
                        old: old_items.get(i),
                        new: new_items.get(i),
                    })
                    .collect();
                self.run_branches(&branches, collector);
            }
            // resolve() never yields an alias and the kinds are equal here
            _ => {}
        }
    }

    fn mapping_branches<'a>(
        &self,
        old_entries: &'a [(Node, Node)],
        new_entries: &'a [(Node, Node)],
        path: &str,
    ) -> Vec<Branch<'a>> {
        let mut lookup: HashMap<String, usize> = HashMap::with_capacity(old_entries.len());
        for (index, (key, _)) in old_entries.iter().enumerate() {
            // First occurrence wins when case folding makes keys collide
            lookup
                .entry(self.normalize_key(key.key_text()).into_owned())
                .or_insert(index);
        }

        let mut matched = vec![false; old_entries.len()];
        let mut branches = Vec::with_capacity(new_entries.len() + old_entries.len());

        for (key, value) in new_entries {
            let key_text = key.key_text();
            let normalized = self.normalize_key(key_text.as_str());
            let old_value = lookup
                .remove(&*normalized)
                .map(|index| {
                    matched[index] = true;
                    &old_entries[index].1
                });

            branches.push(Branch {
                path: path::append_key(path, &key_text),
                old: old_value,
                new: Some(value),
            });
        }

        for ((key, value), _) in old_entries.iter().zip(&matched).filter(|(_, m)| !**m) {
            branches.push(Branch {
                path: path::append_key(path, &key.key_text()),
                old: Some(value),
                new: None,
            });
        }

        branches
    }

    fn run_branches(&self, branches: &[Branch<'_>], collector: &mut DiffCollector) {
        #[cfg(feature = "parallel")]
        {
            if let Some(min_fan_out) = self.min_fan_out {
                if branches.len() >= min_fan_out {
                    let partials: Vec<DiffCollector> = branches
                        .par_iter()
                        .map(|branch| {
                            let mut local = DiffCollector::new();
                            self.compare(branch.old, branch.new, &branch.path, &mut local);
                            local
                        })
                        .collect();

                    for partial in partials {
                        collector.merge(partial);
                    }
                    return;
                }
            }
        }

        for branch in branches {
            self.compare(branch.old, branch.new, &branch.path, collector);
        }
    }

    fn normalize_key<'a>(&self, key: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        let key = key.into();
        if self.options.case_insensitive_keys {
            Cow::Owned(key.to_lowercase())
        } else {
            key
        }
    }

    fn normalize_value<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut value = Cow::Borrowed(text);
        if self.options.ignore_whitespace {
            value = Cow::Owned(text.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        if self.options.case_insensitive_values {
            value = Cow::Owned(value.to_lowercase());
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use yamldiff_common::{DiffKind, Location};

    fn doc(source: &str) -> Node {
        parse_document(source, "test.yaml")
            .unwrap()
            .expect("document should not be empty")
    }

    fn diff_with(old: &str, new: &str, options: CompareOptions) -> Vec<Difference> {
        let (old, new) = (doc(old), doc(new));
        NodeComparator::new(options)
            .diff(Some(&old), Some(&new))
            .into_vec()
    }

    fn diff(old: &str, new: &str) -> Vec<Difference> {
        diff_with(old, new, CompareOptions::default())
    }

    const SERVICE: &str = "\
name: web
replicas: 3
image:
  repository: nginx
  tag: \"1.25\"
ports:
  - 80
  - 443
env:
  - name: MODE
    value: production
";

    #[test]
    fn test_identical_documents() {
        assert!(diff(SERVICE, SERVICE).is_empty());
    }

    #[test]
    fn test_both_absent() {
        let comparator = NodeComparator::default();
        assert!(comparator.diff(None, None).is_empty());
    }

    #[test]
    fn test_root_absent_on_one_side() {
        let node = doc("a: 1");
        let comparator = NodeComparator::default();

        let added = comparator.diff(None, Some(&node)).into_vec();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].kind, DiffKind::Added);
        assert_eq!(added[0].path, "");
        assert_eq!(added[0].new_value.as_deref(), Some("{a: 1}"));

        let deleted = comparator.diff(Some(&node), None).into_vec();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].kind, DiffKind::Deleted);
        assert_eq!(deleted[0].old_value.as_deref(), Some("{a: 1}"));
    }

    #[test]
    fn test_mapping_key_added() {
        let diffs = diff("{x: 1}", "{x: 1, y: 2}");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Added);
        assert_eq!(diffs[0].path, "y");
        assert_eq!(diffs[0].new_value.as_deref(), Some("2"));
        assert!(diffs[0].old_value.is_none());
    }

    #[test]
    fn test_added_subtree_is_summarized() {
        let diffs = diff(
            "a: 1\n",
            "a: 1\nb:\n  c:\n    d: 1\n    e: [1, 2]\n  f: x\n",
        );
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Added);
        assert_eq!(diffs[0].path, "b");
        assert_eq!(diffs[0].new_value.as_deref(), Some("{c: {d: 1, e: [1, 2]}, f: x}"));
    }

    #[test]
    fn test_deleted_subtree_is_summarized() {
        let diffs = diff("a: 1\nb:\n  - x\n  - y\n", "a: 1\n");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Deleted);
        assert_eq!(diffs[0].path, "b");
        assert_eq!(diffs[0].old_value.as_deref(), Some("[x, y]"));
        assert!(diffs[0].new_value.is_none());
    }

    #[test]
    fn test_type_change_does_not_recurse() {
        let diffs = diff("x:\n  a: 1\n", "x: scalar\n");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::TypeChanged);
        assert_eq!(diffs[0].path, "x");
        assert_eq!(diffs[0].old_value.as_deref(), Some("mapping"));
        assert_eq!(diffs[0].new_value.as_deref(), Some("scalar"));
    }

    #[test]
    fn test_sequence_to_mapping_type_change() {
        let diffs = diff("x: [1, 2]\n", "x: {a: 1}\n");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].old_value.as_deref(), Some("sequence"));
        assert_eq!(diffs[0].new_value.as_deref(), Some("mapping"));
    }

    #[test]
    fn test_positional_sequence_semantics() {
        let diffs = diff("[a, b, c]", "[c, b, a]");
        assert_eq!(diffs.len(), 2);

        assert_eq!(diffs[0].kind, DiffKind::Modified);
        assert_eq!(diffs[0].path, "[0]");
        assert_eq!(diffs[0].old_value.as_deref(), Some("a"));
        assert_eq!(diffs[0].new_value.as_deref(), Some("c"));

        assert_eq!(diffs[1].kind, DiffKind::Modified);
        assert_eq!(diffs[1].path, "[2]");
        assert_eq!(diffs[1].old_value.as_deref(), Some("c"));
        assert_eq!(diffs[1].new_value.as_deref(), Some("a"));
    }

    #[test]
    fn test_sequence_length_changes() {
        let grown = diff("items: [1, 2]\n", "items: [1, 2, {k: v}]\n");
        assert_eq!(grown.len(), 1);
        assert_eq!(grown[0].kind, DiffKind::Added);
        assert_eq!(grown[0].path, "items[2]");
        assert_eq!(grown[0].new_value.as_deref(), Some("{k: v}"));

        let shrunk = diff("items: [1, 2, 3]\n", "items: [1]\n");
        let paths: Vec<_> = shrunk.iter().map(|d| (d.kind, d.path.as_str())).collect();
        assert_eq!(
            paths,
            vec![(DiffKind::Deleted, "items[1]"), (DiffKind::Deleted, "items[2]")]
        );
    }

    #[test]
    fn test_case_insensitive_values() {
        let options = CompareOptions {
            case_insensitive_values: true,
            ..Default::default()
        };
        assert!(diff_with("x: \"Yes\"", "x: \"yes\"", options).is_empty());

        let diffs = diff("x: \"Yes\"", "x: \"yes\"");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Modified);
        assert_eq!(diffs[0].path, "x");
        assert_eq!(diffs[0].old_value.as_deref(), Some("Yes"));
        assert_eq!(diffs[0].new_value.as_deref(), Some("yes"));
    }

    #[test]
    fn test_case_insensitive_keys_keep_new_casing_in_path() {
        let options = CompareOptions {
            case_insensitive_keys: true,
            ..Default::default()
        };
        let diffs = diff_with("Server:\n  Port: 80\n", "server:\n  port: 8080\n", options);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "server.port");
        assert_eq!(diffs[0].kind, DiffKind::Modified);

        let strict = diff("Server: 1\n", "server: 1\n");
        let kinds: Vec<_> = strict.iter().map(|d| (d.kind, d.path.as_str())).collect();
        assert_eq!(
            kinds,
            vec![(DiffKind::Added, "server"), (DiffKind::Deleted, "Server")]
        );
    }

    #[test]
    fn test_key_case_does_not_fold_values() {
        let options = CompareOptions {
            case_insensitive_keys: true,
            ..Default::default()
        };
        let diffs = diff_with("mode: ON\n", "MODE: on\n", options);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::Modified);
        assert_eq!(diffs[0].path, "MODE");
    }

    #[test]
    fn test_ignore_whitespace() {
        let options = CompareOptions::ignore_whitespace();
        assert!(diff_with(
            "cmd: \"  run   --fast \"\n",
            "cmd: \"run --fast\"\n",
            options
        )
        .is_empty());

        // Whitespace is collapsed, not removed
        let diffs = diff_with("cmd: \"a b\"\n", "cmd: \"ab\"\n", options);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].old_value.as_deref(), Some("a b"));
    }

    #[test]
    fn test_whitespace_and_case_combined() {
        let options = CompareOptions {
            case_insensitive_values: true,
            ignore_whitespace: true,
            ..Default::default()
        };
        assert!(diff_with("v: \" Hello  World\"\n", "v: \"hello world \"\n", options).is_empty());
    }

    #[test]
    fn test_output_order_new_then_deleted_in_old_order() {
        let diffs = diff(
            "d: 1\nkeep: 1\nc: 1\nchanged: old\n",
            "changed: new\nadded_b: 1\nkeep: 1\nadded_a: 1\n",
        );
        let order: Vec<_> = diffs.iter().map(|d| (d.kind, d.path.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (DiffKind::Modified, "changed"),
                (DiffKind::Added, "added_b"),
                (DiffKind::Added, "added_a"),
                (DiffKind::Deleted, "d"),
                (DiffKind::Deleted, "c"),
            ]
        );
    }

    #[test]
    fn test_nested_paths() {
        let old = "a:\n  b:\n    - x\n    - c: 1\n";
        let new = "a:\n  b:\n    - x\n    - c: 2\n";
        let diffs = diff(old, new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "a.b[1].c");
    }

    #[test]
    fn test_dotted_key_path_is_escaped() {
        let diffs = diff("labels:\n  app.io/name: a\n", "labels:\n  app.io/name: b\n");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "labels[\"app.io/name\"]");
    }

    #[test]
    fn test_locations_anchor_the_right_side() {
        let old = "a: 1\nb: 2\n";
        let new = "a: 5\nc: 3\n";
        let diffs = diff(old, new);

        let modified = diffs.iter().find(|d| d.kind == DiffKind::Modified).unwrap();
        assert_eq!(modified.location.line, 1);

        let added = diffs.iter().find(|d| d.kind == DiffKind::Added).unwrap();
        assert_eq!(added.path, "c");
        assert_eq!(added.location.line, 2);

        let deleted = diffs.iter().find(|d| d.kind == DiffKind::Deleted).unwrap();
        assert_eq!(deleted.path, "b");
        assert_eq!(deleted.location.line, 2);
    }

    #[test]
    fn test_composite_subtree_located_at_its_start() {
        let diffs = diff("a: 1\n", "a: 1\nresources:\n  limits:\n    cpu: 1\n");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "resources");
        assert_eq!(diffs[0].location, Location::new(3, 3));

        let diffs = diff("a: 1\n", "a:\n  b: 1\n");
        assert_eq!(diffs[0].kind, DiffKind::TypeChanged);
        assert_eq!(diffs[0].location, Location::new(2, 3));
    }

    #[test]
    fn test_alias_compared_as_target() {
        let old = "base: &base {a: 1}\nchild: *base\n";
        let new = "base: &base {a: 1}\nchild: {a: 1}\n";
        assert!(diff(old, new).is_empty());

        let changed = diff(old, "base: &base {a: 1}\nchild: {a: 2}\n");
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].path, "child.a");
    }

    #[test]
    fn test_symmetry_of_kinds() {
        let a = "x: 1\ny:\n  z: [1, 2, 3]\nonly_a: {k: v}\n";
        let b = "x: 2\ny:\n  z: [1, 2]\nonly_b: 7\n";

        let forward = diff(a, b);
        let backward = diff(b, a);

        for d in &forward {
            match d.kind {
                DiffKind::Added => assert_eq!(
                    backward
                        .iter()
                        .filter(|r| r.kind == DiffKind::Deleted && r.path == d.path)
                        .count(),
                    1
                ),
                DiffKind::Deleted => assert_eq!(
                    backward
                        .iter()
                        .filter(|r| r.kind == DiffKind::Added && r.path == d.path)
                        .count(),
                    1
                ),
                DiffKind::Modified => {
                    let mirror = backward
                        .iter()
                        .find(|r| r.kind == DiffKind::Modified && r.path == d.path)
                        .unwrap();
                    assert_eq!(mirror.old_value, d.new_value);
                    assert_eq!(mirror.new_value, d.old_value);
                }
                DiffKind::TypeChanged => {}
            }
        }
        assert_eq!(forward.len(), backward.len());
    }

    #[test]
    fn test_deterministic_output() {
        let a = doc(SERVICE);
        let b = doc("name: api\nreplicas: 2\nports: [8080]\nextra: {a: [1]}\n");
        let comparator = NodeComparator::new(CompareOptions::ignore_case());

        let first = comparator.diff(Some(&a), Some(&b));
        let second = comparator.diff(Some(&a), Some(&b));
        assert_eq!(first, second);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let mut old = String::new();
        let mut new = String::new();
        for i in 0..64 {
            old.push_str(&format!("key{}:\n  value: {}\n  list: [{}, {}]\n", i, i, i, i + 1));
            if i % 5 != 0 {
                new.push_str(&format!("key{}:\n  value: {}\n  list: [{}]\n", i, i * 2, i));
            }
        }
        new.push_str("fresh: {a: 1}\n");

        let (old, new) = (doc(&old), doc(&new));
        let sequential = NodeComparator::default().diff(Some(&old), Some(&new));
        let parallel = NodeComparator::default()
            .with_parallelism(2)
            .diff(Some(&old), Some(&new));

        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_modified_location_uses_new_node() {
        let old = Node::scalar("1", Location::new(3, 4));
        let new = Node::scalar("2", Location::new(9, 2));
        let diffs = NodeComparator::default().diff(Some(&old), Some(&new)).into_vec();
        assert_eq!(diffs[0].location, Location::new(9, 2));
    }
}
