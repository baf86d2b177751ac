use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub subcategories: Vec<Category>,
    #[serde(default)]
    pub total_spending: Amount,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// "Root > Parent > Child" label, resolving ancestors from the flat list.
    /// Stops at a missing parent or a repeated id.
    pub fn display_path(&self, all: &[Category]) -> String {
        let mut names = vec![self.name.as_str()];
        let mut seen = HashSet::from([self.id]);
        let mut parent = self.parent;
        while let Some(pid) = parent {
            if !seen.insert(pid) {
                break;
            }
            match all.iter().find(|c| c.id == pid) {
                Some(ancestor) => {
                    names.push(ancestor.name.as_str());
                    parent = ancestor.parent;
                }
                None => break,
            }
        }
        names.reverse();
        names.join(" > ")
    }
}

/// Top-level categories, in the order the backend returned them
pub fn roots(all: &[Category]) -> Vec<&Category> {
    all.iter().filter(|c| c.is_root()).collect()
}

/// Direct children of `parent_id` from a flat list
pub fn children(all: &[Category], parent_id: i64) -> Vec<&Category> {
    all.iter().filter(|c| c.parent == Some(parent_id)).collect()
}

/// Depth-first walk of the hierarchy as `(category, depth)` pairs.
///
/// Roots come first with their subtrees. Categories whose parent is missing
/// from `all` start their own subtree at depth 0, as does anything only
/// reachable through a parent cycle. Each category appears once.
pub fn tree(all: &[Category]) -> Vec<(&Category, usize)> {
    fn walk<'a>(
        all: &'a [Category],
        node: &'a Category,
        depth: usize,
        seen: &mut HashSet<i64>,
        out: &mut Vec<(&'a Category, usize)>,
    ) {
        if !seen.insert(node.id) {
            return;
        }
        out.push((node, depth));
        for child in children(all, node.id) {
            walk(all, child, depth + 1, seen, out);
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(all.len());
    let orphans = all
        .iter()
        .filter(|c| c.parent.is_some_and(|p| !all.iter().any(|o| o.id == p)));
    for start in roots(all).into_iter().chain(orphans) {
        walk(all, start, 0, &mut seen, &mut out);
    }
    for rest in all {
        walk(all, rest, 0, &mut seen, &mut out);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub parent: Option<i64>,
}
