//! Assembly of parent/child trees from flat rows.
//!
//! Navigation menus and the category hierarchy are both stored as flat tables with
//! a nullable `parent_id`. [`build_tree`] nests them in one pass; rows whose parent
//! is missing from the input are promoted to roots rather than dropped.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::{Category, CategoryNode, NavigationItem, NavigationNode};

/// A row that can be placed in a tree.
pub trait TreeItem {
    fn id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
    fn sort_order(&self) -> i32;
    /// Secondary ordering key among siblings with equal `sort_order`.
    fn label(&self) -> &str;
}

/// A nested node: the original row plus its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub item: T,
    pub children: Vec<Node<T>>,
}

/// Nests `items` by `parent_id`. Siblings are ordered by `sort_order`, then label.
pub fn build_tree<T: TreeItem>(items: Vec<T>) -> Vec<Node<T>> {
    let known: HashSet<Uuid> = items.iter().map(TreeItem::id).collect();
    let mut by_parent: HashMap<Option<Uuid>, Vec<T>> = HashMap::new();

    for item in items {
        let parent = match item.parent_id() {
            Some(pid) if pid != item.id() && known.contains(&pid) => Some(pid),
            Some(pid) => {
                tracing::debug!(id = %item.id(), parent_id = %pid, "parent not found, promoting to root");
                None
            }
            None => None,
        };
        by_parent.entry(parent).or_default().push(item);
    }

    let mut visited = HashSet::new();
    let roots = attach(None, &mut by_parent, &mut visited);

    // Whatever is left sits on a parent cycle (a -> b -> a); surface it at the root
    // instead of losing it.
    let mut stranded: Vec<T> = by_parent.into_values().flatten().collect();
    if stranded.is_empty() {
        return roots;
    }
    tracing::warn!(count = stranded.len(), "cyclic parent references, promoting to root");
    sort_siblings(&mut stranded);
    let mut roots = roots;
    roots.extend(stranded.into_iter().map(|item| Node { item, children: vec![] }));
    roots
}

fn attach<T: TreeItem>(
    parent: Option<Uuid>,
    by_parent: &mut HashMap<Option<Uuid>, Vec<T>>,
    visited: &mut HashSet<Uuid>,
) -> Vec<Node<T>> {
    let Some(mut siblings) = by_parent.remove(&parent) else {
        return vec![];
    };
    sort_siblings(&mut siblings);
    siblings
        .into_iter()
        .filter_map(|item| {
            if !visited.insert(item.id()) {
                return None;
            }
            let children = attach(Some(item.id()), by_parent, visited);
            Some(Node { item, children })
        })
        .collect()
}

fn sort_siblings<T: TreeItem>(siblings: &mut [T]) {
    siblings.sort_by(|a, b| {
        a.sort_order()
            .cmp(&b.sort_order())
            .then_with(|| a.label().cmp(b.label()))
    });
}

/// Ids of every descendant of `root` (not including `root`).
pub fn descendants<T: TreeItem>(items: &[T], root: Uuid) -> HashSet<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for item in items {
        if let Some(pid) = item.parent_id() {
            children.entry(pid).or_default().push(item.id());
        }
    }
    let mut found = HashSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        for child in children.get(&current).into_iter().flatten() {
            if *child != root && found.insert(*child) {
                stack.push(*child);
            }
        }
    }
    found
}

/// True when following `parent_id` links from some item leads back to it.
pub fn has_cycle<T: TreeItem>(items: &[T]) -> bool {
    let parents: HashMap<Uuid, Option<Uuid>> = items.iter().map(|i| (i.id(), i.parent_id())).collect();
    items.iter().any(|item| {
        let mut seen = HashSet::new();
        let mut current = Some(item.id());
        while let Some(id) = current {
            if !seen.insert(id) {
                return true;
            }
            current = parents.get(&id).copied().flatten();
        }
        false
    })
}

/// Next free position among the children of `parent`: one past the current maximum.
pub fn next_sort_order<T: TreeItem>(items: &[T], parent: Option<Uuid>) -> i32 {
    items
        .iter()
        .filter(|item| item.parent_id() == parent)
        .map(TreeItem::sort_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Depth of every node in `items` (root = 0), following `parent_id` links.
/// A missing parent counts as a root.
pub fn levels<T: TreeItem>(items: &[T]) -> HashMap<Uuid, i32> {
    let mut out = HashMap::new();
    for node in build_tree_refs(items) {
        assign_levels(&node, 0, &mut out);
    }
    out
}

fn build_tree_refs<T: TreeItem>(items: &[T]) -> Vec<Node<Ref<'_, T>>> {
    build_tree(items.iter().map(Ref).collect())
}

fn assign_levels<T: TreeItem>(node: &Node<T>, level: i32, out: &mut HashMap<Uuid, i32>) {
    out.insert(node.item.id(), level);
    for child in &node.children {
        assign_levels(child, level + 1, out);
    }
}

struct Ref<'a, T>(&'a T);

impl<T: TreeItem> TreeItem for Ref<'_, T> {
    fn id(&self) -> Uuid {
        self.0.id()
    }
    fn parent_id(&self) -> Option<Uuid> {
        self.0.parent_id()
    }
    fn sort_order(&self) -> i32 {
        self.0.sort_order()
    }
    fn label(&self) -> &str {
        self.0.label()
    }
}

impl TreeItem for NavigationItem {
    fn id(&self) -> Uuid {
        self.id
    }
    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
    fn sort_order(&self) -> i32 {
        self.sort_order
    }
    fn label(&self) -> &str {
        &self.label
    }
}

impl TreeItem for Category {
    fn id(&self) -> Uuid {
        self.id
    }
    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
    fn sort_order(&self) -> i32 {
        self.sort_order
    }
    fn label(&self) -> &str {
        &self.name
    }
}

/// Menu tree for the site header/footer and GET /api/navigation/tree.
pub fn navigation_tree(items: Vec<NavigationItem>) -> Vec<NavigationNode> {
    build_tree(items).into_iter().map(into_navigation_node).collect()
}

fn into_navigation_node(node: Node<NavigationItem>) -> NavigationNode {
    NavigationNode {
        id: node.item.id,
        label: node.item.label,
        url: node.item.url,
        open_in_new_tab: node.item.open_in_new_tab,
        sort_order: node.item.sort_order,
        children: node.children.into_iter().map(into_navigation_node).collect(),
    }
}

pub fn category_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    build_tree(categories).into_iter().map(into_category_node).collect()
}

fn into_category_node(node: Node<Category>) -> CategoryNode {
    CategoryNode {
        category: node.item,
        children: node.children.into_iter().map(into_category_node).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(id: u128, parent: Option<u128>, order: i32, label: &str) -> NavigationItem {
        NavigationItem {
            id: Uuid::from_u128(id),
            parent_id: parent.map(Uuid::from_u128),
            sort_order: order,
            label: label.to_string(),
            url: format!("/{label}"),
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn nests_and_orders_children() {
        let items = vec![
            nav(1, None, 1, "products"),
            nav(2, None, 0, "home"),
            nav(3, Some(1), 1, "simulators"),
            nav(4, Some(1), 0, "emulators"),
            nav(5, Some(4), 0, "be-500"),
        ];
        let tree = navigation_tree(items);
        let labels: Vec<_> = tree.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, ["home", "products"]);
        let children: Vec<_> = tree[1].children.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(children, ["emulators", "simulators"]);
        assert_eq!(tree[1].children[0].children[0].label, "be-500");
    }

    #[test]
    fn ties_break_on_label() {
        let tree = navigation_tree(vec![nav(1, None, 0, "b"), nav(2, None, 0, "a")]);
        assert_eq!(tree[0].label, "a");
    }

    #[test]
    fn orphan_is_promoted_to_root() {
        let tree = navigation_tree(vec![nav(1, None, 0, "home"), nav(2, Some(99), 1, "orphan")]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].label, "orphan");
    }

    #[test]
    fn cycles_do_not_lose_items() {
        let tree = navigation_tree(vec![nav(1, Some(2), 0, "a"), nav(2, Some(1), 0, "b")]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn descendants_and_levels() {
        let items = vec![
            nav(1, None, 0, "root"),
            nav(2, Some(1), 0, "child"),
            nav(3, Some(2), 0, "grandchild"),
            nav(4, None, 1, "other"),
        ];
        let d = descendants(&items, Uuid::from_u128(1));
        assert_eq!(d.len(), 2);
        assert!(d.contains(&Uuid::from_u128(3)));

        let levels = levels(&items);
        assert_eq!(levels[&Uuid::from_u128(1)], 0);
        assert_eq!(levels[&Uuid::from_u128(3)], 2);
        assert_eq!(levels[&Uuid::from_u128(4)], 0);
    }

    #[test]
    fn detects_parent_cycles() {
        assert!(!has_cycle(&[nav(1, None, 0, "a"), nav(2, Some(1), 0, "b")]));
        assert!(has_cycle(&[nav(1, Some(2), 0, "a"), nav(2, Some(1), 0, "b")]));
        assert!(has_cycle(&[nav(1, Some(1), 0, "self")]));
    }

    #[test]
    fn next_sort_order_appends() {
        let items = vec![nav(1, None, 0, "a"), nav(2, None, 4, "b"), nav(3, Some(1), 0, "c")];
        assert_eq!(next_sort_order(&items, None), 5);
        assert_eq!(next_sort_order(&items, Some(Uuid::from_u128(1))), 1);
        assert_eq!(next_sort_order(&items, Some(Uuid::from_u128(3))), 0);
    }
}
