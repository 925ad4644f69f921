//! Menu tree built from flat menu records.
//!
//! Records reference their parent by ID. The tree is an arena: every record
//! gets one slot, parent/child links are slot indices, and each slot is
//! attached exactly once. Nested [`MenuNode`] values are materialized on
//! demand for rendering.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use tagtag_core::types::{MenuRecord, MenuType};

use super::index::AccessCodeSet;
use super::routes::{self, RouteRecord};

/// One menu entry with its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    /// Record ID.
    pub id: i64,
    /// Menu code; route name and permission code.
    pub code: String,
    /// Display title.
    pub name: String,
    /// Route path.
    pub path: Option<String>,
    /// Component reference.
    pub component_ref: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Entry kind.
    pub menu_type: MenuType,
    /// Sort key; lower first.
    pub sort_key: i32,
    /// Parent ID as sent by the server (may be dangling for orphans).
    pub parent_id: Option<i64>,
    /// Hidden in the navigation menu but routable.
    pub hide_in_menu: bool,
    /// Keep the view alive.
    pub keep_alive: bool,
    /// Switched off by an administrator.
    pub disabled: bool,
    /// External link.
    pub link: Option<String>,
    /// Embedded iframe source.
    pub iframe_src: Option<String>,
    /// Children ordered by `sort_key`, then by arrival order.
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    fn from_record(record: &MenuRecord) -> Self {
        Self {
            id: record.id,
            code: record.menu_code.clone(),
            name: record.menu_name.clone(),
            path: record.path.clone(),
            component_ref: record.component.clone(),
            icon: record.icon.clone(),
            menu_type: record.kind(),
            sort_key: record.sort.unwrap_or(0),
            parent_id: record.parent_id,
            hide_in_menu: record.hide_in_menu.unwrap_or(false),
            keep_alive: record.keep_alive.unwrap_or(false),
            disabled: record.is_disabled(),
            link: record.link.clone(),
            iframe_src: record.iframe_src.clone(),
            children: Vec::new(),
        }
    }

    /// Whether this node can appear in the route table.
    pub fn is_routable(&self) -> bool {
        self.menu_type != MenuType::Action && !self.disabled
    }

    /// Whether this node can appear in the navigation menu.
    pub fn is_navigable(&self) -> bool {
        self.is_routable() && !self.hide_in_menu
    }
}

/// Arena slot.
#[derive(Debug, Clone)]
struct Slot {
    /// Node data; `children` stays empty inside the arena.
    node: MenuNode,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Forest of menu nodes for one session.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    slots: Vec<Slot>,
    roots: Vec<usize>,
    by_id: HashMap<i64, usize>,
    orphans: Vec<i64>,
}

impl MenuTree {
    /// Builds the forest from flat records.
    ///
    /// - Every record with a unique ID becomes exactly one node.
    /// - Records whose parent is missing are attached at the root with a
    ///   warning; they are never dropped.
    /// - Records that only reach each other through parent links (a cycle)
    ///   are cut loose at one cycle member, which becomes a root.
    /// - A repeated ID keeps the first record and logs the rest.
    /// - Siblings are ordered by `sort` ascending; ties keep arrival order.
    pub fn build(records: &[MenuRecord]) -> Self {
        let mut tree = Self::default();

        for record in records {
            if tree.by_id.contains_key(&record.id) {
                warn!(menu_id = record.id, code = %record.menu_code, "Duplicate menu id, keeping first record");
                continue;
            }
            tree.by_id.insert(record.id, tree.slots.len());
            tree.slots.push(Slot {
                node: MenuNode::from_record(record),
                parent: None,
                children: Vec::new(),
            });
        }

        for idx in 0..tree.slots.len() {
            let node = &tree.slots[idx].node;
            let parent = match node.parent_id {
                None => None,
                Some(pid) if pid == node.id => {
                    warn!(menu_id = node.id, "Menu record is its own parent, attaching at root");
                    None
                }
                Some(pid) => match tree.by_id.get(&pid) {
                    Some(&parent) => Some(parent),
                    None => {
                        warn!(menu_id = node.id, parent_id = pid, code = %node.code, "Orphan menu record, attaching at root");
                        tree.orphans.push(node.id);
                        None
                    }
                },
            };

            match parent {
                Some(parent) => {
                    tree.slots[idx].parent = Some(parent);
                    tree.slots[parent].children.push(idx);
                }
                None => tree.roots.push(idx),
            }
        }

        tree.break_cycles();
        tree.sort_siblings();
        tree
    }

    /// Promotes one member of every parent cycle to a root.
    fn break_cycles(&mut self) {
        let mut reached = vec![false; self.slots.len()];
        for &root in &self.roots {
            self.mark_reached(root, &mut reached);
        }

        for idx in 0..self.slots.len() {
            if reached[idx] {
                continue;
            }

            // Walk up until a slot repeats; that slot lies on the cycle.
            let mut seen = HashSet::new();
            let mut cursor = idx;
            while seen.insert(cursor) {
                match self.slots[cursor].parent {
                    Some(parent) => cursor = parent,
                    None => break,
                }
            }

            if let Some(parent) = self.slots[cursor].parent.take() {
                self.slots[parent].children.retain(|&child| child != cursor);
            }
            warn!(
                menu_id = self.slots[cursor].node.id,
                code = %self.slots[cursor].node.code,
                "Menu parent cycle detected, attaching at root"
            );
            self.roots.push(cursor);
            self.mark_reached(cursor, &mut reached);
        }
    }

    fn mark_reached(&self, start: usize, reached: &mut [bool]) {
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if reached[idx] {
                continue;
            }
            reached[idx] = true;
            stack.extend(self.slots[idx].children.iter().copied());
        }
    }

    fn sort_siblings(&mut self) {
        let keys: Vec<i32> = self.slots.iter().map(|s| s.node.sort_key).collect();
        self.roots.sort_by_key(|&idx| (keys[idx], idx));
        for slot in &mut self.slots {
            slot.children.sort_by_key(|&idx| (keys[idx], idx));
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// IDs of records whose parent was missing.
    pub fn orphans(&self) -> &[i64] {
        &self.orphans
    }

    /// Whether a node with `id` exists.
    pub fn contains(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// The full forest, including actions, disabled, and hidden nodes.
    pub fn forest(&self) -> Vec<MenuNode> {
        self.materialize(&self.roots, &|_| true)
    }

    /// The navigation menu: no actions, no disabled nodes, no hidden nodes.
    ///
    /// An excluded node takes its whole subtree with it.
    pub fn navigation(&self) -> Vec<MenuNode> {
        self.materialize(&self.roots, &MenuNode::is_navigable)
    }

    /// Route records for every routable node, hidden ones included.
    pub fn routes(&self) -> Vec<RouteRecord> {
        let routable = self.materialize(&self.roots, &MenuNode::is_routable);
        routes::convert_all(&routable)
    }

    /// Subtree rooted at `id`, unfiltered.
    pub fn get(&self, id: i64) -> Option<MenuNode> {
        let &idx = self.by_id.get(&id)?;
        self.materialize(&[idx], &|_| true).pop()
    }

    /// Routable subtree whose node has exactly `path`.
    ///
    /// Hidden nodes are found too; that is what keeps them reachable.
    pub fn find_by_path(&self, path: &str) -> Option<MenuNode> {
        let idx = self.pre_order_slots().into_iter().find(|&idx| {
            let node = &self.slots[idx].node;
            node.is_routable() && node.path.as_deref() == Some(path)
        })?;
        self.materialize(&[idx], &MenuNode::is_routable).pop()
    }

    /// Titles from the root down to `id`.
    pub fn breadcrumb(&self, id: i64) -> Vec<String> {
        let mut titles = Vec::new();
        let mut cursor = self.by_id.get(&id).copied();
        while let Some(idx) = cursor {
            titles.push(self.slots[idx].node.name.clone());
            cursor = self.slots[idx].parent;
        }
        titles.reverse();
        titles
    }

    /// Codes of every action node, for button-level checks against the menu
    /// model rather than the access-code list.
    pub fn action_codes(&self) -> AccessCodeSet {
        self.slots
            .iter()
            .filter(|slot| slot.node.menu_type == MenuType::Action)
            .map(|slot| slot.node.code.clone())
            .collect()
    }

    /// Node IDs in pre-order over the full forest.
    pub fn pre_order_ids(&self) -> Vec<i64> {
        self.pre_order_slots()
            .into_iter()
            .map(|idx| self.slots[idx].node.id)
            .collect()
    }

    fn pre_order_slots(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.slots[idx].children.iter().rev().copied());
        }
        order
    }

    fn materialize(&self, slots: &[usize], keep: &dyn Fn(&MenuNode) -> bool) -> Vec<MenuNode> {
        slots
            .iter()
            .filter(|&&idx| keep(&self.slots[idx].node))
            .map(|&idx| {
                let slot = &self.slots[idx];
                let mut node = slot.node.clone();
                node.children = self.materialize(&slot.children, keep);
                node
            })
            .collect()
    }
}
