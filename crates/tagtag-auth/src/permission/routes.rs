//! Route records derived from menu nodes.

use serde::{Deserialize, Serialize};

use super::tree::MenuNode;

/// Layout used by directories, external links, and nodes without a component.
pub const BASIC_LAYOUT: &str = "BasicLayout";

/// Component that renders an embedded iframe.
pub const IFRAME_VIEW: &str = "IFrameView";

/// Route metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub keep_alive: bool,
    pub hide_in_menu: bool,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iframe_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A routable page with its nested routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    /// Converts one node and its (already filtered) children.
    pub fn from_node(node: &MenuNode) -> Self {
        let children = convert_all(&node.children);

        let path = match node.path.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => "/".to_string(),
        };

        let redirect = children
            .first()
            .map(|child| child.path.clone())
            .filter(|p| p.starts_with('/'));

        let name = if node.code.trim().is_empty() {
            format!("menu-{}", node.id)
        } else {
            node.code.clone()
        };

        Self {
            path,
            name,
            component: component_for(node),
            redirect,
            meta: RouteMeta {
                title: node.name.clone(),
                icon: node.icon.clone().filter(|i| !i.is_empty()),
                keep_alive: node.keep_alive,
                hide_in_menu: node.hide_in_menu,
                order: node.sort_key,
                iframe_src: node.iframe_src.clone().filter(|s| !s.is_empty()),
                link: node.link.clone().filter(|l| !l.is_empty()),
            },
            children,
        }
    }

    /// Number of routes in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(RouteRecord::count).sum::<usize>()
    }
}

/// Converts a list of nodes, keeping their order.
pub fn convert_all(nodes: &[MenuNode]) -> Vec<RouteRecord> {
    nodes.iter().map(RouteRecord::from_node).collect()
}

fn component_for(node: &MenuNode) -> String {
    let non_blank = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    if non_blank(&node.iframe_src) {
        return IFRAME_VIEW.to_string();
    }
    if non_blank(&node.link) {
        return BASIC_LAYOUT.to_string();
    }
    match node.component_ref.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => {
            if c.starts_with('/') {
                c.to_string()
            } else {
                format!("/{c}")
            }
        }
        _ => BASIC_LAYOUT.to_string(),
    }
}
