//! Access-code and menu commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use tagtag_auth::{MenuNode, RouteRecord, SessionController};
use tagtag_core::error::AppError;
use tagtag_core::result::AppResult;
use tagtag_core::types::MenuType;

use crate::output::{self, OutputFormat};

/// Arguments for `codes`
#[derive(Debug, Args)]
pub struct CodesArgs {
    /// Codes to check; lists every granted code when empty
    pub check: Vec<String>,
}

/// Arguments for `menus`
#[derive(Debug, Args)]
pub struct MenusArgs {
    /// Include actions, disabled and hidden entries
    #[arg(long)]
    pub all: bool,
    /// Show the route table instead of the menu
    #[arg(long, conflicts_with = "all")]
    pub routes: bool,
    /// Show only the entry routed at this path
    #[arg(long)]
    pub path: Option<String>,
}

/// Access code display row
#[derive(Debug, Serialize, Tabled)]
struct CodeRow {
    /// Code
    code: String,
    /// Granted
    granted: String,
}

/// Menu display row
#[derive(Debug, Tabled)]
struct MenuRow {
    /// Title
    title: String,
    /// Code
    code: String,
    /// Kind
    kind: String,
    /// Path
    path: String,
    /// Order
    order: i32,
    /// Flags
    flags: String,
}

/// Route display row
#[derive(Debug, Tabled)]
struct RouteRow {
    /// Path
    path: String,
    /// Name
    name: String,
    /// Component
    component: String,
    /// Redirect
    redirect: String,
}

/// Execute `codes`
pub async fn codes(
    session: &SessionController,
    args: &CodesArgs,
    format: OutputFormat,
) -> AppResult<()> {
    super::require_session(session).await?;
    let granted = session.access_codes().await;

    let rows: Vec<CodeRow> = if args.check.is_empty() {
        granted
            .sorted()
            .into_iter()
            .map(|code| CodeRow {
                code: code.to_string(),
                granted: "✓".to_string(),
            })
            .collect()
    } else {
        args.check
            .iter()
            .map(|code| CodeRow {
                code: code.clone(),
                granted: if granted.can(code) { "✓" } else { "✗" }.to_string(),
            })
            .collect()
    };

    output::print_rows(&rows, &rows, format);
    Ok(())
}

/// Execute `menus`
pub async fn menus(
    session: &SessionController,
    args: &MenusArgs,
    format: OutputFormat,
) -> AppResult<()> {
    super::require_session(session).await?;
    let tree = session.menu_tree().await;

    if let Some(path) = &args.path {
        let node = tree
            .find_by_path(path)
            .ok_or_else(|| AppError::validation(format!("No route at '{}'", path)))?;
        let trail = tree.breadcrumb(node.id).join(" / ");
        let pairs = [
            ("Title", node.name.clone()),
            ("Code", node.code.clone()),
            ("Breadcrumb", trail),
            ("Component", output::or_dash(node.component_ref.as_deref())),
            ("Hidden", node.hide_in_menu.to_string()),
        ];
        output::print_details(&pairs, &node, format);
        return Ok(());
    }

    if args.routes {
        let routes = tree.routes();
        let mut rows = Vec::new();
        flatten_routes(&routes, 0, &mut rows);
        output::print_rows(&rows, &routes, format);
        return Ok(());
    }

    let nodes = if args.all {
        tree.forest()
    } else {
        tree.navigation()
    };
    let mut rows = Vec::new();
    flatten_menu(&nodes, 0, &mut rows);
    output::print_rows(&rows, &nodes, format);

    if !args.all && !tree.orphans().is_empty() {
        output::print_warning(&format!(
            "{} menu entries reference a missing parent and are shown at the top level",
            tree.orphans().len()
        ));
    }
    Ok(())
}

fn flatten_menu(nodes: &[MenuNode], depth: usize, rows: &mut Vec<MenuRow>) {
    for node in nodes {
        let mut flags = Vec::new();
        if node.hide_in_menu {
            flags.push("hidden");
        }
        if node.disabled {
            flags.push("disabled");
        }
        if node.keep_alive {
            flags.push("keep-alive");
        }
        if node.link.is_some() {
            flags.push("link");
        }

        rows.push(MenuRow {
            title: format!("{}{}", "  ".repeat(depth), node.name),
            code: node.code.clone(),
            kind: match node.menu_type {
                MenuType::Directory => "directory",
                MenuType::Page => "page",
                MenuType::Action => "action",
            }
            .to_string(),
            path: output::or_dash(node.path.as_deref()),
            order: node.sort_key,
            flags: flags.join(","),
        });
        flatten_menu(&node.children, depth + 1, rows);
    }
}

fn flatten_routes(routes: &[RouteRecord], depth: usize, rows: &mut Vec<RouteRow>) {
    for route in routes {
        rows.push(RouteRow {
            path: format!("{}{}", "  ".repeat(depth), route.path),
            name: route.name.clone(),
            component: route.component.clone(),
            redirect: output::or_dash(route.redirect.as_deref()),
        });
        flatten_routes(&route.children, depth + 1, rows);
    }
}
