//! Permission resolution: access-code index, menu tree, and routes.

pub mod index;
pub mod resolver;
pub mod routes;
pub mod tree;

pub use index::AccessCodeSet;
pub use resolver::{PermissionResolver, ResolvedPermissions};
pub use routes::{RouteMeta, RouteRecord};
pub use tree::{MenuNode, MenuTree};
