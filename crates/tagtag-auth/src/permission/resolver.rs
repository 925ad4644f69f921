//! Fetches and indexes the permission model for one access token.

use std::sync::Arc;

use tracing::{debug, info};

use tagtag_core::result::AppResult;
use tagtag_core::types::MenuRecord;

use crate::client::AuthApi;

use super::index::AccessCodeSet;
use super::tree::MenuTree;

/// Access codes and menu tree for one session.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPermissions {
    /// Granted access codes.
    pub codes: AccessCodeSet,
    /// Menu forest.
    pub menus: MenuTree,
    /// Number of menu records the server returned.
    pub record_count: usize,
}

/// Builds [`ResolvedPermissions`] from the identity endpoint.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    api: Arc<dyn AuthApi>,
}

impl PermissionResolver {
    /// Creates a resolver.
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self { api }
    }

    /// Builds the access-code index.
    pub fn build_index<I, S>(codes: I) -> AccessCodeSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessCodeSet::build(codes)
    }

    /// Builds the menu tree.
    pub fn build_menu_tree(records: &[MenuRecord]) -> MenuTree {
        MenuTree::build(records)
    }

    /// Fetches access codes and menus concurrently and indexes both.
    ///
    /// The first failure wins; nothing partial is returned.
    pub async fn resolve(&self, access_token: &str) -> AppResult<ResolvedPermissions> {
        debug!("Fetching access codes and menus");
        let (codes, records) = tokio::try_join!(
            self.api.fetch_access_codes(access_token),
            self.api.fetch_menus(access_token)
        )?;

        let resolved = ResolvedPermissions {
            codes: Self::build_index(codes),
            menus: Self::build_menu_tree(&records),
            record_count: records.len(),
        };

        info!(
            access_codes = resolved.codes.len(),
            menus = resolved.record_count,
            orphans = resolved.menus.orphans().len(),
            "Permissions resolved"
        );

        Ok(resolved)
    }
}
