//! Flat menu records as returned by `GET /auth/menu/all`.

use serde::{Deserialize, Serialize};

/// Kind of a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuType {
    /// Grouping node (`menuType = 0`).
    Directory,
    /// Routable page (`menuType = 1`).
    Page,
    /// Button-level permission (`menuType = 2`); never navigable.
    Action,
}

impl MenuType {
    /// Maps the numeric wire code. Unknown codes are treated as pages.
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Self::Directory,
            Some(2) => Self::Action,
            _ => Self::Page,
        }
    }
}

/// One flat menu record. `parent_id` links records into a forest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecord {
    /// Record ID.
    #[serde(deserialize_with = "lenient_id::required")]
    pub id: i64,
    /// Parent record ID; absent or `0` for roots.
    #[serde(default, deserialize_with = "lenient_id::parent")]
    pub parent_id: Option<i64>,
    /// Unique menu code, also used as the route name and permission code.
    #[serde(default)]
    pub menu_code: String,
    /// Display title.
    #[serde(default)]
    pub menu_name: String,
    /// Route path.
    #[serde(default)]
    pub path: Option<String>,
    /// Component reference (view path or layout name).
    #[serde(default)]
    pub component: Option<String>,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Sort key; lower first.
    #[serde(default)]
    pub sort: Option<i32>,
    /// `0` disabled, anything else enabled.
    #[serde(default)]
    pub status: Option<i32>,
    /// `0` directory, `1` page, `2` action.
    #[serde(default)]
    pub menu_type: Option<i32>,
    /// Hidden from the navigation menu but still routable.
    #[serde(default)]
    pub hide_in_menu: Option<bool>,
    /// Keep the view alive when navigating away.
    #[serde(default)]
    pub keep_alive: Option<bool>,
    /// External link.
    #[serde(default)]
    pub link: Option<String>,
    /// Embedded iframe source.
    #[serde(default)]
    pub iframe_src: Option<String>,
}

impl MenuRecord {
    /// Typed menu kind.
    pub fn kind(&self) -> MenuType {
        MenuType::from_code(self.menu_type)
    }

    /// Whether the record is switched off.
    pub fn is_disabled(&self) -> bool {
        self.status == Some(0)
    }
}

/// Deserializers for backend IDs, which arrive as numbers or numeric strings.
pub(crate) mod lenient_id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    fn parse<E: Error>(raw: RawId) -> Result<i64, E> {
        match raw {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id: {s:?}"))),
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        match Option::<RawId>::deserialize(d)? {
            Some(raw) => parse(raw),
            None => Ok(0),
        }
    }

    pub fn parent<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<RawId>::deserialize(d)? {
            Some(raw) => parse(raw).map(|id| (id != 0).then_some(id)),
            None => Ok(None),
        }
    }
}
