use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Menu entries without an explicit order sort after every ordered entry.
pub const DEFAULT_MENU_ORDER: u32 = 999;

/// Reference to the renderable behind a route.
///
/// The engine never resolves or inspects this; the rendering collaborator
/// maps component names to actual output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteElement {
    #[default]
    None,
    Component(String),
}

/// Page metadata carried alongside a route for the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One entry of the declarative route table.
///
/// `guest_only` and the authenticated requirements (`require_auth`,
/// `permissions`, `roles`) are mutually exclusive; the route table rejects
/// entries that declare both. Children carry their own requirements; nothing
/// is inherited from the parent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteRequirement {
    pub path: String,
    pub element: RouteElement,
    pub index: bool,

    pub require_auth: bool,
    pub guest_only: bool,
    /// Where an authenticated subject lands when hitting a guest-only route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,

    pub permissions: Vec<Permission>,
    pub roles: Vec<Role>,
    pub require_all_permissions: bool,
    pub require_all_roles: bool,

    pub hide_in_menu: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_order: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<RouteMeta>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteRequirement>,
}

impl RouteRequirement {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn component(mut self, name: impl Into<String>) -> Self {
        self.element = RouteElement::Component(name.into());
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn require_auth(mut self) -> Self {
        self.require_auth = true;
        self
    }

    pub fn guest_only(mut self, redirect_to: impl Into<String>) -> Self {
        self.guest_only = true;
        self.redirect_to = Some(redirect_to.into());
        self
    }

    pub fn permissions(mut self, permissions: impl Into<Vec<Permission>>) -> Self {
        self.permissions = permissions.into();
        self
    }

    pub fn roles(mut self, roles: impl Into<Vec<Role>>) -> Self {
        self.roles = roles.into();
        self
    }

    pub fn require_all_permissions(mut self) -> Self {
        self.require_all_permissions = true;
        self
    }

    pub fn require_all_roles(mut self) -> Self {
        self.require_all_roles = true;
        self
    }

    pub fn hide_in_menu(mut self) -> Self {
        self.hide_in_menu = true;
        self
    }

    pub fn menu(mut self, title: impl Into<String>, icon: impl Into<String>, order: u32) -> Self {
        self.menu_title = Some(title.into());
        self.menu_icon = Some(icon.into());
        self.menu_order = Some(order);
        self
    }

    pub fn menu_title(mut self, title: impl Into<String>) -> Self {
        self.menu_title = Some(title.into());
        self
    }

    pub fn meta(mut self, title: impl Into<String>) -> Self {
        let meta = self.meta.get_or_insert_with(RouteMeta::default);
        meta.title = Some(title.into());
        self
    }

    pub fn children(mut self, children: impl Into<Vec<RouteRequirement>>) -> Self {
        self.children = children.into();
        self
    }

    /// Whether the entry declares anything the access predicate must check.
    pub fn is_guarded(&self) -> bool {
        self.guest_only || self.require_auth || !self.permissions.is_empty() || !self.roles.is_empty()
    }

    /// Effective menu position; unordered entries sort last.
    pub fn menu_position(&self) -> u32 {
        self.menu_order.unwrap_or(DEFAULT_MENU_ORDER)
    }
}
