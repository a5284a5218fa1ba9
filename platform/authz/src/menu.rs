use crate::guard::can_access_route;
use crate::{RouteRequirement, Subject};

/// Filter a route tree down to the entries the subject may see in navigation.
///
/// Hidden entries and inaccessible entries are dropped, children are filtered
/// recursively, and each level is stable-sorted by menu position so entries
/// without an explicit order land last in declaration order. Pure in
/// (subject, routes), and idempotent.
pub fn accessible_menu_items(subject: &Subject, routes: &[RouteRequirement]) -> Vec<RouteRequirement> {
    let mut visible: Vec<RouteRequirement> = routes
        .iter()
        .filter(|route| !route.hide_in_menu && can_access_route(subject, route))
        .cloned()
        .map(|mut route| {
            if !route.children.is_empty() {
                route.children = accessible_menu_items(subject, &route.children);
            }
            route
        })
        .collect();
    visible.sort_by_key(RouteRequirement::menu_position);
    visible
}
