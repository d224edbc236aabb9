//! Built-in groups and their permission sets.
//!
//! Group membership is stored in the database; the permission lists
//! attached to each group are static and exposed on the admin group
//! listing page.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// The distinguished administrator group
pub const ADMIN_GROUP: &str = "Administrators";

/// Group for regular dashboard users
pub const STANDARD_GROUP: &str = "Standard Users";

const ENTITIES: [&str; 5] = ["client", "locality", "product", "order", "order_line"];
const ACTIONS: [&str; 4] = ["view", "add", "change", "delete"];

lazy_static! {
    /// Permission names per built-in group. Administrators carry every
    /// action on every entity plus user management; Standard Users are
    /// read-only.
    pub static ref GROUP_PERMISSIONS: HashMap<&'static str, Vec<String>> = {
        let mut map = HashMap::new();

        let mut admin_perms: Vec<String> = Vec::new();
        for entity in ENTITIES {
            for action in ACTIONS {
                admin_perms.push(format!("{}_{}", action, entity));
            }
        }
        admin_perms.push("view_user".to_string());
        admin_perms.push("change_user".to_string());
        admin_perms.push("view_group".to_string());
        map.insert(ADMIN_GROUP, admin_perms);

        let view_perms: Vec<String> = ENTITIES
            .iter()
            .map(|entity| format!("view_{}", entity))
            .collect();
        map.insert(STANDARD_GROUP, view_perms);

        map
    };
}

/// Permission list for a group name; unknown groups have none.
pub fn permissions_for(group_name: &str) -> &'static [String] {
    GROUP_PERMISSIONS
        .get(group_name)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrators_hold_every_entity_action() {
        let perms = permissions_for(ADMIN_GROUP);
        assert!(perms.iter().any(|p| p == "delete_order_line"));
        assert!(perms.iter().any(|p| p == "view_client"));
        assert!(perms.len() > permissions_for(STANDARD_GROUP).len());
    }

    #[test]
    fn standard_users_are_view_only() {
        let perms = permissions_for(STANDARD_GROUP);
        assert!(perms.iter().all(|p| p.starts_with("view_")));
    }

    #[test]
    fn unknown_group_has_no_permissions() {
        assert!(permissions_for("Visitors").is_empty());
    }
}
