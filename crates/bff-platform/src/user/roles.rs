//! Pure role helpers used by the aggregator.

use std::collections::HashMap;

use crate::idp::DirectoryUser;
use crate::role::Role;

/// Requested roles with no exact (id and name) match among the realm roles,
/// in request order.
pub fn absent_roles(requested: &[Role], realm: &[Role]) -> Vec<Role> {
    requested
        .iter()
        .filter(|role| !realm.contains(role))
        .cloned()
        .collect()
}

/// Invert per-role membership lists into user id -> role names.
///
/// Role names appear in the order the memberships are given.
pub fn group_role_names_by_user(memberships: &[(String, Vec<DirectoryUser>)]) -> HashMap<String, Vec<String>> {
    let mut by_user: HashMap<String, Vec<String>> = HashMap::new();
    for (role_name, members) in memberships {
        for member in members {
            if let Some(id) = &member.id {
                by_user.entry(id.clone()).or_default().push(role_name.clone());
            }
        }
    }
    by_user
}

/// Trailing path segment of a location reference such as
/// `http://kc/auth/admin/realms/onap/users/{id}`.
pub fn user_id_from_location(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(String::from)
}
