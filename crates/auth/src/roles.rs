use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static role → permission policy.
///
/// - `admin`: everything in the tenant
/// - `editor`: read/write catalog, read tax settings
/// - `viewer`: read-only
///
/// Unknown roles grant nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut perms = Vec::new();
    for role in roles {
        let granted = match role.as_str() {
            "admin" => vec![Permission::WILDCARD],
            "editor" => vec![
                Permission::CATALOG_READ,
                Permission::CATALOG_WRITE,
                Permission::TAX_READ,
            ],
            "viewer" => vec![Permission::CATALOG_READ, Permission::TAX_READ],
            _ => Vec::new(),
        };
        for p in granted {
            if !perms.contains(&p) {
                perms.push(p);
            }
        }
    }
    perms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_and_viewer_merge_without_duplicates() {
        let perms = permissions_for_roles(&[Role::new("viewer"), Role::new("editor")]);
        assert_eq!(
            perms,
            vec![
                Permission::CATALOG_READ,
                Permission::TAX_READ,
                Permission::CATALOG_WRITE,
            ]
        );
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(permissions_for_roles(&[Role::new("guest")]).is_empty());
    }
}
