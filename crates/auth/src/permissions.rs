use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. `"catalog.write"`).
///
/// The wildcard `"*"` grants everything inside the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const CATALOG_READ: Permission = Permission(Cow::Borrowed("catalog.read"));
    pub const CATALOG_WRITE: Permission = Permission(Cow::Borrowed("catalog.write"));
    pub const TAX_READ: Permission = Permission(Cow::Borrowed("tax.read"));
    pub const TAX_WRITE: Permission = Permission(Cow::Borrowed("tax.write"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
