//! Permission guard applied by handlers before touching the service.

use pricebook_auth::{authorize, AuthzError, Permission, Principal};

use crate::context::{PrincipalContext, TenantContext};

/// Check that the request principal holds `required` in the request tenant.
pub fn require(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: &Permission,
) -> Result<(), AuthzError> {
    let principal = Principal::from_roles(
        principal.user_id(),
        tenant.tenant_id(),
        principal.roles().to_vec(),
    );
    authorize(&principal, required).inspect_err(|e| {
        tracing::warn!(
            tenant_id = %tenant.tenant_id(),
            user_id = %principal.user_id,
            error = %e,
            "permission denied"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricebook_auth::Role;
    use pricebook_core::{TenantId, UserId};

    fn ctx(roles: &[&'static str]) -> (TenantContext, PrincipalContext) {
        (
            TenantContext::new(TenantId::new()),
            PrincipalContext::new(UserId::new(), roles.iter().map(|r| Role::new(*r)).collect()),
        )
    }

    #[test]
    fn viewer_reads_but_cannot_write() {
        let (t, p) = ctx(&["viewer"]);
        assert!(require(&t, &p, &Permission::CATALOG_READ).is_ok());
        assert_eq!(
            require(&t, &p, &Permission::CATALOG_WRITE),
            Err(AuthzError::Forbidden("catalog.write".to_string()))
        );
    }

    #[test]
    fn editor_cannot_change_tax_settings() {
        let (t, p) = ctx(&["editor"]);
        assert!(require(&t, &p, &Permission::CATALOG_WRITE).is_ok());
        assert!(require(&t, &p, &Permission::TAX_WRITE).is_err());
    }
}
