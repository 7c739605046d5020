//! Server configuration from the environment.

use std::net::SocketAddr;

use anyhow::Context;

use pricebook_catalog::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Page size used when a list request has no `limit`.
    pub default_page_size: u32,
}

impl ApiConfig {
    /// Config for an in-process server (tests, local tools).
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Read `PRICEBOOK_BIND_ADDR`, `JWT_SECRET` and `PRICEBOOK_DEFAULT_PAGE_SIZE`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = get("PRICEBOOK_BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("PRICEBOOK_BIND_ADDR must be host:port")?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let default_page_size = match get("PRICEBOOK_DEFAULT_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .context("PRICEBOOK_DEFAULT_PAGE_SIZE must be a positive integer")?
                .clamp(1, MAX_PAGE_SIZE),
            None => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            default_page_size,
        })
    }
}
