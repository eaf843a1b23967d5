use std::net::SocketAddr;

/// Application-level constants
pub const APP_NAME: &str = "gcim-intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source system assumed when a request names none.
pub const DEFAULT_SOURCE_EHR: &str = "Epic";
/// Content format assumed when a request names none.
pub const DEFAULT_CONTENT_TYPE: &str = "FHIR";

/// Environment variable overriding the listen address.
pub const BIND_ADDR_ENV: &str = "GCIM_INTAKE_ADDR";
pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 8000);

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,gcim_intake=debug,tower_http=info"
}

/// Listen address from `GCIM_INTAKE_ADDR`, or the default.
pub fn bind_addr() -> SocketAddr {
    parse_bind_addr(std::env::var(BIND_ADDR_ENV).ok().as_deref())
}

fn parse_bind_addr(value: Option<&str>) -> SocketAddr {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => DEFAULT_BIND_ADDR,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!(
                env = BIND_ADDR_ENV,
                value = raw,
                error = %e,
                fallback = %DEFAULT_BIND_ADDR,
                "Invalid listen address, using default"
            );
            DEFAULT_BIND_ADDR
        }),
    }
}
