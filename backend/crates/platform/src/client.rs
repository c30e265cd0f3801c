//! Client identification utilities
//!
//! Helpers for identifying the client behind a request: IP extraction
//! through reverse proxies and a coarse device description derived from
//! the User-Agent header (stored alongside refresh tokens so users can
//! recognize their own sessions).

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Maximum stored length for a device description
const MAX_DEVICE_INFO_LEN: usize = 255;

/// Extract client IP address from headers
///
/// Checks the X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to the direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // First IP in the list is the original client
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Derive a device description from the User-Agent header
///
/// Truncated to a storable length; absent or unreadable headers yield
/// a placeholder rather than an error.
pub fn device_info(headers: &HeaderMap) -> String {
    let ua = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown device");

    ua.chars().take(MAX_DEVICE_INFO_LEN).collect()
}
