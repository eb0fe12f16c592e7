use actix_web::{dev::ServiceRequest, http::header::HeaderMap, HttpRequest};
use std::net::SocketAddr;

pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract the client's IP address from the request, considering X-Forwarded-For if trusted
/// `trust_x_forwarded_for`: whether to trust the X-Forwarded-For header
pub fn get_client_ip(req: &HttpRequest, trust_x_forwarded_for: bool) -> String {
    resolve_client_ip(req.headers(), req.peer_addr(), trust_x_forwarded_for)
}

/// Same as [`get_client_ip`], for middleware that only holds a `ServiceRequest`.
pub fn get_service_client_ip(req: &ServiceRequest, trust_x_forwarded_for: bool) -> String {
    resolve_client_ip(req.headers(), req.peer_addr(), trust_x_forwarded_for)
}

fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_x_forwarded_for: bool) -> String {
    if trust_x_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
