//! Client identity resolution from proxy headers and the transport peer.
//!
//! Resolution is a best-effort heuristic over untrusted headers. It only
//! yields a meaningful identity when the server sits behind a reverse proxy
//! that overwrites these headers.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";
const CF_CONNECTING_IP: &str = "cf-connecting-ip";
const REAL_IP: &str = "x-real-ip";

const IPV4_MAPPED_PREFIX: &str = "::ffff:";

pub const UNKNOWN_CLIENT: &str = "unknown";

/// First value of a possibly repeated header, if it is readable text.
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get_all(name).iter().next()?.to_str().ok()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Resolve the client IP, most proxy-specific source first.
///
/// Order: `X-Forwarded-For` (first hop), `CF-Connecting-IP`, `X-Real-IP`,
/// then the peer address. Falls back to [`UNKNOWN_CLIENT`]. A blank
/// forwarded-for first hop moves on to the next source instead of resolving
/// to [`UNKNOWN_CLIENT`].
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let forwarded = first_value(headers, FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .and_then(|v| non_empty(v.trim()));

    forwarded
        .or_else(|| first_value(headers, CF_CONNECTING_IP).and_then(non_empty))
        .or_else(|| first_value(headers, REAL_IP).and_then(non_empty))
        .or_else(|| {
            peer.and_then(|ip| {
                let text = ip.to_string();
                let text = text.strip_prefix(IPV4_MAPPED_PREFIX).unwrap_or(&text);
                non_empty(text)
            })
        })
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Ledger key for a login input seen from a client IP.
pub fn build_identifier(login_input: &str, ip: &str) -> String {
    format!("{}:{}", login_input.to_lowercase(), ip)
}

/// Client IP resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientIp(extract_client_ip(&parts.headers, peer)))
    }
}
