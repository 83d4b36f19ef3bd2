//! Client attribution for incoming requests.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

use crate::domain::ClientId;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Identify the client a request is attributed to.
///
/// With `trust_forwarded_for`, the first `X-Forwarded-For` entry wins.
/// Otherwise the peer IP is used, falling back to [`ClientId::UNKNOWN`] when
/// the transport exposes no address.
pub fn client_id(request: &Request, trust_forwarded_for: bool) -> ClientId {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());
        if let Some(first) = forwarded {
            return ClientId::new(first);
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(
            || ClientId::new(ClientId::UNKNOWN),
            |ConnectInfo(addr)| ClientId::new(addr.ip().to_string()),
        )
}
