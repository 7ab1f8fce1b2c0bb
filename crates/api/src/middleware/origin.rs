//! Scheme and host of the incoming request, for building absolute URLs.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use storefront_core::image_url::RequestOrigin;

use crate::state::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The request origin, `None` when no host can be determined.
///
/// The `Host` header wins over the request URI. Proxy headers
/// (`X-Forwarded-Proto`, `X-Forwarded-Host`) are only consulted when
/// `trust_proxy` is set.
#[derive(Debug, Clone)]
pub struct ClientOrigin(pub Option<RequestOrigin>);

impl ClientOrigin {
    pub fn from_parts(parts: &Parts, trust_proxy: bool) -> Self {
        let forwarded = |name: &str| {
            if trust_proxy {
                first_value(&parts.headers, name)
            } else {
                None
            }
        };

        let host = forwarded(FORWARDED_HOST)
            .or_else(|| first_value(&parts.headers, HOST.as_str()))
            .or_else(|| parts.uri.authority().map(|a| a.as_str()));

        let Some(host) = host else {
            return ClientOrigin(None);
        };

        let scheme = forwarded(FORWARDED_PROTO)
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http");

        ClientOrigin(Some(RequestOrigin::new(scheme.to_ascii_lowercase(), host)))
    }

    pub fn origin(&self) -> Option<&RequestOrigin> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for ClientOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientOrigin::from_parts(parts, state.config.trust_proxy_headers))
    }
}
