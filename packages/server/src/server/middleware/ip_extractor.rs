use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Extension key for storing extracted IP address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Client IP from proxy headers, else the socket address.
///
/// Priority:
/// 1. X-Forwarded-For header (for requests through proxies, first entry)
/// 2. X-Real-IP header (for Nginx)
/// 3. ConnectInfo socket address (direct connection)
pub fn client_ip_from(headers: &HeaderMap, socket: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        forwarded
            .to_str()
            .ok()
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    } else if let Some(real_ip) = headers.get("x-real-ip") {
        real_ip.to_str().ok().and_then(|s| s.trim().parse::<IpAddr>().ok())
    } else {
        socket.map(|addr| addr.ip())
    }
}

/// Middleware to extract client IP address from request
///
/// Stores [`ClientIp`] in request extensions when one could be determined.
pub async fn extract_client_ip(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket = connect_info.map(|ConnectInfo(addr)| addr);

    if let Some(ip) = client_ip_from(request.headers(), socket) {
        request.extensions_mut().insert(ClientIp(ip));
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn socket() -> Option<SocketAddr> {
        Some("10.0.0.9:5000".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_ip_from(&headers, socket()), Some("203.0.113.7".parse().unwrap()));
    }

    #[test]
    fn test_real_ip_then_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip_from(&headers, socket()), Some("198.51.100.2".parse().unwrap()));

        assert_eq!(client_ip_from(&HeaderMap::new(), socket()), Some("10.0.0.9".parse().unwrap()));
        assert_eq!(client_ip_from(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_garbage_forwarded_for_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip_from(&headers, socket()), None);
    }
}
