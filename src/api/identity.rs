//! Client identity resolution
//!
//! Resolves the caller's network address from proxy headers or the peer
//! address. A caller whose identity cannot be resolved is unthrottled: the
//! quota guard is skipped for that request.

use actix_web::HttpRequest;
use std::net::IpAddr;

/// Header carrying the quota bypass key.
pub const PRO_KEY_HEADER: &str = "X-PRO-KEY";

/// Extract client IP from request
pub fn extract_client_ip(req: &HttpRequest) -> Option<IpAddr> {
    // Try X-Forwarded-For first (for proxied requests)
    if let Some(forwarded) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // X-Forwarded-For may contain multiple IPs, take the first (client)
            if let Some(first_ip) = forwarded_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    // Try X-Real-IP
    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    // Fall back to connection info
    req.peer_addr().map(|addr| addr.ip())
}

/// Extract the presented pro key, if any.
pub fn extract_pro_key(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(PRO_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn forwarded_for_takes_precedence() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "1.2.3.4, 10.0.0.1"))
            .insert_header(("X-Real-IP", "5.6.7.8"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), Some("1.2.3.4".parse().unwrap()));
    }

    #[test]
    fn real_ip_is_second_choice() {
        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "5.6.7.8"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), Some("5.6.7.8".parse().unwrap()));
    }

    #[test]
    fn garbage_headers_resolve_to_nothing() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "not-an-ip"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), None);
    }

    #[test]
    fn pro_key_header_roundtrip() {
        let req = TestRequest::default()
            .insert_header((PRO_KEY_HEADER, "secret"))
            .to_http_request();
        assert_eq!(extract_pro_key(&req).as_deref(), Some("secret"));

        let bare = TestRequest::default().to_http_request();
        assert_eq!(extract_pro_key(&bare), None);
    }
}
