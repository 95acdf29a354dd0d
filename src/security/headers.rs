//! Header sanitization for forwarded requests.
//!
//! The only header removed is the credential header; everything else,
//! including repeated values, is copied in order.

use axum::http::{HeaderMap, HeaderName};

/// Copy `inbound` minus every value of `credential`. The input is untouched.
pub fn sanitize_headers(inbound: &HeaderMap, credential: &HeaderName) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if name == credential {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }
    outbound
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn credential() -> HeaderName {
        HeaderName::from_static("x-api-key")
    }

    #[test]
    fn strips_credential_regardless_of_casing() {
        for name in ["X-API-Key", "x-api-key", "X-Api-Key"] {
            let mut inbound = HeaderMap::new();
            inbound.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static("secret123"),
            );
            inbound.insert("accept", HeaderValue::from_static("*/*"));

            let outbound = sanitize_headers(&inbound, &credential());
            assert!(outbound.get("x-api-key").is_none(), "{name}");
            assert_eq!(outbound["accept"], "*/*");
        }
    }

    #[test]
    fn preserves_multi_valued_headers_in_order() {
        let mut inbound = HeaderMap::new();
        inbound.append("x-trace", HeaderValue::from_static("a"));
        inbound.append("x-trace", HeaderValue::from_static("b"));
        inbound.append("x-api-key", HeaderValue::from_static("one"));
        inbound.append("x-api-key", HeaderValue::from_static("two"));

        let outbound = sanitize_headers(&inbound, &credential());
        let traces: Vec<_> = outbound.get_all("x-trace").iter().collect();
        assert_eq!(traces, ["a", "b"]);
        assert_eq!(outbound.len(), 2);
    }

    #[test]
    fn leaves_input_unchanged() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-api-key", HeaderValue::from_static("secret123"));
        inbound.insert("content-type", HeaderValue::from_static("application/json"));
        let before = inbound.clone();

        let _ = sanitize_headers(&inbound, &credential());
        assert_eq!(inbound, before);
    }
}
