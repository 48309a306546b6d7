// ABOUTME: Per-request header generation with a randomly rotated User-Agent.
// ABOUTME: Adds Host and Origin derived from the configured site origin plus any custom headers.

use std::collections::HashMap;

use rand::seq::SliceRandom;

use crate::options::Options;

/// Header name/value pairs sent with a single request.
pub type HeaderSet = HashMap<String, String>;

/// Build a fresh header set for one request.
///
/// The User-Agent is drawn at random from `opts.user_agents`; custom headers
/// in `opts.headers` are applied last and override the generated ones.
pub fn request_headers(opts: &Options) -> HeaderSet {
    let mut headers = HeaderSet::new();

    if let Some(agent) = opts.user_agents.choose(&mut rand::thread_rng()) {
        headers.insert("User-Agent".to_string(), agent.clone());
    }

    if let Ok(base) = url::Url::parse(&opts.base_url) {
        if let Some(host) = base.host_str() {
            let host = match base.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            headers.insert("Host".to_string(), host);
        }
        headers.insert(
            "Origin".to_string(),
            base.origin().ascii_serialization(),
        );
    }

    for (key, value) in &opts.headers {
        headers.insert(key.clone(), value.clone());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_target_site() {
        let opts = Options::default();
        let headers = request_headers(&opts);
        assert_eq!(headers.get("Host").map(String::as_str), Some("www.goodreads.com"));
        assert_eq!(
            headers.get("Origin").map(String::as_str),
            Some("https://www.goodreads.com")
        );
        let agent = headers.get("User-Agent").unwrap();
        assert!(opts.user_agents.contains(agent));
    }

    #[test]
    fn test_host_keeps_explicit_port() {
        let opts = Options::builder().base_url("http://127.0.0.1:8080").build();
        let headers = request_headers(&opts);
        assert_eq!(headers.get("Host").map(String::as_str), Some("127.0.0.1:8080"));
        assert_eq!(
            headers.get("Origin").map(String::as_str),
            Some("http://127.0.0.1:8080")
        );
    }

    #[test]
    fn test_empty_agent_pool_omits_user_agent() {
        let opts = Options::builder().user_agents(Vec::<String>::new()).build();
        let headers = request_headers(&opts);
        assert!(!headers.contains_key("User-Agent"));
    }

    #[test]
    fn test_custom_headers_override() {
        let opts = Options::builder()
            .user_agents(["a"])
            .header("User-Agent", "fixed")
            .build();
        let headers = request_headers(&opts);
        assert_eq!(headers.get("User-Agent").map(String::as_str), Some("fixed"));
    }
}
