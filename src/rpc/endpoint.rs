use reqwest::Client;
use tracing::{debug, info};

use super::error::RpcError;

/// Default candidates: the container-network host first, then localhost.
pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "http://dbt-rpc-server:8580/jsonrpc",
    "http://localhost:8580/jsonrpc",
];

/// Returns the first candidate that answers a GET with a 2xx status.
///
/// Connection failures, timeouts and error statuses move on to the next
/// candidate. Errors building the request (e.g. a malformed URL) are returned
/// as-is since trying the remaining candidates would not fix them.
pub async fn resolve_endpoint(client: &Client, candidates: &[String]) -> Result<String, RpcError> {
    for url in candidates {
        match client
            .get(url)
            .header("content-type", "application/json")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(endpoint = %url, "using RPC endpoint");
                return Ok(url.clone());
            }
            Ok(response) => {
                debug!(endpoint = %url, status = response.status().as_u16(), "endpoint answered with error status");
            }
            Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                debug!(endpoint = %url, error = %e, "endpoint unreachable");
            }
            Err(e) => return Err(RpcError::Transport(e)),
        }
    }

    Err(RpcError::Unreachable {
        candidates: candidates.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEAD: &str = "http://127.0.0.1:1/jsonrpc";

    async fn server_with_status(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn first_responsive_candidate_wins() {
        let primary = server_with_status(200).await;
        let fallback = server_with_status(200).await;
        let candidates = vec![
            format!("{}/jsonrpc", primary.uri()),
            format!("{}/jsonrpc", fallback.uri()),
        ];

        let url = resolve_endpoint(&Client::new(), &candidates).await.unwrap();
        assert_eq!(url, candidates[0]);
    }

    #[tokio::test]
    async fn falls_back_when_primary_refuses_connection() {
        let fallback = server_with_status(200).await;
        let candidates = vec![DEAD.to_string(), format!("{}/jsonrpc", fallback.uri())];

        let url = resolve_endpoint(&Client::new(), &candidates).await.unwrap();
        assert_eq!(url, candidates[1]);
    }

    #[tokio::test]
    async fn skips_candidate_with_error_status() {
        let broken = server_with_status(503).await;
        let healthy = server_with_status(200).await;
        let candidates = vec![
            format!("{}/jsonrpc", broken.uri()),
            format!("{}/jsonrpc", healthy.uri()),
        ];

        let url = resolve_endpoint(&Client::new(), &candidates).await.unwrap();
        assert_eq!(url, candidates[1]);
    }

    #[tokio::test]
    async fn no_reachable_candidate() {
        let candidates = vec![DEAD.to_string()];
        let err = resolve_endpoint(&Client::new(), &candidates).await.unwrap_err();
        assert!(matches!(err, RpcError::Unreachable { ref candidates } if candidates.len() == 1));
    }

    #[tokio::test]
    async fn empty_candidate_list() {
        let err = resolve_endpoint(&Client::new(), &[]).await.unwrap_err();
        assert!(matches!(err, RpcError::Unreachable { .. }));
    }

    #[test]
    fn default_endpoints_prefer_container_host() {
        assert!(DEFAULT_ENDPOINTS[0].contains("dbt-rpc-server"));
        assert!(DEFAULT_ENDPOINTS[1].contains("localhost"));
    }
}
