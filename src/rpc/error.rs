//! Tipos de erro para o cliente JSON-RPC do servidor dbt.
//!
//! Define [`RpcError`] separando falhas de transporte (rede, status HTTP)
//! de respostas válidas cujo formato não é o esperado. Nenhuma falha é
//! convertida silenciosamente em um payload vazio.

use thiserror::Error;

/// Erros que podem ocorrer ao conversar com o servidor JSON-RPC.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// O servidor respondeu com um status HTTP fora da faixa 2xx.
    #[error("HTTP error (status {status}): {body}")]
    Status { status: u16, body: String },

    /// O corpo da resposta não é um envelope JSON-RPC válido.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// O servidor devolveu um objeto `error` do JSON-RPC.
    #[error("RPC error {code} from `{method}`: {message}")]
    Remote {
        method: String,
        code: i64,
        message: String,
    },

    /// O `result` está ausente ou não tem o formato esperado para o método.
    #[error("unexpected `{method}` response: {detail}")]
    Shape { method: String, detail: String },

    /// Nenhum dos endpoints candidatos respondeu à sondagem.
    #[error("no reachable RPC endpoint among [{}]", candidates.join(", "))]
    Unreachable { candidates: Vec<String> },
}

impl RpcError {
    pub fn shape(method: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Shape {
            method: method.into(),
            detail: detail.into(),
        }
    }

    /// Verdadeiro quando a falha aconteceu antes de qualquer resposta do servidor.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Unreachable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = RpcError::Status {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP error (status 502): Bad Gateway");
    }

    #[test]
    fn remote_display() {
        let err = RpcError::Remote {
            method: "run".into(),
            code: -32000,
            message: "Server error".into(),
        };
        assert_eq!(err.to_string(), "RPC error -32000 from `run`: Server error");
    }

    #[test]
    fn unreachable_lists_candidates() {
        let err = RpcError::Unreachable {
            candidates: vec!["http://a:1/jsonrpc".into(), "http://b:2/jsonrpc".into()],
        };
        assert_eq!(
            err.to_string(),
            "no reachable RPC endpoint among [http://a:1/jsonrpc, http://b:2/jsonrpc]"
        );
        assert!(err.is_transport());
    }

    #[test]
    fn shape_is_not_transport() {
        let err = RpcError::shape("ps", "missing field `rows`");
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "unexpected `ps` response: missing field `rows`");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RpcError>();
    }
}
