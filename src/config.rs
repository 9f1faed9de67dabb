//! Configuração do runner carregada a partir de `dbt-rpc-runner.toml`.
//!
//! A struct [`RunnerConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `DBT_RPC_URL` tem precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RunnerError;
use crate::logs::LogLevel;
use crate::rpc::{DEFAULT_ENDPOINTS, TransportSettings};

/// Nome do arquivo procurado no diretório atual.
pub const CONFIG_FILE: &str = "dbt-rpc-runner.toml";

/// Variável de ambiente que fixa o endpoint, dispensando a lista de candidatos.
pub const URL_ENV: &str = "DBT_RPC_URL";

/// Configuração de nível superior carregada de `dbt-rpc-runner.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Endpoints candidatos, sondados em ordem.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Intervalo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Tempo máximo de espera pelo job; ausente significa sem limite.
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    /// Nível mínimo dos logs do servidor exibidos.
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Servidor na rede de containers primeiro, depois localhost.
fn default_endpoints() -> Vec<String> {
    DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect()
}

// Valor padrão do intervalo de polling: 2000ms.
fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: None,
            log_level: LogLevel::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl RunnerConfig {
    /// Carrega a configuração de `dbt-rpc-runner.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, RunnerError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito, aplicando `DBT_RPC_URL`.
    pub fn load_from(path: &Path) -> Result<Self, RunnerError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<RunnerConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(URL_ENV) {
            config.apply_endpoint_override(&url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Substitui a lista de candidatos por um único endpoint, se não vazio.
    pub fn apply_endpoint_override(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.endpoints = vec![url.to_string()];
        }
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.endpoints.is_empty() {
            return Err(RunnerError::Config("at least one endpoint is required".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(RunnerError::Config("poll_interval_ms must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    pub fn transport(&self) -> TransportSettings {
        TransportSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
