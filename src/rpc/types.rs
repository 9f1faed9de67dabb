//! Tipos de dados para requisições e respostas do servidor JSON-RPC do dbt.
//!
//! O envelope de requisição segue o JSON-RPC 2.0. As respostas são
//! desserializadas em structs tipadas para que campos ausentes virem
//! erros explícitos em vez de acessos inválidos.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::RpcError;

/// Versão do protocolo enviada em todo envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Envelope de requisição JSON-RPC.
///
/// O `id` é um UUID v4 novo a cada chamada e serve apenas para correlacionar
/// a resposta com a requisição em andamento.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcEnvelope {
    pub jsonrpc: String,
    pub method: String,
    pub id: String,
    pub params: Value,
}

impl RpcEnvelope {
    /// Monta um envelope para `method` com um id recém-gerado.
    ///
    /// `params` precisa serializar como objeto; `()` ou `null` viram `{}`.
    pub fn new(method: impl Into<String>, params: impl Serialize) -> Result<Self, serde_json::Error> {
        let params = match serde_json::to_value(params)? {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        Ok(Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            id: Uuid::new_v4().to_string(),
            params,
        })
    }
}

/// Objeto `error` de uma resposta JSON-RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Resposta JSON-RPC bruta: exatamente um entre `result` e `error` deveria vir preenchido.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Extrai o `result`, convertendo `error` ou ausência de resultado em [`RpcError`].
    pub fn into_result(self, method: &str) -> Result<Value, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Remote {
                method: method.to_string(),
                code: err.code,
                message: err.message,
            });
        }
        self.result
            .ok_or_else(|| RpcError::shape(method, "missing field `result`"))
    }
}

/// Parâmetros de submissão de um job (`run`, `test`, `compile`, `docs.generate`...).
///
/// Campos `None` são omitidos do JSON: o servidor diferencia chave ausente
/// de chave presente com string vazia.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    /// Executa testes de dados (apenas para `test`).
    #[serde(default, rename = "data", skip_serializing_if = "Option::is_none")]
    pub run_data_tests: Option<bool>,
    /// Executa testes de schema (apenas para `test`).
    #[serde(default, rename = "schema", skip_serializing_if = "Option::is_none")]
    pub run_schema_tests: Option<bool>,
}

impl JobParameters {
    /// Cria os parâmetros descartando seletores vazios.
    pub fn new(models: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            models: non_empty(models),
            exclude: non_empty(exclude),
            run_data_tests: None,
            run_schema_tests: None,
        }
    }

    /// Anexa as flags de testes de dados e de schema.
    pub fn with_tests(mut self, data: bool, schema: bool) -> Self {
        self.run_data_tests = Some(data);
        self.run_schema_tests = Some(schema);
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parâmetros do método `ps`.
#[derive(Debug, Clone, Serialize)]
pub struct PsParams {
    /// Inclui tarefas já concluídas na listagem.
    pub completed: bool,
}

/// Parâmetros do método `poll`.
#[derive(Debug, Clone, Serialize)]
pub struct PollParams {
    pub request_token: String,
    pub logs: bool,
    /// Posição a partir da qual o servidor deve devolver os logs.
    pub logs_start: usize,
}

/// `result` da submissão de um job.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResult {
    pub request_token: String,
}

/// `result` do método `ps`.
#[derive(Debug, Clone, Deserialize)]
pub struct PsResult {
    pub rows: Vec<TaskRow>,
}

/// Uma linha da listagem `ps`: uma tarefa em execução ou concluída no servidor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    pub task_id: String,
    pub state: TaskState,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub elapsed: Option<f64>,
}

/// `result` do método `poll`.
#[derive(Debug, Clone, Deserialize)]
pub struct PollResult {
    pub logs: Vec<LogEntry>,
}

/// Uma linha de log emitida pelo servidor para a tarefa.
///
/// Somente `message` e `levelname` são obrigatórios; o resto é informativo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub message: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
    pub levelname: String,
    #[serde(default)]
    pub thread_name: Option<String>,
    #[serde(default)]
    pub process: Option<i64>,
    #[serde(default)]
    pub extra: Map<String, Value>,
    #[serde(default)]
    pub exc_info: Option<Value>,
}

impl LogEntry {
    /// Timestamp ISO-8601 interpretado, se presente e válido.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Estado de uma tarefa remota como reportado por `ps`.
///
/// Qualquer estado diferente de `running` é terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    Running,
    Success,
    Error,
    Other(String),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskState::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Running => "running",
            TaskState::Success => "success",
            TaskState::Error => "error",
            TaskState::Other(s) => s,
        }
    }
}

impl From<String> for TaskState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => TaskState::Running,
            "success" => TaskState::Success,
            "error" => TaskState::Error,
            _ => TaskState::Other(value),
        }
    }
}

impl From<TaskState> for String {
    fn from(value: TaskState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
