//! Interface de linha de comando baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (run, ps, probe)
//! e flags globais (--config, --endpoint, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::logs::LogLevel;
use crate::state_machine::JobRequest;

/// dbt-rpc-runner: submete jobs ao servidor JSON-RPC do dbt e acompanha os logs.
#[derive(Debug, Parser)]
#[command(name = "dbt-rpc-runner", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./dbt-rpc-runner.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Endpoint JSON-RPC; dispensa a sondagem dos candidatos configurados.
    #[arg(long, global = true, env = "DBT_RPC_URL")]
    pub endpoint: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Nível de log aceito pela CLI, mapeado para [`LogLevel`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelArg {
    /// Mostra logs INFO e DEBUG.
    Debug,
    /// Mostra apenas logs INFO.
    Info,
}

impl From<LevelArg> for LogLevel {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Debug => LogLevel::Debug,
            LevelArg::Info => LogLevel::Info,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa uma tarefa (run, test, compile, docs.generate...) e acompanha até o fim.
    Run {
        /// Método RPC a executar.
        task: String,

        /// Seletor de modelos a incluir (ex.: "+orders").
        #[arg(long, short)]
        models: Option<String>,

        /// Seletor de modelos a excluir.
        #[arg(long, short)]
        exclude: Option<String>,

        /// Não executa testes de dados (apenas para `test`).
        #[arg(long)]
        no_data_tests: bool,

        /// Não executa testes de schema (apenas para `test`).
        #[arg(long)]
        no_schema_tests: bool,

        /// Nível mínimo dos logs exibidos.
        #[arg(long, value_enum)]
        log_level: Option<LevelArg>,

        /// Intervalo entre consultas, em milissegundos.
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Desiste após esse tempo, em segundos.
        #[arg(long)]
        max_wait_secs: Option<u64>,
    },

    /// Lista as tarefas conhecidas pelo servidor.
    Ps {
        /// Inclui tarefas concluídas.
        #[arg(long, short)]
        all: bool,
    },

    /// Mostra qual endpoint seria usado.
    Probe,
}

impl Command {
    /// Monta o [`JobRequest`] de um subcomando `run`.
    pub fn job_request(&self) -> Option<JobRequest> {
        match self {
            Command::Run {
                task,
                models,
                exclude,
                no_data_tests,
                no_schema_tests,
                ..
            } => {
                let mut request = JobRequest::new(task.clone())
                    .data_tests(!no_data_tests)
                    .schema_tests(!no_schema_tests);
                request.models = models.clone();
                request.exclude = exclude.clone();
                Some(request)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::parse_from(["dbt-rpc-runner", "run", "test", "--models", "+orders"]);
        let request = cli.command.job_request().unwrap();
        assert_eq!(request.task, "test");
        assert_eq!(request.models.as_deref(), Some("+orders"));
        assert!(request.exclude.is_none());
        assert!(request.run_data_tests);
        assert!(request.run_schema_tests);
    }

    #[test]
    fn cli_parses_test_flags() {
        let cli = Cli::parse_from([
            "dbt-rpc-runner",
            "run",
            "test",
            "--no-schema-tests",
            "--log-level",
            "debug",
            "--max-wait-secs",
            "600",
        ]);
        let request = cli.command.job_request().unwrap();
        assert!(request.run_data_tests);
        assert!(!request.run_schema_tests);
        match cli.command {
            Command::Run {
                log_level,
                max_wait_secs,
                ..
            } => {
                assert!(matches!(log_level, Some(LevelArg::Debug)));
                assert_eq!(max_wait_secs, Some(600));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "dbt-rpc-runner",
            "--endpoint",
            "http://localhost:8580/jsonrpc",
            "--verbose",
            "ps",
            "--all",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:8580/jsonrpc"));
        assert!(matches!(cli.command, Command::Ps { all: true }));
        assert!(cli.command.job_request().is_none());
    }

    #[test]
    fn level_arg_maps_to_log_level() {
        assert_eq!(LogLevel::from(LevelArg::Debug), LogLevel::Debug);
        assert_eq!(LogLevel::from(LevelArg::Info), LogLevel::Info);
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
