mod config;
mod generate;
mod serve;

use std::path::{Path, PathBuf};
use std::process;

use casegen_completion::ChatCompletionClient;
use casegen_core::{extract_bytes, ExtractionResult, GenerationKind};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::generate::{run_generation, GenerationRequest};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// LLM-backed test-case generator.
#[derive(Parser)]
#[command(
    name = "casegen",
    version,
    about = "Generate equivalence classes and test cases with an LLM"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Completion endpoint overrides shared by commands that call the model.
#[derive(Args, Debug, Default)]
struct EndpointArgs {
    /// Chat-completion endpoint URL (overrides CASEGEN_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
    /// Model identifier (overrides CASEGEN_MODEL)
    #[arg(long)]
    model: Option<String>,
    /// Outbound request timeout in seconds (overrides CASEGEN_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web front end and JSON API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Generate test cases for a function or requirement read from a file
    Generate {
        /// What the input is: function source code or a requirement description
        #[arg(long = "type", value_parser = parse_kind)]
        kind: GenerationKind,
        /// Input file ("-" for stdin)
        input: PathBuf,
        /// Stop sequence; the reply is cut at the earliest one (repeatable)
        #[arg(long)]
        stop: Vec<String>,
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Extract the JSON payload from a saved model reply
    Extract {
        /// File holding the raw reply text ("-" for stdin)
        reply: PathBuf,
    },
}

fn parse_kind(raw: &str) -> Result<GenerationKind, String> {
    raw.parse::<GenerationKind>().map_err(|e| e.to_string())
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            endpoint,
        } => {
            let settings = load_settings(endpoint, cli.output, cli.quiet);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    report_error(
                        &format!("failed to create tokio runtime: {}", e),
                        cli.output,
                        cli.quiet,
                    );
                    process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(serve::start_server(&host, port, settings)) {
                report_error(&format!("server error: {}", e), cli.output, cli.quiet);
                process::exit(1);
            }
        }
        Commands::Generate {
            kind,
            input,
            stop,
            endpoint,
        } => {
            cmd_generate(kind, &input, stop, endpoint, cli.output, cli.quiet);
        }
        Commands::Extract { reply } => {
            cmd_extract(&reply, cli.output, cli.quiet);
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(endpoint: EndpointArgs, output: OutputFormat, quiet: bool) -> Settings {
    match Settings::from_env() {
        Ok(settings) => {
            settings.with_overrides(endpoint.base_url, endpoint.model, endpoint.timeout_secs)
        }
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn read_input(path: &Path, output: OutputFormat, quiet: bool) -> Vec<u8> {
    let read = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf).map(|_| buf)
    } else {
        std::fs::read(path)
    };
    match read {
        Ok(bytes) => bytes,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_generate(
    kind: GenerationKind,
    input: &Path,
    stop: Vec<String>,
    endpoint: EndpointArgs,
    output: OutputFormat,
    quiet: bool,
) {
    let bytes = read_input(input, output, quiet);
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: '{}' is not valid UTF-8", input.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    if content.trim().is_empty() {
        let msg = match kind {
            GenerationKind::Function => "No code provided",
            GenerationKind::Requirement => "No requirement provided",
        };
        report_error(msg, output, quiet);
        process::exit(1);
    }

    let settings = load_settings(endpoint, output, quiet);
    let client = ChatCompletionClient::new(settings.client_config());
    let request = GenerationRequest {
        kind,
        content,
        model: settings.default_model.clone(),
        stop,
    };

    match run_generation(&client, &request) {
        Ok(result) => emit_result(&result, output, quiet),
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_extract(reply: &Path, output: OutputFormat, quiet: bool) {
    let bytes = read_input(reply, output, quiet);
    let result = extract_bytes(&bytes);
    emit_result(&result, output, quiet);
}

/// Print a parsed payload on stdout; report a failure and exit 1.
fn emit_result(result: &ExtractionResult, output: OutputFormat, quiet: bool) {
    match result {
        ExtractionResult::Parsed(payload) => {
            let pretty = match output {
                OutputFormat::Json => serde_json::to_string(payload),
                OutputFormat::Text => serde_json::to_string_pretty(payload),
            }
            .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        ExtractionResult::Failed(failure) => {
            match output {
                OutputFormat::Json => {
                    eprintln!("{}", result.to_json());
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("{}", failure.message);
                        if !failure.raw.is_empty() {
                            eprintln!("--- raw reply ---");
                            eprintln!("{}", failure.raw);
                        }
                    }
                }
            }
            process::exit(1);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_kind_and_repeated_stop() {
        let cli = Cli::try_parse_from([
            "casegen",
            "generate",
            "--type",
            "requirement",
            "req.txt",
            "--stop",
            "###",
            "--stop",
            "END",
            "--model",
            "m",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                kind,
                input,
                stop,
                endpoint,
            } => {
                assert_eq!(kind, GenerationKind::Requirement);
                assert_eq!(input, PathBuf::from("req.txt"));
                assert_eq!(stop, vec!["###".to_string(), "END".to_string()]);
                assert_eq!(endpoint.model.as_deref(), Some("m"));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["casegen", "generate", "--type", "module", "x"]).is_err());
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["casegen", "serve"]).unwrap();
        match cli.command {
            Commands::Serve {
                port,
                host,
                endpoint,
            } => {
                assert_eq!(port, 8080);
                assert_eq!(host, "0.0.0.0");
                assert!(endpoint.base_url.is_none());
                assert!(endpoint.timeout_secs.is_none());
            }
            _ => panic!("expected serve"),
        }
    }
}
