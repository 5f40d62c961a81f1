use std::io::Write;
use std::process::ExitCode;

use futures_util::StreamExt;
use ollama_adapter::config::{load_config_or_default, AppConfig};
use ollama_adapter::observability::init_tracing;
use ollama_adapter::protocol::unified::{Content, GenerateContentRequest};
use ollama_adapter::{AdapterError, ContentGenerator, OllamaContentGenerator};

const CONFIG_PATH: &str = "config.yaml";
const USAGE: &str = "usage: ollama-adapter [--stream] <prompt...>";

struct CliArgs {
    stream: bool,
    prompt: String,
}

fn parse_args<I>(args: I) -> Option<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut stream = false;
    let mut words = Vec::new();
    for arg in args {
        if arg == "--stream" {
            stream = true;
        } else {
            words.push(arg);
        }
    }
    if words.is_empty() {
        return None;
    }
    Some(CliArgs {
        stream,
        prompt: words.join(" "),
    })
}

fn main() -> ExitCode {
    let Some(args) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let config = match load_config_or_default(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.features.log_level);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to build tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&config, args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &AppConfig, args: CliArgs) -> Result<(), AdapterError> {
    let generator = OllamaContentGenerator::new(config)?;
    tracing::info!(
        base_url = generator.base_url(),
        model = generator.default_model(),
        stream = args.stream,
        "starting generation"
    );

    let request = GenerateContentRequest {
        model: None,
        contents: Content::user_text(args.prompt).into(),
        config: None,
    };
    let prompt_id = format!("cli-{}", std::process::id());

    let mut stdout = std::io::stdout();
    if args.stream {
        let mut stream = generator.generate_content_stream(&request, &prompt_id).await?;
        while let Some(partial) = stream.next().await {
            let _ = write!(stdout, "{}", partial?.text());
            let _ = stdout.flush();
        }
        let _ = writeln!(stdout);
    } else {
        let response = generator.generate_content(&request, &prompt_id).await?;
        let _ = writeln!(stdout, "{}", response.text());
    }
    Ok(())
}
