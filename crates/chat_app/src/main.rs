use std::process::ExitCode;

use chat_app::app::App;
use chat_app::config::ChatConfig;
use chat_app::error::StartupError;
use chat_app::runtime::ChatRuntime;
use chat_app::session::ChatSession;
use chat_app::{logging, providers};
use chat_tui::ProcessTerminal;
use tracing::{error, info};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "fatal");
            eprintln!("fatal: {err}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<(), StartupError> {
    let config = ChatConfig::from_env()?;
    logging::init(&config.log_path)?;
    info!(
        provider = config.provider.as_str(),
        model = %config.model,
        base_url = ?config.base_url,
        timeout = ?config.timeout,
        "starting"
    );

    let provider = providers::provider_for_config(&config)?;
    let app = App::new(ChatSession::new(config.system_instructions.clone()));

    let mut runtime = ChatRuntime::new(ProcessTerminal::new(), app, provider);
    runtime.start().map_err(StartupError::Terminal)?;
    runtime.run_to_completion().map_err(StartupError::Terminal)?;

    info!("exiting");
    Ok(())
}
