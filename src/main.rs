//! Vivavoce CLI entry point

use std::process::ExitCode;

use clap::Parser;

use vivavoce::cli::{
    app::{run_chat, run_live, run_login, run_record, run_scenarios, run_transcribe, EXIT_ERROR},
    args::{Cli, Commands, LiveOptions},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use vivavoce::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    match cli.command {
        Some(Commands::Chat { message, tier }) => run_chat(&message, tier.map(Into::into)).await,
        Some(Commands::Transcribe { file }) => run_transcribe(&file).await,
        Some(Commands::Record { output, upload }) => run_record(output, upload).await,
        Some(Commands::Login {
            email,
            password,
            guest,
        }) => run_login(email, password, guest).await,
        Some(Commands::Scenarios) => run_scenarios(),
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        None => {
            let options = LiveOptions {
                scenario: cli.scenario,
                model: cli.model,
                muted: cli.muted,
                video: cli.video.map(Into::into),
                camera_frames: cli.camera_frames,
                screen_frames: cli.screen_frames,
            };
            run_live(options).await
        }
    }
}
