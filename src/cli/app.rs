//! Command runners

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::application::ports::{ClipSpec, ConfigStore, MicCapture};
use crate::application::{
    ChatOrchestrator, ClipExporter, ClipRecorder, IdentitySession, LiveSessionOrchestrator,
    REPLY_FAILURE_PLACEHOLDER,
};
use crate::domain::audio::{AudioData, AudioMimeType, INPUT_SAMPLE_RATE};
use crate::domain::chat::ModelTier;
use crate::domain::config::AppConfig;
use crate::domain::live::{InputSource, LiveStatus, Scenario};
use crate::infrastructure::{
    default_encoders, CpalMicCapture, DriveClient, FrameDirDevice, GeminiChatModel,
    GeminiLiveConnector, IdentityClient, OAuthTokenBroker, RodioSpeechPlayer, XdgConfigStore,
};

use super::args::LiveOptions;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Get API key from environment or config file
pub async fn get_api_key() -> Result<String, String> {
    if let Ok(key) = env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    let store = XdgConfigStore::new();
    let config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    config.api_key.ok_or_else(|| {
        "Missing API key. Set GEMINI_API_KEY environment variable or run 'vivavoce config set api_key <key>'".to_string()
    })
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    let env_config = AppConfig {
        api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

/// Run a live voice session until Ctrl-C or the session ends
pub async fn run_live(options: LiveOptions) -> ExitCode {
    let presenter = Presenter::new();

    let api_key = match get_api_key().await {
        Ok(key) => key,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let config = load_merged_config(AppConfig {
        live_model: options.model.clone(),
        ..Default::default()
    })
    .await;

    // Scenario selects the system instruction and the default video input.
    let scenario = match options.scenario.as_deref() {
        Some(id) => match Scenario::find(id) {
            Some(scenario) => Some(scenario),
            None => {
                presenter.error(&format!(
                    "Unknown scenario \"{}\". Run 'vivavoce scenarios' to list them.",
                    id
                ));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => None,
    };
    let instruction = scenario.map(|s| s.system_instruction);
    let video_input = options
        .video
        .or_else(|| scenario.map(|s| s.input))
        .unwrap_or(InputSource::None);

    let player = match RodioSpeechPlayer::new() {
        Ok(player) => player,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut orchestrator = LiveSessionOrchestrator::new(
        Arc::new(GeminiLiveConnector::new(api_key)),
        Arc::new(CpalMicCapture::new()),
        Arc::new(FrameDirDevice::new(
            options.camera_frames.clone(),
            options.screen_frames.clone(),
        )),
        Arc::new(player),
    )
    .with_voice(config.voice_or_default());
    orchestrator.set_error_hook(Arc::new(|message| {
        Presenter::new().error(&format!("Session error: {}", message));
    }));

    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    let mut status_rx = orchestrator.status();

    if let Err(e) = orchestrator
        .connect(config.live_model_or_default(), instruction)
        .await
    {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    if options.muted {
        orchestrator.toggle_mic();
        presenter.info("Microphone muted");
    }
    if video_input != InputSource::None {
        orchestrator.start_video_stream(video_input);
        presenter.info(&format!("Forwarding {} snapshots", video_input));
    }

    if let Some(scenario) = scenario {
        presenter.info(&format!("{} {}", scenario.icon, scenario.title));
    }
    presenter.info("Connected. Press Ctrl-C to hang up.");
    presenter.live_status(orchestrator.current_status());

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                presenter.live_status(status);
                if status == LiveStatus::Inactive {
                    break;
                }
            }
        }
    }

    orchestrator.disconnect();
    presenter.info("Session ended");
    ExitCode::from(EXIT_SUCCESS)
}

/// Send one chat message and print the reply
pub async fn run_chat(message: &str, tier: Option<ModelTier>) -> ExitCode {
    let mut presenter = Presenter::new();

    let api_key = match get_api_key().await {
        Ok(key) => key,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let config = load_merged_config(AppConfig::empty()).await;
    let tier = tier.unwrap_or_else(|| config.tier_or_default());

    let chat = ChatOrchestrator::new(GeminiChatModel::new(api_key));

    presenter.start_spinner(&format!("Asking {}...", tier.model_id()));
    chat.send_message(message, tier).await;
    presenter.stop_spinner();

    let messages = chat.messages();
    let Some(reply) = messages.last() else {
        presenter.error("No reply");
        return ExitCode::from(EXIT_ERROR);
    };

    presenter.chat_reply(&reply.text, reply.thoughtful);
    if reply.text == REPLY_FAILURE_PLACEHOLDER {
        return ExitCode::from(EXIT_ERROR);
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Transcribe an audio file
pub async fn run_transcribe(file: &PathBuf) -> ExitCode {
    let mut presenter = Presenter::new();

    let Some(mime) = file
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioMimeType::from_extension)
    else {
        presenter.error("Unsupported audio file type (expected flac, wav, ogg, mp3, or webm)");
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    let bytes = match tokio::fs::read(file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            presenter.error(&format!("Failed to read {}: {}", file.display(), e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let api_key = match get_api_key().await {
        Ok(key) => key,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let chat = ChatOrchestrator::new(GeminiChatModel::new(api_key));

    presenter.start_spinner("Transcribing...");
    let result = chat
        .transcribe_audio(&AudioData::new(bytes, mime))
        .await;
    presenter.stop_spinner();

    match result {
        Ok(text) => {
            presenter.output(&text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Record the microphone until Ctrl-C, then export the clip
pub async fn run_record(output: Option<PathBuf>, upload: bool) -> ExitCode {
    let presenter = Presenter::new();

    let mut recorder = match ClipRecorder::new(default_encoders(), ClipSpec::mono(INPUT_SAMPLE_RATE))
    {
        Ok(recorder) => recorder,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let capture = CpalMicCapture::new();
    let (handle, mut frames) = match capture.open().await {
        Ok(opened) => opened,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let shutdown = ShutdownSignal::new();
    shutdown.setup();
    presenter.info("Recording... Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            frame = frames.recv() => {
                match frame {
                    Some(frame) => recorder.push_frame(&frame),
                    None => break,
                }
            }
        }
    }
    handle.stop();

    let clip = match recorder.stop() {
        Ok(clip) => clip,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    presenter.info(&format!(
        "Captured {} ({})",
        clip.suggested_name,
        clip.audio.human_readable_size()
    ));

    if upload {
        return upload_clip(&presenter, &clip).await;
    }

    let path = output.unwrap_or_else(|| PathBuf::from(&clip.suggested_name));
    match clip.save_to(&path).await {
        Ok(()) => {
            presenter.success(&format!("Saved to {}", path.display()));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Upload a finished clip to the configured cloud drive
async fn upload_clip(
    presenter: &Presenter,
    clip: &crate::application::RecordedClip,
) -> ExitCode {
    let config = load_merged_config(AppConfig::empty()).await;
    let Some(drive) = config.drive else {
        presenter.error(
            "Drive upload is not configured. Set drive.client_id, drive.client_secret, and drive.refresh_token.",
        );
        return ExitCode::from(EXIT_USAGE_ERROR);
    };
    let (Some(client_id), Some(client_secret), Some(refresh_token)) =
        (drive.client_id, drive.client_secret, drive.refresh_token)
    else {
        presenter.error(
            "Drive upload is not configured. Set drive.client_id, drive.client_secret, and drive.refresh_token.",
        );
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    let exporter = ClipExporter::new(
        OAuthTokenBroker::new(client_id, client_secret, refresh_token),
        DriveClient::new(),
    );

    let bar = presenter.upload_bar();
    let bar_clone = bar.clone();
    let result = exporter
        .upload(
            clip,
            Some(Arc::new(move |progress| {
                bar_clone.set_position(progress.round() as u64);
            })),
        )
        .await;
    bar.finish_and_clear();

    match result {
        Ok(file_id) => {
            presenter.success(&format!("Uploaded to drive (file id: {})", file_id));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Sign in against the identity backend (state lasts for this run only)
pub async fn run_login(email: Option<String>, password: Option<String>, guest: bool) -> ExitCode {
    let presenter = Presenter::new();

    let api_key = match get_api_key().await {
        Ok(key) => key,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let session = IdentitySession::new(IdentityClient::new(api_key));
    session.init(None).await;

    if guest {
        let identity = session.continue_as_guest();
        presenter.success(&format!("Continuing as {}", identity));
        return ExitCode::from(EXIT_SUCCESS);
    }

    let Some(email) = email else {
        presenter.error("Provide --email <email> or --guest");
        return ExitCode::from(EXIT_USAGE_ERROR);
    };
    let Some(password) = password else {
        presenter.error("Provide --password <password> (or set VIVAVOCE_PASSWORD)");
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    match session.sign_in(&email, &password).await {
        Ok(identity) => {
            if identity.is_guest() {
                presenter.warn("Identity backend unavailable for this client");
            }
            presenter.success(&format!("Signed in as {}", identity));
            presenter.info("Identity lasts for this run only; nothing is stored.");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// List the scenario catalog
pub fn run_scenarios() -> ExitCode {
    let presenter = Presenter::new();
    for scenario in Scenario::all() {
        presenter.key_value(
            scenario.id,
            &format!(
                "{} {} - {} (video: {})",
                scenario.icon, scenario.title, scenario.description, scenario.input
            ),
        );
    }
    ExitCode::from(EXIT_SUCCESS)
}
