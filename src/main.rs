use actix_web::rt;
use env_logger::Env;
use log::{error, info};
use std::env;
use std::path::Path;
use std::process;

// Import our modules
mod config;
mod config_loader;
mod error;
mod job_client;
mod models;
mod publisher;
mod relay;
mod server;

// Import the types we need
use config::{ClientConfig, Configuration, PublisherConfig, ServerConfig};
use job_client::TranscriptionJobClient;
use models::WhisperModel;
use publisher::{create_publisher, FilePublisher};

const DEFAULT_MODEL: WhisperModel = WhisperModel::Base;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Seed environment variables from the conf file; the environment wins
    config_loader::load_conf_file();

    let server_config = ServerConfig::default();
    let client_config = ClientConfig::default();
    let publisher_config = PublisherConfig::default();

    // Load the core configuration from the JSON documents
    let config_path = Configuration::config_path();
    let credentials_path = Configuration::credentials_path();
    let config = match Configuration::load(&config_path, &credentials_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    // Optional positional arguments: audio file to transcribe, then model name
    let args: Vec<String> = env::args().collect();
    let audio_path = args.get(1).cloned();
    let model = match args.get(2) {
        Some(name) => match name.parse::<WhisperModel>() {
            Ok(model) => model,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
        None => DEFAULT_MODEL,
    };

    info!("Served directory: {}", config.served_dir.display());
    info!("Public base URL: {}", config.public_base_url);

    let file_server = server::bind_file_server(&config.served_dir, &server_config)?;

    // Without an audio file argument, just serve until interrupted
    let Some(audio_path) = audio_path else {
        return file_server.await;
    };

    // Keep the file server running beside the transcription flow; the remote
    // API fetches the published URL between submission and completion
    rt::spawn(file_server);

    let publisher = match create_publisher(&publisher_config, &config) {
        Ok(publisher) => publisher,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    info!("Using the {} publisher backend", publisher.name());

    let client = TranscriptionJobClient::with_config(&client_config, config.api_key.clone());

    match relay::transcribe_file(publisher.as_ref(), &client, Path::new(&audio_path), model).await {
        Ok(output) => {
            let rendered = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
            println!("{}", rendered);
            Ok(())
        }
        Err(e) => {
            error!("Transcription failed: {}", e);
            process::exit(1);
        }
    }
}
