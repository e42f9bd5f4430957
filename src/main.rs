use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use sysinfo::System;

use sonde::capture::backend::PcapBackend;
use sonde::configuration::config::Config;
use sonde::forwarding::redis_sink::RedisStreamSink;
use sonde::forwarding::sink::StreamSink;
use sonde::session_management::session_manager::SessionManager;
use sonde::web_interface::web_server::WebServer;

#[derive(Parser)]
#[command(name = "sonde")]
#[command(version = "0.1.0")]
#[command(about = "A host-resident network traffic capture agent")]
struct Args {
    config_file: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
============================================================
        sonde — network traffic capture agent v0.1.0
============================================================
"
    );

    info!("Importing configuration");

    let args = Args::parse();

    let config = match Config::from_file(Path::new(args.config_file.as_str())) {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration from file: {:?}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration imported successfully");

    let machine_name = System::host_name().unwrap_or_else(|| "unknown-host".to_string());
    let stream_key = format!("host_{}", machine_name.to_lowercase());

    let sink: Option<Arc<dyn StreamSink>> = match config.redis_connection.as_deref() {
        Some(connection_string) => {
            match RedisStreamSink::connect(connection_string, stream_key.clone()) {
                Ok(sink) => {
                    let sink: Arc<dyn StreamSink> = Arc::new(sink);
                    if let Err(e) = sink.ensure_stream_exists().await {
                        warn!("Unable to prepare stream {}: {}", stream_key, e);
                    }
                    Some(sink)
                }
                Err(e) => {
                    error!("Invalid stream sink configuration: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            warn!("No stream sink connection configured; capture start will be refused");
            None
        }
    };

    let backend = Arc::new(PcapBackend::new());
    let manager = Arc::new(SessionManager::new(
        backend,
        sink,
        config.max_batch_size,
        config.capture_filter.clone(),
    ));

    info!("Control surface listening on port {}", config.listen_port);
    WebServer::new(manager).start(config.listen_port).await;
}
