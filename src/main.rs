use dealerpost::{logger, Config, PostRelay};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env()?;
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|raw| logger::LogLevel::parse(&raw))
        .unwrap_or(logger::LogLevel::Info);
    let logger_config = if config.json_logs {
        logger::LoggerConfig::production()
    } else {
        logger::LoggerConfig::development()
    };
    logger::init_with_config(logger_config.with_level(level))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    let relay = match PostRelay::from_config(&config) {
        Ok(relay) => relay,
        Err(e) => {
            log::error!("❌ Cannot start relay: {}", e);
            return Err(e.into());
        }
    };

    dealerpost::server::run(config, relay).await?;
    Ok(())
}
