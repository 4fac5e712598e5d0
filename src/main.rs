use clap::Parser;
use club_mailer::core::dispatch::RunStatus;
use club_mailer::utils::{logger, validation::Validate};
use club_mailer::{
    CliArgs, MailMerge, MailerError, RecipientSource, RelayConfig, RunConfig, SmtpSession, Template,
};

/// Everything before the send loop is fatal on error. The send loop itself
/// always ends with the session closed and never fails the process.
async fn run(config: RunConfig) -> Result<RunStatus, MailerError> {
    config.validate()?;

    let relay_config = RelayConfig::from_env()?;
    tracing::debug!("Relay config: {:?}", relay_config);

    let template = Template::load(&config.template_path)?;
    let source = RecipientSource::open(&config.source_path, &config.columns)?;

    let session = SmtpSession::connect(&relay_config).await?;

    let merge = MailMerge::new(template, &config, relay_config.sender_address.clone());
    Ok(merge.run(session, source.into_records()).await)
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("Starting club-mailer");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    let config = RunConfig::from(args);

    match run(config).await {
        Ok(RunStatus::Completed(summary)) => {
            tracing::info!("✅ Run finished: {} sent", summary.sent);
        }
        Ok(RunStatus::Aborted { .. }) => {
            tracing::warn!("Run ended early; the relay session was closed");
        }
        Err(e) => {
            tracing::error!("❌ {:?}", e);
            eprintln!("Error: {}", e);
            if let Some(suggestion) = e.recovery_suggestion() {
                eprintln!("{}", suggestion);
            }
            std::process::exit(e.exit_code());
        }
    }
}
