use std::sync::Arc;
use std::sync::atomic::Ordering;

use clap::Parser;

use inbox_triage::config::Cli;
use inbox_triage::pipeline::processor::run_cycle;
use inbox_triage::provider::MailProvider;
use inbox_triage::provider::gmail::{GmailAuth, GmailClient};
use inbox_triage::report::print_report;
use inbox_triage::scheduler::{LoopConfig, spawn_cycle_loop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let auth = GmailAuth::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export GMAIL_ACCESS_TOKEN=ya29....");
        std::process::exit(1);
    });

    // Auth failure is fatal to the whole program, not one cycle.
    let client = GmailClient::connect(auth).await?;
    let provider: Arc<dyn MailProvider> = Arc::new(client);

    eprintln!("inbox-triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Rules: {}", cli.rules.display());
    eprintln!(
        "   Query: {}",
        cli.query.as_deref().unwrap_or("is:unread (default)")
    );
    eprintln!("   Interval: {}s", cli.interval_seconds);
    eprintln!("   Preview: {} chars\n", cli.preview_length);

    if cli.once {
        let report = run_cycle(
            provider.as_ref(),
            &cli.rules,
            cli.query.as_deref(),
            cli.preview_length,
        )
        .await?;
        print_report(&report, &mut std::io::stdout())?;
        return Ok(());
    }

    let config = LoopConfig {
        rules_path: cli.rules,
        query: cli.query,
        interval_secs: cli.interval_seconds,
        preview_length: cli.preview_length,
    };

    let (handle, shutdown) = spawn_cycle_loop(provider, config);

    // Ctrl-C stops at the next tick; a hard kill remains the blunt option.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping at the next tick");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    handle.await??;
    Ok(())
}
