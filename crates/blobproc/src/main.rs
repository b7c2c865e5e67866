use std::process;
use std::sync::Arc;

use tracing_subscriber::{filter::LevelFilter, fmt};

use blobproc::cli::{Cli, Commands, ExtractArgs, RunArgs, ServeArgs};
use blobproc::error::AppError;
use blobproc::pdf::{self, ExtractOptions};
use blobproc::services::grobid::GrobidClient;
use blobproc::services::object_store::BlobClient;
use blobproc::services::walker::SpoolWalker;
use blobproc::{config, server};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(determine_log_level(&cli));

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn determine_log_level(cli: &Cli) -> LevelFilter {
    match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt().with_max_level(level).with_target(false).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing subscriber already set; skipping re-initialization");
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Some(Commands::Serve(args)) => run_serve(args).await,
        Some(Commands::Run(args)) => run_walk(args).await,
        Some(Commands::Extract(args)) => run_extract(args).await,
        None => {
            Cli::print_help();
            Ok(())
        }
    }
}

async fn run_serve(args: ServeArgs) -> Result<(), AppError> {
    let mut config = config::load()?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    server::serve(config).await?;
    Ok(())
}

/// One pass over the spool. Missing backends are tolerated: without an
/// object store every put degrades to a log line, so local extraction
/// can be validated in isolation and a later run fills in the rest.
async fn run_walk(args: RunArgs) -> Result<(), AppError> {
    let config = config::load()?;

    let s3 = match BlobClient::connect(&config.s3).await {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            tracing::warn!(err = %err, endpoint = %config.s3.endpoint, "object store unavailable, continuing without persistence");
            None
        }
    };
    let grobid = if config.grobid.enabled {
        Some(Arc::new(GrobidClient::new(
            config.grobid.host.clone(),
            config.grobid.max_file_size,
        )))
    } else {
        None
    };

    let walker = SpoolWalker::builder()
        .dir(config.spool.dir.clone())
        .workers(args.workers.unwrap_or(config.processing.workers))
        .timeout(config.processing.timeout())
        .keep_spool(args.keep || config.processing.keep_spool)
        .grobid_max_file_size(config.grobid.max_file_size)
        .maybe_s3(s3)
        .maybe_grobid(grobid)
        .build();

    let stats = walker.run().await?;
    tracing::info!(
        processed = stats.processed,
        ok = stats.ok,
        success_ratio = stats.success_ratio(),
        "spool walk complete"
    );
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    let config = config::load()?;
    let result = match tokio::time::timeout(
        config.processing.timeout(),
        pdf::process_file(&args.input, &ExtractOptions::default()),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(path = %args.input.display(), "derivation timed out, external tools killed");
            return Err(AppError::DerivationFailed(
                pdf::ProcessingStatus::Error.to_string(),
            ));
        }
    };
    if let Some(err) = &result.err {
        tracing::error!(err = %err, path = %args.input.display(), "derivation failed");
    }
    if !result.is_success() {
        let status = result
            .status
            .map(|status| status.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return Err(AppError::DerivationFailed(status));
    }
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
