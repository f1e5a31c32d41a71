use anyhow::Result;
use cdn_publish::models::{Config, OutputFormat, UploadRequest};
use cdn_publish::publisher::{exit_code, PublishReport, Publisher};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cdn-publish", version)]
#[command(about = "Upload a file to S3 and invalidate its CloudFront path")]
struct CliArgs {
    /// Local file to upload.
    #[arg(value_name = "LOCAL_FILE")]
    local_file: PathBuf,

    /// Destination bucket.
    #[arg(value_name = "BUCKET")]
    bucket: String,

    /// Key prefix; the object lands at PREFIX/<file name>.
    #[arg(value_name = "PREFIX")]
    prefix: String,

    /// CloudFront distribution to invalidate.
    #[arg(value_name = "DISTRIBUTION_ID")]
    distribution_id: String,
}

fn print_report(report: &PublishReport, output: OutputFormat) -> cdn_publish::Result<()> {
    match output {
        // The upload line was already printed by the upload listener.
        OutputFormat::Text => {
            for line in report.invalidation_lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdn_publish=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Publishing {} (order: {})",
        args.local_file.display(),
        config.publish_order
    );

    let publisher = match Publisher::from_config(&config).await {
        Ok(publisher) if config.output == OutputFormat::Text => {
            publisher.with_upload_listener(|outcome| println!("{}", outcome.line()))
        }
        Ok(publisher) => publisher,
        Err(e) => {
            error!("Failed to initialize clients: {}", e);
            std::process::exit(1);
        }
    };

    let request = UploadRequest::new(args.local_file, args.bucket, args.prefix);
    let outcome = publisher
        .publish(
            &request,
            &args.distribution_id,
            config.caller_reference.clone(),
        )
        .await;

    match &outcome {
        Ok(report) => {
            if let Err(e) = print_report(report, config.output) {
                error!("Failed to render report: {}", e);
                std::process::exit(1);
            }
            info!("Publish completed");
        }
        Err(e) => error!("Publish failed: {:?}", e),
    }

    match exit_code(&outcome) {
        0 => Ok(()),
        code => std::process::exit(code),
    }
}
