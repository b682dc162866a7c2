//! AWS Lambda handler for the mail forwarder
//!
//! Invoked by an SES receipt rule after the message has been written to S3.
//! Every record in the event is forwarded in order; the first failure fails
//! the invocation so Lambda's own retry and error reporting take over.
//!
//! ## Deployment
//!
//! ```bash
//! # Install cargo-lambda
//! cargo install cargo-lambda
//!
//! # Build for ARM64 (30% cheaper)
//! cargo lambda build --release --arm64
//!
//! # Deploy
//! cargo lambda deploy --iam-role arn:aws:iam::ACCOUNT:role/mail-forwarder-lambda
//! ```

#![recursion_limit = "256"]

use anyhow::Context;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use mail_forwarder::{Forwarder, ForwarderConfig, S3Store, SesEvent, SesSender};
use tracing::{info, instrument};

type SesForwarder = Forwarder<S3Store, SesSender>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing with CloudWatch-optimized settings
    // See: https://docs.aws.amazon.com/lambda/latest/dg/rust-logging.html
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false) // CloudWatch doesn't support ANSI colors
        .with_current_span(false) // Reduce duplicate info in logs
        .without_time() // CloudWatch adds ingestion time
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mail_forwarder=info".parse()?),
        )
        .init();

    info!(
        version = mail_forwarder::VERSION,
        "Starting mail forwarder Lambda"
    );

    // Bad addresses fail the cold start, before any message is fetched
    let config = ForwarderConfig::from_env().context("loading forwarder configuration")?;

    let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3Store::new(&shared, config.storage.clone());
    let sender = SesSender::new(&shared, config.configuration_set.clone());
    let forwarder = Forwarder::new(store, sender, config.forward);

    let forwarder = &forwarder;
    run(service_fn(move |event: LambdaEvent<SesEvent>| async move {
        handler(forwarder, event).await
    }))
    .await
}

/// Forward every message in the event
#[instrument(
    skip_all,
    fields(request_id = %event.context.request_id, records = event.payload.records.len())
)]
async fn handler(forwarder: &SesForwarder, event: LambdaEvent<SesEvent>) -> Result<(), Error> {
    for record in &event.payload.records {
        info!(
            message_id = %record.ses.mail.message_id,
            source = ?record.ses.mail.source,
            "Received message"
        );
    }

    let forwarded = forwarder.forward_batch(event.payload.message_ids()).await?;

    info!(forwarded, "Batch forwarded");
    Ok(())
}
