//! # Example: two services under OS signals
//!
//! Starts a ticker and a cache, then waits for Ctrl-C (or SIGTERM).
//! Set `FAIL_AFTER_MS` to make the cache fail on its own and trigger the shutdown.
//!
//! ```text
//! cargo run --example basic
//! FAIL_AFTER_MS=1500 APP_SHUTDOWN_TIMEOUT=2s cargo run --example basic
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use serviceloader::{
    Service, ServiceError, ServiceFn, ServiceRef, Supervisor, SupervisorConfig, logging,
};

/// Prints a line every 500ms until cancelled.
struct Ticker;

#[async_trait]
impl Service for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    fn set_application_id(&self, id: &str) {
        println!("[ticker] running as {id}");
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        let mut tick = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return Ok(()),
                _ = tick.tick() => println!("[ticker] tick"),
            }
        }
    }

    async fn stop(&self, _ctx: CancellationToken) -> Result<(), ServiceError> {
        println!("[ticker] stopped");
        Ok(())
    }
}

fn cache(fail_after: Option<Duration>) -> ServiceRef {
    ServiceFn::arc(
        "cache",
        move |ctx: CancellationToken| async move {
            match fail_after {
                Some(after) => tokio::select! {
                    _ = ctx.cancelled() => Ok(()),
                    _ = tokio::time::sleep(after) => Err(ServiceError::fail("cache backend unreachable")),
                },
                None => {
                    ctx.cancelled().await;
                    Ok(())
                }
            }
        },
        |ctx: CancellationToken| async move {
            println!("[cache] flushing");
            tokio::select! {
                _ = ctx.cancelled() => Err(ServiceError::fail("flush interrupted")),
                _ = tokio::time::sleep(Duration::from_millis(300)) => Ok(()),
            }
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("info")?;

    let cfg = SupervisorConfig::load()?;
    let fail_after = std::env::var("FAIL_AFTER_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis);

    let sup = Supervisor::builder()
        .with_identifier("demo", env!("CARGO_PKG_VERSION"))
        .with_config(cfg)
        .with_services([Arc::new(Ticker) as ServiceRef, cache(fail_after)])
        .build();

    let report = sup.run().await?;
    println!("{report}");
    if let Some(errors) = &report.stop_errors {
        eprintln!("{errors}");
    }
    std::process::exit(report.exit_code());
}
