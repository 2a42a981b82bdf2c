use anyhow::{Context, Result};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let job_name = args.next().unwrap_or_else(|| "ping".to_string());
    let data: Value = match args.next() {
        Some(raw) => serde_json::from_str(&raw).context("job data must be a JSON object")?,
        None => json!({}),
    };

    let demo = asynch_demo::build()?;
    let poller = demo.client.start();

    println!("[asynch-demo] submitting {job_name}");
    let handle = demo.client.submit(job_name, data, demo.options.clone());

    tokio::select! {
        result = handle => {
            match result {
                Ok(reply) => println!("[asynch-demo] {}", reply.into_value()),
                Err(error) => println!("[asynch-demo] job failed: {}", error.reason()),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("[asynch-demo] interrupted");
        }
    }

    let state = demo.client.poll_state();
    if state.is_busy() {
        println!(
            "[asynch-demo] leaving {} job(s) pending at {} rate",
            state.pending_count, state.rate
        );
    }
    println!("[asynch-demo] {:?}", demo.client.metrics());
    poller.shutdown().await;
    Ok(())
}
