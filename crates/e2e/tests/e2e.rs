//! E2E test harness entry point
//!
//! Runs the built-in scenarios and the YAML specs through the configured
//! driver. Run with: cargo test --package todomvc-e2e --test e2e
//!
//! Headless by default; pass `--driver playwright` to use a real browser.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use todomvc_e2e::cli::HarnessArgs;
use todomvc_e2e::{E2eResult, RunnerConfig, TestRunner, TestSuiteResult};

fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = HarnessArgs::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: HarnessArgs) -> E2eResult<bool> {
    let mut config = RunnerConfig::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let runner = TestRunner::from_config(config).await?;

    let results = if let Some(name) = &args.name {
        let result = runner.run_test(name).await?;
        TestSuiteResult {
            driver: runner.driver_name().to_string(),
            started_at: chrono::Utc::now(),
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            skipped: 0,
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    } else if let Some(tag) = &args.tag {
        runner.run_tagged(tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;

    Ok(results.success())
}
