//! Data loader - dispatch-bus demo
//!
//! Loads data through the store and prints what a view would show:
//! `Loading...`, then `Data: [...]` or `Data: failed to load`.
//!
//! # Usage
//!
//! ```sh
//! cargo run -p data-loader
//! cargo run -p data-loader -- --fail
//! cargo run -p data-loader -- --latency-ms 2000 --timeout-ms 500
//! RUST_LOG=debug cargo run -p data-loader -- --concurrent 3
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use dispatch_bus::{
    ActionTracker, EffectRuntime, EffectStoreWithMiddleware, EventBus, LoggingMiddleware,
};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::{
    handle_effect, load_config, reducer, AppAction, AppState, DataFacade, DataService, LoadView,
    ServiceMode,
};

/// Await a store effect's outcome from a plain async caller
#[derive(Parser, Debug)]
#[command(name = "data-loader")]
#[command(about = "Loads data through a dispatch-bus store and prints the result")]
struct Args {
    /// Make the simulated request fail with HTTP 500
    #[arg(long)]
    fail: bool,

    /// Simulated request latency in milliseconds
    #[arg(long, default_value = "200")]
    latency_ms: u64,

    /// Give up waiting after this many milliseconds (overrides the config file)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Number of concurrent load calls
    #[arg(long, short, default_value = "1")]
    concurrent: usize,

    /// JSON config file for the tracker and dispatcher
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "could not load config");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.dispatcher.timeout_ms = Some(timeout_ms);
    }

    let mode = if args.fail {
        ServiceMode::Fail
    } else {
        ServiceMode::Ok
    };
    let service = DataService::new(mode, Duration::from_millis(args.latency_ms));

    let tracker = ActionTracker::new(EventBus::new(), config.tracker);
    let store =
        EffectStoreWithMiddleware::new(AppState::default(), reducer, LoggingMiddleware::new());
    let mut runtime =
        EffectRuntime::from_store(store, tracker).with_dispatcher_config(config.dispatcher);

    let facade = DataFacade::new(runtime.dispatcher());
    let quit_tx = runtime.action_tx();
    let concurrent = args.concurrent.max(1);

    println!("{}", LoadView::Loading);

    let callers = tokio::spawn(async move {
        let mut calls = JoinSet::new();
        for _ in 0..concurrent {
            let facade = facade.clone();
            calls.spawn(async move { facade.load_data().await });
        }

        let mut views = Vec::new();
        while let Some(joined) = calls.join_next().await {
            let view = match joined {
                Ok(result) => {
                    if let Err(e) = &result {
                        warn!(error = %e, "load failed");
                    }
                    LoadView::settled(result)
                }
                Err(e) => {
                    error!(error = %e, "load task panicked");
                    LoadView::Failed
                }
            };
            views.push(view);
        }

        let _ = quit_tx.send(AppAction::Quit);
        views
    });

    runtime
        .run(
            |action| matches!(action, AppAction::Quit),
            |effect, ctx| handle_effect(effect, ctx, &service),
        )
        .await;

    let views = match callers.await {
        Ok(views) => views,
        Err(e) => {
            error!(error = %e, "caller task failed");
            return ExitCode::FAILURE;
        }
    };

    for view in &views {
        println!("{view}");
    }
    info!(
        load_requests = runtime.state().load_requests,
        stored = ?runtime.state().data,
        "store state at exit"
    );

    if views.iter().all(|view| matches!(view, LoadView::Loaded(_))) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
