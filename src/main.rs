use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rxsched::config::SchedulerConfig;
use rxsched::demo::{self, Callback, DemoOptions, DemoReport};
use rxsched::scheduler::Schedulers;

#[derive(Debug, Parser)]
#[command(name = "rxsched-demo")]
#[command(about = "Shows which threads run an observable's callbacks under subscribe_on and observe_on")]
struct Cli {
    #[command(subcommand)]
    scenario: Option<Scenario>,

    /// How long to wait for each scenario to finish, in milliseconds.
    #[arg(long, default_value = "2000")]
    wait_ms: u64,

    #[arg(long, help = "Dispose the subscription from on_subscribe")]
    dispose: bool,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Scenario {
    /// `create` emitting four messages and a 404 error.
    Create,
    /// `defer` wrapping `just`.
    Just,
    /// Both scenarios, one after another.
    All,
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "rxsched=trace,rxsched_demo=debug,info"
    } else {
        "rxsched=info,rxsched_demo=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .compact(),
        )
        .init();
}

fn summarize(name: &str, report: &DemoReport) {
    let observe_threads: Vec<&str> = report
        .events
        .iter()
        .filter(|e| matches!(e.callback, Callback::Next | Callback::Error | Callback::Complete))
        .map(|e| e.thread.as_str())
        .collect();

    tracing::info!(
        scenario = name,
        caller = %report.caller_thread,
        events = report.events.len(),
        values = ?report.next_payloads(),
        observe_threads = ?observe_threads,
        finished = report.finished,
        "scenario summary"
    );
}

/// Runs the selected scenarios and fails if any of them did not finish in time.
fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = DemoOptions {
        wait: Duration::from_millis(cli.wait_ms),
        dispose_on_subscribe: cli.dispose,
    };

    let scenario = cli.scenario.unwrap_or(Scenario::All);
    let mut unfinished = Vec::new();

    if matches!(scenario, Scenario::Create | Scenario::All) {
        let report = demo::create_scenario(&options);
        summarize("create", &report);
        if !report.finished {
            unfinished.push("create");
        }
    }

    if matches!(scenario, Scenario::Just | Scenario::All) {
        let report = demo::just_scenario(&options);
        summarize("just", &report);
        if !report.finished {
            unfinished.push("just");
        }
    }

    check_finished(&unfinished, cli.wait_ms)
}

fn check_finished(unfinished: &[&str], wait_ms: u64) -> anyhow::Result<()> {
    if !unfinished.is_empty() {
        bail!(
            "scenario(s) {} did not finish within {} ms",
            unfinished.join(", "),
            wait_ms
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    Schedulers::configure(SchedulerConfig::from_env()?)?;

    run(&cli)
}
