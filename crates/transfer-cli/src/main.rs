mod args;
mod console;
mod files;
mod terminal;

use std::process::ExitCode;
use std::time::Duration;

use args::Args;
use clap::Parser;
use console::{render_summary, Console};
use dotenv::dotenv;
use eyre::{Result, WrapErr};
use terminal::StdinPrompter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};
use transfer_dispatcher::config::{DEFAULT_RPC_URL, RPC_ENV_VAR};
use transfer_dispatcher::{
    BatchRun, DispatchSettings, EndpointCandidates, HttpConnector, HttpProbe, Prompter,
    RunConfig, RunReport, TokioPacer, TransferJob,
};

const DEFAULT_LOG_FILTER: &str = "pharos_transfer=info,transfer_dispatcher=info";

#[tokio::main]
async fn main() -> ExitCode {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    Registry::default()
        .with(filter_layer)
        .with(fmt::layer().with_target(false))
        .init();
    dotenv().ok();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let choice = args.asset_choice()?;
    let credentials = files::read_credentials(&args.pk_file)?;
    let recipients = files::read_recipients(&args.wallet_file)?;
    println!("Keys: {}", credentials.len());
    println!("Recipients: {}\n", recipients.len());

    let mut prompter = StdinPrompter::new(args.yes);
    let amount = match &args.amount {
        Some(amount) => amount.clone(),
        None => prompter.ask(
            &format!("Amount per transaction ({})", choice.label),
            choice.default_amount,
        ),
    };
    let count = match &args.tx_count {
        Some(count) => count.clone(),
        None => prompter.ask("Transactions per recipient", "1"),
    };
    let job = TransferJob::parse(&amount, &count)?;

    let candidates = EndpointCandidates::new(
        args.rpc.clone(),
        dotenv::var(RPC_ENV_VAR).ok(),
        Some(DEFAULT_RPC_URL.to_string()),
    )?;
    let config = RunConfig::new(credentials, recipients, job, candidates)?
        .with_asset(choice.asset, choice.symbol_fallback)
        .with_settings(DispatchSettings {
            pacing: Duration::from_millis(args.pacing_ms),
            check_balance: !args.skip_balance_check,
        })
        .with_probe_timeout(Duration::from_secs(args.probe_timeout_secs));

    println!("Looking for a responsive RPC endpoint...");
    let probe = HttpProbe::new(config.probe_timeout);
    let mut batch = BatchRun::new(config, probe, HttpConnector, prompter, TokioPacer);
    let mut console = Console::default();

    let report = batch
        .execute(|event| console.on_event(event))
        .await
        .wrap_err("Batch run failed")?;

    match report {
        RunReport::Completed(summary) => println!("{}", render_summary(&summary)),
        RunReport::Cancelled => println!("Cancelled."),
    }
    Ok(())
}
