use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tapmatrix_plan::{parse_filter, ExecutionDescriptor, PlanError, StrategyKind};
use tapmatrix_runner::{
    logging, CompletionSignal, ConfigError, ExecutionStrategy, InProcessStrategy, RunnerConfig,
    TapReporter, TestRun, EXIT_INTERRUPTED,
};

/// Exit status for unusable configuration
const EXIT_CONFIG: u8 = 2;

fn selection_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("strategy")
                .long("strategy")
                .value_parser(["in-process", "sandboxed"])
                .help("Execution strategy"),
        )
        .arg(
            Arg::new("suites")
                .long("suites")
                .env("TEST_FILES")
                .help("Comma-separated suites to run, in order"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .env("COUCH_HOST")
                .help("Remote service base URL"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .value_parser(value_parser!(u64))
                .help("Bound on each sandboxed descriptor"),
        )
}

fn cli() -> Command {
    Command::new("tapmatrix")
        .version(tapmatrix_runner::VERSION)
        .about("Cross-topology test plan runner")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(selection_args(
            Command::new("run").about("Generate the plan and execute it"),
        ))
        .subcommand(selection_args(
            Command::new("plan").about("Print the plan without executing it"),
        ))
        .subcommand(
            Command::new("suite")
                .about("Run one descriptor in-process and print its completion signal")
                .arg(
                    Arg::new("query")
                        .required(true)
                        .help("Descriptor in query-string form"),
                ),
        )
}

/// File, then environment and flags on top
fn load_config(args: &ArgMatches) -> anyhow::Result<RunnerConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::new(),
    };
    if let Some(strategy) = args.get_one::<String>("strategy") {
        config = config.with_strategy(strategy.parse::<StrategyKind>()?);
    }
    if let Some(suites) = args.get_one::<String>("suites") {
        config = config.with_suites(parse_filter(suites));
    }
    if let Some(host) = args.get_one::<String>("host") {
        config = config.with_remote_host(host);
    }
    if let Some(secs) = args.get_one::<u64>("timeout-secs") {
        config = config.with_sandbox_timeout_secs(*secs);
    }
    Ok(config)
}

async fn run(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let config = load_config(args)?;
    let run = TestRun::new(&config)?;

    // In-process suites have no cancellation point; leave SIGINT alone.
    if config.strategy == StrategyKind::Sandboxed {
        let cancel = run.cancel_token().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("Interrupted, cancelling");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted again, exiting");
                std::process::exit(i32::from(EXIT_INTERRUPTED));
            }
        });
    }

    let mut reporter = TapReporter::stdout();
    let summary = run.execute(&mut reporter).await;
    tracing::info!(
        "{}/{} passed, {} assertions in {}ms",
        summary.passed,
        summary.planned,
        summary.assertions,
        summary.elapsed_ms
    );
    Ok(ExitCode::from(summary.exit_code(config.halt_policy())))
}

fn plan(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let config = load_config(args)?;
    for descriptor in tapmatrix_runner::build_plan(&config, config.strategy) {
        println!("{descriptor}");
    }
    Ok(ExitCode::SUCCESS)
}

async fn suite(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let query = args
        .get_one::<String>("query")
        .context("missing descriptor query")?;
    let descriptor = ExecutionDescriptor::from_query(query)?;

    let result = InProcessStrategy::with_builtin()
        .execute(&descriptor)
        .await
        .with_context(|| format!("running {descriptor}"))?;
    println!("{}", CompletionSignal::tests(result).to_line());
    Ok(ExitCode::SUCCESS)
}

fn is_config_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<PlanError>().is_some()
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let matches = cli().get_matches();

    let outcome = match matches.subcommand() {
        Some(("run", args)) => run(args).await,
        Some(("plan", args)) => plan(args),
        Some(("suite", args)) => suite(args).await,
        _ => Ok(ExitCode::from(EXIT_CONFIG)),
    };

    match outcome {
        Ok(code) => code,
        Err(err) if is_config_error(&err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(EXIT_CONFIG)
        }
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
