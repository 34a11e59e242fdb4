// capcurve entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr; stdout carries the run summary)
// 2. Parse the subcommand
// 3. Load config
// 4. Dispatch to the run orchestration

use capcurve_app::config;
use capcurve_app::run;

use anyhow::Context;
use tracing::info;

const USAGE: &str = "usage: capcurve [run | summarize <year> | combine | score]";

/// What to do on this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Summarize(i32),
    Combine,
    Score,
}

fn parse_args<I>(args: I) -> anyhow::Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let command = match args.next().as_deref() {
        None | Some("run") => Command::Run,
        Some("summarize") => {
            let year = args
                .next()
                .with_context(|| format!("summarize needs a year\n{USAGE}"))?;
            let year = year
                .parse()
                .with_context(|| format!("invalid year '{year}'\n{USAGE}"))?;
            Command::Summarize(year)
        }
        Some("combine") => Command::Combine,
        Some("score") => Command::Score,
        Some(other) => anyhow::bail!("unknown command '{other}'\n{USAGE}"),
    };
    if let Some(extra) = args.next() {
        anyhow::bail!("unexpected argument '{extra}'\n{USAGE}");
    }
    Ok(command)
}

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;

    // 2. Parse the subcommand
    let command = parse_args(std::env::args().skip(1))?;

    // 3. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: history {}-{}, class {}",
        config.history.start_year, config.history.end_year, config.class_year
    );

    // 4. Dispatch
    match command {
        Command::Run => {
            let outcome = run::run_all(&config)?;
            print!("{}", outcome.report.render());
        }
        Command::Summarize(year) => {
            let refs = run::load_references(&config)?;
            let summary = run::summarize(&config, &refs, year)?;
            println!(
                "{year}: {} positions, {} of {} picks, total value {:.1}",
                summary.rows.len(),
                summary.picks_counted,
                summary.capacity,
                summary.total_value()
            );
        }
        Command::Combine => {
            let history = run::combine_history(&config)?;
            println!(
                "combined {} rows across {} years",
                history.len(),
                history.years().len()
            );
        }
        Command::Score => {
            let (_, report) = run::score_from_files(&config)?;
            print!("{}", report.render());
        }
    }

    Ok(())
}

/// Initialize tracing to stderr, filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("capcurve=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
