use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use stagepen::script::{ScriptRunner, StrategyChoice};

#[derive(Parser, Debug)]
#[command(name = "stagepen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a pen script and print touching-color probe results as JSON.
    Replay(ReplayArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Input pen script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Collision strategy answering probes.
    #[arg(long, value_enum, default_value_t = StrategyArg::Both)]
    strategy: StrategyArg,

    /// Override the script's render quality.
    #[arg(long)]
    render_quality: Option<f64>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Cpu,
    Gpu,
    Both,
}

impl From<StrategyArg> for StrategyChoice {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Cpu => Self::Cpu,
            StrategyArg::Gpu => Self::Gpu,
            StrategyArg::Both => Self::Both,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Replay(args) => cmd_replay(args),
    }
}

fn cmd_replay(args: ReplayArgs) -> anyhow::Result<()> {
    let runner = ScriptRunner::from_path(&args.in_path)
        .with_context(|| format!("load pen script '{}'", args.in_path.display()))?;
    let mut opts = runner.script().renderer.with_env_overrides();
    if let Some(q) = args.render_quality {
        opts = opts.with_render_quality(q);
    }
    let runner = runner.with_renderer_opts(opts);

    let report = runner
        .run(args.strategy.into())
        .with_context(|| "replay pen script")?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .with_context(|| "serialize replay report")?;
    println!("{out}");

    let disagreements = report
        .probes
        .iter()
        .filter(|p| matches!((p.cpu, p.gpu), (Some(c), Some(g)) if c.touching != g.touching))
        .count();
    if disagreements > 0 {
        eprintln!("{disagreements} probe(s) where cpu and gpu strategies disagree");
    }
    Ok(())
}
