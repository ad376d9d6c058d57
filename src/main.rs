use std::path::PathBuf;

use clap::Parser;
use desim::{EventScheduler, SchedulerBuilder, VirtualTime};
use tracing_subscriber::EnvFilter;

/// Run two periodic timers against each other and print the interleaving.
#[derive(Parser, Debug)]
#[command(name = "desim", version, about)]
struct Args {
    /// Execute every event due at or before this time.
    #[arg(long, default_value_t = 2.0)]
    max_time: f64,

    /// Interval of the fast timer.
    #[arg(long, default_value_t = 0.5)]
    fast: f64,

    /// Interval of the slow timer.
    #[arg(long, default_value_t = 1.0)]
    slow: f64,

    /// Do not log each executed event.
    #[arg(long)]
    quiet: bool,

    /// Write the execution trace to this file.
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

type Tick = (&'static str, VirtualTime);

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // ── Run 1: original ───────────────────────────────────────
    let mut sched = build(&args)?;
    let executed = sched.run_until_max_time(args.max_time, !args.quiet)?;

    println!("history up to {}:", VirtualTime::from(args.max_time));
    for (name, at) in executed.iter().filter_map(|e| e.result()) {
        println!("  {:<4} {}", name, at);
    }

    // ── Run 2: identical replay ───────────────────────────────
    let mut replay = build(&args)?;
    replay.run_until_max_time(args.max_time, false)?;

    let (Some(original), Some(again)) = (sched.trace(), replay.trace()) else {
        return Ok(());
    };
    println!("trace hash: {:016x}", original.trace_hash());
    if desim::traces_match(original, again) {
        println!("replay identical ({} events)", original.len());
    } else {
        tracing::error!("replay diverged from the original run");
    }

    if let Some(path) = &args.trace_out {
        original.export_to_file(path)?;
        tracing::info!(path = %path.display(), "trace written");
    }
    Ok(())
}

fn build(args: &Args) -> desim::SchedulerResult<EventScheduler<Tick>> {
    let mut sched: EventScheduler<Tick> = SchedulerBuilder::new().with_trace().build()?;
    sched.periodic(0, args.fast, |ctx| Ok(("fast", ctx.now())))?;
    sched.periodic(0, args.slow, |ctx| Ok(("slow", ctx.now())))?;
    Ok(sched)
}
