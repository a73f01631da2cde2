mod report;

use anyhow::{bail, Context, Result};
use cfaslice_core::{load_module, Module};
use cfaslice_runtime::{AnalysisConfig, ExecutionMode, WeightMetric};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfaslice")]
#[command(about = "Resolve indirect calls with 0-CFA and slice programs over a JSON program image")]
#[command(version = "0.1.0")]
#[command(author = "Gianluca Brigandi <gbrigand@gmail.com>")]
struct Cli {
    /// Log engine and scheduler activity to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the targets of every call.
    Cfa {
        input: PathBuf,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Analyze only this function.
        #[arg(long)]
        entry: Option<String>,

        /// Print the resolved targets of every call.
        #[arg(long)]
        print: bool,

        /// Print the resolved targets as JSON instead of the summary.
        #[arg(long, conflicts_with = "print")]
        json: bool,

        /// Write a per-function timing table (sequential mode only).
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Repetitions per function for the timing table.
        #[arg(long)]
        runs: Option<usize>,
    },

    /// Slice every seed of the module, or one program point.
    Slice {
        input: PathBuf,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Slice a single program point in this function.
        #[arg(long)]
        function: Option<String>,

        /// Name of the value to slice from; defaults to the first return.
        #[arg(long, requires = "function")]
        seed: Option<String>,

        /// Print one line per seed.
        #[arg(long)]
        print: bool,
    },

    /// Validate a program image and list its functions.
    Inspect { input: PathBuf },
}

#[derive(Args)]
struct ScheduleArgs {
    /// Worker threads; 0 uses every logical CPU.
    #[arg(short, long)]
    threads: Option<usize>,

    /// Run on the calling thread in enumeration order.
    #[arg(long, conflicts_with = "threads")]
    sequential: bool,

    #[arg(long, value_enum)]
    weight: Option<Weight>,

    /// Print per-worker task statistics.
    #[arg(long)]
    stats: bool,

    /// JSON file with defaults for the options above.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Weight {
    Blocks,
    Instructions,
}

impl From<Weight> for WeightMetric {
    fn from(weight: Weight) -> Self {
        match weight {
            Weight::Blocks => WeightMetric::Blocks,
            Weight::Instructions => WeightMetric::Instructions,
        }
    }
}

impl ScheduleArgs {
    fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        if self.sequential {
            config.mode = ExecutionMode::Sequential;
        }
        if let Some(threads) = self.threads {
            config.mode = ExecutionMode::Concurrent;
            config.threads = threads;
        }
        if let Some(weight) = self.weight {
            config.weight = weight.into();
        }
        if self.stats {
            config.collect_stats = true;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Cfa {
            input,
            schedule,
            entry,
            print,
            json,
            csv,
            runs,
        } => {
            let mut config = schedule.resolve()?;
            if let Some(runs) = runs {
                config.runs = runs;
            }
            cmd_cfa(input, config, entry, print, json, csv)
        }
        Commands::Slice {
            input,
            schedule,
            function,
            seed,
            print,
        } => cmd_slice(input, schedule.resolve()?, function, seed, print),
        Commands::Inspect { input } => cmd_inspect(input, cli.verbose),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load(input: &Path) -> Result<Module> {
    load_module(input).with_context(|| format!("Cannot load program image {}", input.display()))
}

fn mode_line(mode: ExecutionMode, workers: usize) -> String {
    match mode {
        ExecutionMode::Sequential => "Sequential mode".to_string(),
        ExecutionMode::Concurrent => format!("Concurrent mode ({} threads)", workers),
    }
}

fn cmd_cfa(
    input: PathBuf,
    config: AnalysisConfig,
    entry: Option<String>,
    print: bool,
    json: bool,
    csv: Option<PathBuf>,
) -> Result<()> {
    use colored::*;
    use cfaslice_runtime::{run_points_to, run_points_to_entry, write_timings};

    if csv.is_some() && config.mode != ExecutionMode::Sequential {
        bail!("--csv records per-function timings and needs --sequential");
    }

    let module = load(&input)?;
    let report = match &entry {
        Some(name) => run_points_to_entry(&module, name, &config)?,
        None => run_points_to(&module, &config),
    };

    if json {
        println!("{}", report::call_targets_json(&module, &report.call_targets)?);
        return Ok(());
    }

    println!("{}", "Intra-Procedural 0-CFA".bright_blue().bold());
    println!("{} function(s)", module.function_count());
    println!("{}", mode_line(report.mode, report.workers));

    if print {
        print!("{}", report::render_call_targets(&module, &report.call_targets));
    }
    if config.collect_stats {
        print!("{}", report::render_stats(&report.stats, config.weight.unit()));
    }

    if let Some(path) = csv {
        write_timings(&path, &report.timings)?;
        println!("Timing table: {}", path.display());
    }

    let indirect = report.call_targets.indirect(&module).count();
    println!(
        "Resolved {} call(s), {} indirect",
        report.call_targets.len(),
        indirect
    );
    println!("Analysis time: {} us", report.elapsed.as_micros());
    Ok(())
}

fn cmd_slice(
    input: PathBuf,
    config: AnalysisConfig,
    function: Option<String>,
    seed: Option<String>,
    print: bool,
) -> Result<()> {
    use colored::*;
    use cfaslice_core::format::{format_function_marked, format_operand};
    use cfaslice_runtime::{run_slicing, slice_point};
    use std::time::Instant;

    let module = load(&input)?;

    println!("{}", "Slicing".bright_blue().bold());
    println!("{} function(s)", module.function_count());

    if let Some(function) = function {
        let start = Instant::now();
        let (value, slice) = slice_point(&module, &function, seed.as_deref())?;
        let elapsed = start.elapsed();
        let id = module.require_function(&function)?.id;

        println!(
            "Slice of {} in @{}: {} value(s)\n",
            format_operand(&module, value),
            function,
            slice.len()
        );
        print!(
            "{}",
            format_function_marked(&module, id, |v| slice.contains(v), "[slice]")
        );
        println!("Analysis time: {} us", elapsed.as_micros());
        return Ok(());
    }

    let report = run_slicing(&module, &config);
    println!("{}", mode_line(report.mode, report.workers));

    if print {
        for seed in &report.slices {
            println!(
                "  {} in @{} ({:?}): {} value(s)",
                format_operand(&module, seed.seed.value),
                module.function(seed.seed.function).name,
                seed.seed.kind,
                seed.slice.len()
            );
        }
    }
    if config.collect_stats {
        print!("{}", report::render_stats(&report.stats, "values in slice"));
    }

    println!(
        "{} seed(s), {} value(s) in all slices",
        report.slices.len(),
        report.total_size()
    );
    println!("Analysis time: {} us", report.elapsed.as_micros());
    Ok(())
}

fn cmd_inspect(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;
    use cfaslice_core::format::format_module;

    let module = load(&input)?;

    println!("{}", " VALID".bright_green().bold());
    println!(
        "Module '{}': {} function(s), {} global(s), {} value(s)\n",
        module.name,
        module.function_count(),
        module.globals().len(),
        module.value_count()
    );

    for function in module.functions() {
        if function.is_declaration() {
            println!("  {} (declaration)", format!("@{}", function.name).bright_yellow());
            continue;
        }
        println!(
            "  {}: {} block(s), {} instruction(s), {} call(s)",
            format!("@{}", function.name).bright_yellow(),
            function.block_count(),
            module.instruction_count(function.id),
            module
                .instructions(function.id)
                .filter(|v| module.instruction(*v).is_some_and(|i| i.is_call()))
                .count()
        );
    }

    if verbose {
        println!("\n{}", format_module(&module));
    }

    Ok(())
}
