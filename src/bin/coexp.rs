//! coexp - Co-expression Module Significance Testing CLI
//!
//! Command-line interface for testing gene co-expression modules across two
//! conditions.

use clap::{Args, Parser, Subcommand};
use coexp_sig::data::{ExpressionMap, ModuleMap};
use coexp_sig::error::{CoexpError, Result};
use coexp_sig::normalize::{clean_nonfinite, norm_log2, norm_quantile};
use coexp_sig::pipeline::{AnalysisConfig, ModuleAnalysis};
use std::ops::Range;
use std::path::PathBuf;

/// Co-expression Module Significance Testing
#[derive(Parser)]
#[command(name = "coexp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by the analysis commands.
#[derive(Args)]
struct AnalysisInputs {
    /// Path to module map CSV (gene,module)
    #[arg(short, long)]
    modules: PathBuf,

    /// Path to condition 1 expression CSV
    #[arg(long = "c1")]
    condition1: PathBuf,

    /// Path to condition 2 expression CSV
    #[arg(long = "c2")]
    condition2: PathBuf,

    /// Analysis configuration YAML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of permutations (overrides config)
    #[arg(short, long)]
    permutations: Option<usize>,

    /// Random seed (overrides config; wall clock when unset)
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (overrides config)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Test every module: condition vs condition and module vs null
    Run {
        #[command(flatten)]
        inputs: AnalysisInputs,

        /// Output directory for result CSVs
        #[arg(short, long, default_value = "output/sigTesting")]
        output: PathBuf,

        /// Also write both tables to results.json
        #[arg(long)]
        json: bool,
    },

    /// Export actual and null correlation distributions of one module
    Distributions {
        #[command(flatten)]
        inputs: AnalysisInputs,

        /// Module label
        #[arg(long)]
        module: String,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Preprocess an expression CSV
    Preprocess {
        /// Input expression CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output expression CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Keep only sample columns START:END (0-based, end exclusive)
        #[arg(long)]
        columns: Option<String>,

        /// Apply log2(x + 1)
        #[arg(long)]
        log2: bool,

        /// Apply quantile normalization
        #[arg(long)]
        quantile: bool,

        /// Replace NaN / infinite values with the gene mean
        #[arg(long)]
        clean: bool,
    },

    /// Write a default analysis configuration YAML
    Config {
        /// Output YAML path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            inputs,
            output,
            json,
        } => cmd_run(&inputs, &output, json),
        Commands::Distributions {
            inputs,
            module,
            output,
        } => cmd_distributions(&inputs, &module, &output),
        Commands::Preprocess {
            input,
            output,
            columns,
            log2,
            quantile,
            clean,
        } => cmd_preprocess(&input, &output, columns.as_deref(), log2, quantile, clean),
        Commands::Config { output } => cmd_config(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` takes precedence.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(fmt::time::uptime()),
        )
        .init();
}

/// Resolve the analysis configuration and size the global thread pool.
fn resolve_config(inputs: &AnalysisInputs) -> Result<AnalysisConfig> {
    let mut config = match &inputs.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(n) = inputs.permutations {
        config.null.n_permutations = n;
    }
    if inputs.seed.is_some() {
        config.null.seed = inputs.seed;
    }
    if inputs.threads.is_some() {
        config.null.workers = inputs.threads;
    }
    config.validate()?;

    if let Some(n_threads) = config.null.workers {
        init_thread_pool(n_threads)?;
    }
    Ok(config)
}

/// Size the global rayon pool. Fails if the pool was already built.
fn init_thread_pool(n_threads: usize) -> Result<()> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
        .map_err(|e| {
            CoexpError::InvalidParameter(format!(
                "Failed to size thread pool to {} threads: {}",
                n_threads, e
            ))
        })
}

fn load_inputs(inputs: &AnalysisInputs) -> Result<(ModuleMap, ExpressionMap, ExpressionMap)> {
    eprintln!("Loading data...");
    let modules = ModuleMap::from_csv(&inputs.modules)?;
    let condition1 = ExpressionMap::from_csv(&inputs.condition1)?;
    let condition2 = ExpressionMap::from_csv(&inputs.condition2)?;
    eprintln!(
        "  {} genes in {} modules; condition 1: {} genes x {} samples; condition 2: {} genes x {} samples",
        modules.len(),
        modules.labels().len(),
        condition1.len(),
        condition1.min_samples(),
        condition2.len(),
        condition2.min_samples()
    );
    Ok((modules, condition1, condition2))
}

fn cmd_run(inputs: &AnalysisInputs, output_dir: &PathBuf, json: bool) -> Result<()> {
    let config = resolve_config(inputs)?;
    let (modules, condition1, condition2) = load_inputs(inputs)?;

    eprintln!(
        "Testing modules ({} permutations per module and condition)...",
        config.null.n_permutations
    );
    let analysis = ModuleAnalysis::new(&modules, &condition1, &condition2, config)?;
    let results = analysis.run();

    eprintln!("Writing results to {:?}...", output_dir);
    results.write_dir(output_dir)?;
    if json {
        results.to_json_file(output_dir.join("results.json"))?;
    }

    let n_sig = results.module_vs_module.significant_at(0.05).len();
    eprintln!("Done! {} modules tested", results.module_vs_module.len());
    eprintln!("  {} differ between conditions at p < 0.05", n_sig);

    Ok(())
}

fn cmd_distributions(inputs: &AnalysisInputs, module: &str, output_path: &PathBuf) -> Result<()> {
    let config = resolve_config(inputs)?;
    let (modules, condition1, condition2) = load_inputs(inputs)?;

    eprintln!("Sampling distributions for module {}...", module);
    let analysis = ModuleAnalysis::new(&modules, &condition1, &condition2, config)?;
    let dist = analysis.distributions(module)?;

    dist.to_csv(output_path)?;
    eprintln!("Wrote distributions to {:?}", output_path);
    for (name, cond) in [("condition1", &dist.condition1), ("condition2", &dist.condition2)] {
        eprintln!(
            "  {}: {} module / {} null correlations, t = {:.4}, p = {:.4}",
            name,
            cond.actual.len(),
            cond.null.len(),
            cond.significance.statistic,
            cond.significance.p_value
        );
    }

    Ok(())
}

/// Parse `START:END` into a sample column range.
fn parse_columns(spec: &str) -> Result<Range<usize>> {
    let invalid = || CoexpError::InvalidParameter(format!("Invalid column range '{}'", spec));
    let (start, end) = spec.split_once(':').ok_or_else(invalid)?;
    let start: usize = start.trim().parse().map_err(|_| invalid())?;
    let end: usize = end.trim().parse().map_err(|_| invalid())?;
    Ok(start..end)
}

fn cmd_preprocess(
    input: &PathBuf,
    output: &PathBuf,
    columns: Option<&str>,
    log2: bool,
    quantile: bool,
    clean: bool,
) -> Result<()> {
    eprintln!("Loading expression data...");
    let mut expression = ExpressionMap::from_csv(input)?;

    if let Some(spec) = columns {
        let range = parse_columns(spec)?;
        eprintln!("  Selecting sample columns {}..{}", range.start, range.end);
        expression = expression.select_samples(range)?;
    }
    if log2 {
        eprintln!("  Applying log2(x + 1)");
        expression = norm_log2(&expression);
    }
    if clean {
        eprintln!("  Replacing non-finite values");
        expression = clean_nonfinite(&expression);
    }
    if quantile {
        eprintln!("  Applying quantile normalization");
        expression = norm_quantile(&expression)?;
    }

    expression.to_csv(output)?;
    eprintln!(
        "Wrote {} genes x {} samples to {:?}",
        expression.len(),
        expression.min_samples(),
        output
    );
    Ok(())
}

fn cmd_config(output_path: &PathBuf) -> Result<()> {
    let yaml = AnalysisConfig::default().to_yaml()?;
    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote default configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);
    Ok(())
}
