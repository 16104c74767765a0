mod config;
mod error;
mod pip;
mod probe;
mod types;
mod utils;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pip::PipConfig;
use std::io::{self, Write};
use std::time::Duration;
use types::{Mirror, Selection};

#[derive(Parser)]
#[command(name = "pip-fc")]
#[command(about = "Find the fastest pip mirror and configure pip to use it", long_about = None)]
struct Cli {
    /// Per-probe timeout in seconds
    #[arg(long, global = true, default_value_t = 5.0)]
    timeout: f64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark all candidate mirrors (e.g., pip-fc test)
    Test,
    /// Benchmark and apply the fastest mirror (e.g., pip-fc use --yes)
    Use {
        /// Apply without asking for confirmation
        #[arg(long, short)]
        yes: bool,

        /// (Alpha) Add the Baidu paddle index as an extra source
        #[arg(long)]
        add_baidu: bool,

        /// (Alpha) Add the NVIDIA index for rapids.ai as an extra source
        #[arg(long)]
        add_nvidia: bool,

        /// Additional extra-index-url entries
        #[arg(long = "extra", value_name = "URL")]
        extras: Vec<String>,
    },
    /// Restore pip's configuration to the previous backup or default
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let timeout = parse_timeout(cli.timeout)?;

    match cli.command {
        Commands::Test => handle_test(timeout).await?,
        Commands::Use {
            yes,
            add_baidu,
            add_nvidia,
            extras,
        } => handle_use(timeout, yes, add_baidu, add_nvidia, extras).await?,
        Commands::Reset => handle_reset().await?,
    }

    Ok(())
}

fn parse_timeout(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        bail!("--timeout must be a positive number of seconds");
    }
    Ok(Duration::from_secs_f64(secs))
}

// --- Handlers ---

async fn handle_test(timeout: Duration) -> Result<()> {
    let mut candidates = config::candidates();

    // Include the currently configured URL if it is a custom one.
    let pip_conf = PipConfig::new();
    let current_url = pip_conf.current_index_url().await.ok().flatten();
    if let Some(ref current) = current_url {
        let is_known = candidates
            .iter()
            .any(|m| m.url.trim_end_matches('/') == current.trim_end_matches('/'));
        if !is_known {
            candidates.push(Mirror::new("Current", current));
        }
    }

    let results = probe::probe_all(candidates, timeout).await?;

    println!(); // Newline after progress bar
    println!();

    // Print Table
    println!("{:<4} {:<12} {:<10} URL", "RANK", "LATENCY", "NAME");
    println!("{}", "-".repeat(60));

    for (i, res) in probe::ranked(&results).iter().enumerate() {
        println!(
            "{:<4} {:<12} {:<10} {}",
            i + 1,
            res.latency.to_string(),
            res.mirror.name,
            res.mirror.url
        );
    }

    println!("{}", "-".repeat(60));
    match probe::select_best(&results) {
        Selection::Fastest(best) => {
            println!(
                "The fastest mirror is: {} ({})",
                best.mirror.name, best.latency
            );
            println!("Run 'pip-fc use' to apply it.");
        }
        Selection::AllUnreachable => {
            println!(
                "Error: All mirror connections have failed or timed out. \
                 Please check your network or try again later."
            );
        }
    }

    Ok(())
}

async fn handle_use(
    timeout: Duration,
    yes: bool,
    add_baidu: bool,
    add_nvidia: bool,
    extras: Vec<String>,
) -> Result<()> {
    println!("Finding fastest mirror...");
    let results = probe::probe_all(config::candidates(), timeout).await?;
    println!();

    let best = match probe::select_best(&results) {
        Selection::Fastest(best) => best,
        Selection::AllUnreachable => {
            bail!("All mirrors timed out. Please check your network connection.")
        }
    };

    println!("Fastest mirror is {} ({})", best.mirror.name, best.latency);

    if !yes && !confirm("Set it as the global pip mirror? (y/n): ")? {
        println!("Aborted. Nothing was changed.");
        return Ok(());
    }

    // The official index stays available as a fallback extra index.
    let mut extra_urls = vec![config::DEFAULT_INDEX_URL.to_string()];
    if add_nvidia {
        extra_urls.push("https://pypi.nvidia.com/".to_string());
    }
    if add_baidu {
        extra_urls.push("https://www.paddlepaddle.org.cn/packages/stable/".to_string());
    }
    extra_urls.extend(extras);

    println!("Backing up and applying {}...", best.mirror.name);
    PipConfig::new().apply(&best.mirror.url, &extra_urls).await?;
    println!(
        "Success! pip is now using {} ({}).",
        best.mirror.name, best.mirror.url
    );

    Ok(())
}

async fn handle_reset() -> Result<()> {
    println!("Restoring pip configuration...");
    PipConfig::new().reset().await?;
    println!("Success! pip configuration restored.");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
