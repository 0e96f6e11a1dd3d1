use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use wedding_oracle::budget::allocator::build_strategies_with_keywords;
use wedding_oracle::budget::AllocationStrategy;
use wedding_oracle::config::{Config, ConfigOverrides};
use wedding_oracle::fitness::evaluator::evaluate;
use wedding_oracle::output::csv::{shortlist_to_csv, strategies_to_csv};
use wedding_oracle::output::json::render_json;
use wedding_oracle::output::table::{
    render_conflicts_table, render_fitness_table, render_shortlist_table,
    render_strategies_table,
};
use wedding_oracle::requirements::ClientRequirement;
use wedding_oracle::search::beam::run_plan;
use wedding_oracle::search::PlanReport;
use wedding_oracle::timeline::conflicts::detect;
use wedding_oracle::timeline::{ConflictReport, Timeline};
use wedding_oracle::vendors::catalog::CatalogSource;
use wedding_oracle::vendors::{ServiceType, VendorCombination, VendorRecord};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "wedding-oracle",
    about = "Vendor combination optimizer for event planning"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(short = 's', long)]
    services: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build and rank budget allocation strategies for a requirement.
    Allocate {
        #[arg(long)]
        requirement: PathBuf,
    },
    /// Score one vendor combination against a requirement.
    Score {
        #[arg(long)]
        requirement: PathBuf,
        #[arg(long)]
        combination: PathBuf,
        #[arg(long)]
        strategy: Option<String>,
    },
    /// Validate a combination against an event date and timeline.
    Conflicts {
        #[arg(long)]
        requirement: PathBuf,
        #[arg(long)]
        combination: PathBuf,
        #[arg(long)]
        date: String,
        #[arg(long)]
        timeline: Option<PathBuf>,
    },
    /// Run the full beam-search pipeline and print the shortlist.
    Plan {
        #[arg(long)]
        requirement: PathBuf,
        #[arg(long)]
        date: String,
        #[arg(long)]
        timeline: Option<PathBuf>,
        #[arg(long)]
        beam_width: Option<usize>,
        #[arg(long)]
        max_iterations: Option<u32>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let (beam_width, max_iterations) = match &cli.command {
        Commands::Plan {
            beam_width,
            max_iterations,
            ..
        } => (*beam_width, *max_iterations),
        _ => (None, None),
    };
    config.apply_overrides(ConfigOverrides {
        catalog_path: cli
            .catalog
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned()),
        beam_width,
        max_iterations,
    });
    let services = resolve_services(cli.services.as_deref())?;

    match &cli.command {
        Commands::Config { init, show } => {
            if *init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if *show || !*init {
                println!("{}", render_json(&config)?);
            }
        }
        Commands::Allocate { requirement } => {
            let requirement = load_requirement(requirement)?;
            let strategies =
                build_strategies_with_keywords(&requirement, &services, &config.keywords)?;
            print_strategies(&strategies, cli.output)?;
        }
        Commands::Score {
            requirement,
            combination,
            strategy,
        } => {
            let requirement = load_requirement(requirement)?;
            let combination = load_combination(combination, &requirement)?;
            let strategies =
                build_strategies_with_keywords(&requirement, &services, &config.keywords)?;
            let chosen = pick_strategy(strategies, strategy.as_deref())?;
            let result = evaluate(&combination, &requirement, &chosen, &config.fitness);
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_fitness_table(&combination, &result))
                }
                OutputFormat::Json => println!("{}", render_json(&result)?),
                OutputFormat::Csv => {
                    warn!("CSV output for score not implemented, using JSON");
                    println!("{}", render_json(&result)?);
                }
            }
        }
        Commands::Conflicts {
            requirement,
            combination,
            date,
            timeline,
        } => {
            let requirement = load_requirement(requirement)?;
            let combination = load_combination(combination, &requirement)?;
            let event_date = parse_date(date)?;
            let timeline = load_timeline(timeline.as_deref())?;
            let report = detect(&combination, event_date, &timeline, &config.timeline);
            print_conflicts(&report, cli.output)?;
        }
        Commands::Plan {
            requirement,
            date,
            timeline,
            ..
        } => {
            let requirement = load_requirement(requirement)?;
            let event_date = parse_date(date)?;
            let timeline = load_timeline(timeline.as_deref())?;
            let source = CatalogSource::from_path(&config.resolved_catalog_path())?;
            let report = run_plan(
                &source,
                &requirement,
                &services,
                event_date,
                &timeline,
                &config,
            )
            .await?;
            print_plan(&report, cli.output)?;
        }
    }

    Ok(())
}

fn resolve_services(raw: Option<&str>) -> Result<Vec<ServiceType>> {
    let Some(raw) = raw else {
        return Ok(ServiceType::ALL.to_vec());
    };
    let mut out = Vec::new();
    for piece in raw.split(',') {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push(ServiceType::from_str(trimmed)?);
    }
    if out.is_empty() {
        return Err(anyhow!("service filter is empty"));
    }
    out.sort();
    out.dedup();
    Ok(out)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.parse::<NaiveDate>()
        .with_context(|| format!("invalid event date (expected YYYY-MM-DD): {raw}"))
}

fn load_requirement(path: &Path) -> Result<ClientRequirement> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading requirement: {}", path.display()))?;
    let mut requirement: ClientRequirement = serde_json::from_str(&data)
        .with_context(|| format!("failed parsing requirement: {}", path.display()))?;
    requirement.validate()?;
    requirement.mine_soft_preferences();
    Ok(requirement)
}

fn load_combination(path: &Path, requirement: &ClientRequirement) -> Result<VendorCombination> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading combination: {}", path.display()))?;
    let vendors: BTreeMap<ServiceType, VendorRecord> = serde_json::from_str(&data)
        .with_context(|| format!("failed parsing combination: {}", path.display()))?;
    Ok(VendorCombination::from_vendors(
        "combo-manual",
        vendors,
        requirement.max_guest_count(),
    ))
}

fn load_timeline(path: Option<&Path>) -> Result<Timeline> {
    let Some(path) = path else {
        return Ok(Timeline::default());
    };
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading timeline: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed parsing timeline: {}", path.display()))
}

fn pick_strategy(
    strategies: Vec<AllocationStrategy>,
    wanted: Option<&str>,
) -> Result<AllocationStrategy> {
    let Some(wanted) = wanted else {
        return strategies
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no allocation strategies produced"));
    };
    let normalized = wanted.trim().to_ascii_lowercase();
    strategies
        .into_iter()
        .find(|s| s.kind.as_slug() == normalized)
        .ok_or_else(|| anyhow!("unknown strategy: {wanted}"))
}

fn print_strategies(strategies: &[AllocationStrategy], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_strategies_table(strategies)),
        OutputFormat::Json => println!("{}", render_json(strategies)?),
        OutputFormat::Csv => println!("{}", strategies_to_csv(strategies)?),
    }
    Ok(())
}

fn print_conflicts(report: &ConflictReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_conflicts_table(report)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => {
            warn!("CSV output for conflicts not implemented, using JSON");
            println!("{}", render_json(report)?);
        }
    }
    Ok(())
}

fn print_plan(report: &PlanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_shortlist_table(report)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => println!("{}", shortlist_to_csv(report)?),
    }
    Ok(())
}
