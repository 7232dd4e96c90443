use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Select};
use std::{fs, path::Path, path::PathBuf};
use tempmap_core::{
    CitySet, ColorPolicy, Config, Dashboard, DashboardView, FetchMode, HeightScale, Hour, SortOrder,
    provider::provider_from_config,
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "tempmap", version, about = "City temperatures as a 3D column map")]
pub struct Cli {
    /// Log debug output (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set default scale, cache lifetime, colors and timeout.
    Configure,

    /// Fetch once and print the table (and optionally the map).
    Show(ShowArgs),

    /// Explore interactively: change hour, scale, city set; refresh.
    Interactive {
        /// Start with the national city set instead of Kyushu.
        #[arg(long)]
        national: bool,
    },

    /// List the cities in a set.
    Cities {
        #[arg(long)]
        national: bool,
    },
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Hour of today (0-23, Asia/Tokyo); if absent, current conditions.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    pub hour: Option<u32>,

    /// Column meters per °C (1000-5000).
    #[arg(long)]
    pub scale: Option<f64>,

    /// Use the national city set instead of Kyushu.
    #[arg(long)]
    pub national: bool,

    /// Table order: registry, name, coldest or warmest.
    #[arg(long, default_value = "registry")]
    pub sort: SortOrder,

    /// Add city name labels to the map.
    #[arg(long)]
    pub labels: bool,

    /// Color scheme: gradient or buckets.
    #[arg(long)]
    pub colors: Option<ColorPolicy>,

    /// Write the column map as a standalone HTML page.
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Print the deck.gl JSON document instead of the table.
    #[arg(long)]
    pub json: bool,
}

fn city_set(national: bool) -> CitySet {
    if national { CitySet::National } else { CitySet::Kyushu }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show(args) => show(args).await,
            Command::Interactive { national } => {
                let config = Config::load()?;
                let mut dash = Dashboard::new(provider_from_config(&config)?, &config)?;
                dash.set_city_set(city_set(national));
                interactive::run(&mut dash).await
            }
            Command::Cities { national } => {
                let set = city_set(national);
                let registry = set.registry();
                println!("{} ({} cities)", set, registry.len());
                for c in registry.cities() {
                    println!("  {:<10} {:>8.4} {:>9.4}", c.name, c.lat, c.lon);
                }
                Ok(())
            }
        }
    }
}

async fn show(args: ShowArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut dash = Dashboard::new(provider_from_config(&config)?, &config)?;

    dash.set_city_set(city_set(args.national));
    dash.set_sort(args.sort);
    dash.set_labels(args.labels);
    if let Some(scale) = args.scale {
        dash.set_scale(HeightScale::new(scale)?);
    }
    if let Some(policy) = args.colors {
        dash.set_color_policy(policy);
    }
    if let Some(hour) = args.hour {
        dash.set_hour(Some(Hour::new(hour)?));
    }

    let view = dash.view().await;

    if args.json {
        println!("{}", view.map.to_json_pretty());
    } else {
        print_view(&view);
    }

    if let Some(path) = args.html {
        write_html(&view, &path)?;
        println!("Map written to {}", path.display());
    }

    Ok(())
}

/// Header, table, then any per-city failures (on stderr).
pub fn print_view(view: &DashboardView) {
    let mode = match view.mode {
        FetchMode::Current => "current conditions".to_string(),
        FetchMode::Hourly(h) => format!("forecast for {h}"),
    };

    println!();
    println!(
        "{} | {} | {} m per °C | updated {}",
        view.city_set,
        mode,
        view.scale.get(),
        chrono::Local::now().format("%H:%M:%S")
    );
    print!("{}", view.table.render_text());

    for failure in &view.failures {
        eprintln!("! could not fetch {failure}");
    }
}

pub fn write_html(view: &DashboardView, path: &Path) -> anyhow::Result<()> {
    let title = format!("{} temperatures ({})", view.city_set, view.mode);
    fs::write(path, view.map.render_html(&title))
        .with_context(|| format!("Failed to write map file: {}", path.display()))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    config.default_scale = CustomType::<f64>::new("Default height scale (m per °C, 1000-5000):")
        .with_default(config.default_scale)
        .prompt()?;

    config.cache_ttl_secs = CustomType::<u64>::new("Reuse fetched data for how many seconds?")
        .with_default(config.cache_ttl_secs)
        .prompt()?;

    config.request_timeout_secs = CustomType::<u64>::new("Per-request timeout (seconds):")
        .with_default(config.request_timeout_secs)
        .prompt()?;

    let policies = vec![ColorPolicy::Gradient, ColorPolicy::Buckets];
    let cursor = policies.iter().position(|p| *p == config.color_policy).unwrap_or(0);
    config.color_policy = Select::new("Color scheme:", policies).with_starting_cursor(cursor).prompt()?;

    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "tempmap", "show", "--hour", "7", "--scale", "4000", "--national", "--sort", "warmest",
            "--labels", "--colors", "buckets", "--html", "map.html",
        ])
        .unwrap();

        let Command::Show(args) = cli.command else { panic!("expected show") };
        assert_eq!(args.hour, Some(7));
        assert_eq!(args.scale, Some(4000.0));
        assert!(args.national && args.labels);
        assert_eq!(args.sort, SortOrder::Warmest);
        assert_eq!(args.colors, Some(ColorPolicy::Buckets));
        assert_eq!(args.html, Some(PathBuf::from("map.html")));
    }

    #[test]
    fn show_rejects_hour_out_of_range() {
        assert!(Cli::try_parse_from(["tempmap", "show", "--hour", "24"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["tempmap", "cities", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
