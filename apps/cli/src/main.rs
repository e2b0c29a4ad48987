use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use animeref_core::{
    AnimeExtractor, CsvRegistry, ExtractorConfig, Provider, SortColumn, TableQuery, VideoRef,
    config::{DEFAULT_OUTPUT_DIR, DEFAULT_REGISTRY_FILE},
    extract_timestamps, format_table_readable, format_timestamps, read_csv_table,
};
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CliSortColumn {
    Title,
    Timestamp,
    Excited,
}

impl From<CliSortColumn> for SortColumn {
    fn from(cli: CliSortColumn) -> Self {
        match cli {
            CliSortColumn::Title => SortColumn::Title,
            CliSortColumn::Timestamp => SortColumn::Timestamp,
            CliSortColumn::Excited => SortColumn::Excited,
        }
    }
}

#[derive(Parser)]
#[command(name = "animeref")]
#[command(about = "Turn YouTube anime videos into CSV tables of the anime they mention")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for CSV, transcript and description files
    #[arg(long, global = true, env = "ANIMEREF_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// JSON registry of produced CSV files
    #[arg(long, global = true, env = "ANIMEREF_REGISTRY", default_value = DEFAULT_REGISTRY_FILE)]
    registry: PathBuf,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the anime reference table of a video and save it as CSV
    Extract(ExtractArgs),
    /// Save the transcript of a video
    Transcript(TranscriptArgs),
    /// Save the description of a video
    Description(DescriptionArgs),
    /// Print the timestamps found in a video description
    Timestamps(TimestampsArgs),
    /// List the CSV files produced so far
    Registry,
    /// Browse a saved CSV table
    Show(ShowArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Video URL or id
    video: String,

    /// Output CSV file name (defaults to "<title>_anime_references.csv")
    #[arg(short, long)]
    output: Option<String>,

    /// AI provider for table generation
    #[arg(short, long, env = "ANIMEREF_PROVIDER", default_value = "gemini")]
    provider: CliProvider,

    /// Model name, overriding the provider's default
    #[arg(long, env = "ANIMEREF_MODEL")]
    model: Option<String>,

    /// Transcript language (e.g., "en", "ja")
    #[arg(short, long)]
    lang: Option<String>,

    /// Give up on generation after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Ignore cached transcripts and descriptions
    #[arg(short, long)]
    force: bool,
}

#[derive(Args)]
struct TranscriptArgs {
    /// Video URL or id
    video: String,

    /// Output file name (defaults to the video title)
    #[arg(long)]
    filename: Option<String>,

    /// Transcript language (e.g., "en", "ja")
    #[arg(short, long)]
    lang: Option<String>,

    /// Ignore the cached transcript
    #[arg(short, long)]
    force: bool,
}

#[derive(Args)]
struct DescriptionArgs {
    /// Video URL or id
    video: String,

    /// Output file name (defaults to "<id>_description.txt")
    #[arg(long)]
    filename: Option<String>,

    /// Ignore the cached description
    #[arg(short, long)]
    force: bool,
}

#[derive(Args)]
struct TimestampsArgs {
    /// Video URL or id
    #[arg(required_unless_present = "file")]
    video: Option<String>,

    /// Read the description from a local file instead
    #[arg(long, conflicts_with = "video")]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// CSV file, as a path or a name inside the output directory
    csv: PathBuf,

    /// Only rows whose title or notes contain this text
    #[arg(short, long)]
    search: Option<String>,

    /// Only rows whose excitement contains this value (e.g., "yes")
    #[arg(short, long)]
    excited: Option<String>,

    /// Sort rows by this column
    #[arg(long)]
    sort: Option<CliSortColumn>,

    /// Sort in descending order
    #[arg(long, requires = "sort")]
    desc: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_banner() {
    println!(
        "\n{}  {}\n",
        style("animeref").cyan().bold(),
        style("Anime Reference Extractor").dim()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "animeref=debug"
    } else {
        "animeref=warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let config = ExtractorConfig {
        output_dir: cli.output_dir,
        registry_path: cli.registry,
        ..ExtractorConfig::default()
    };
    debug!(
        output_dir = %config.output_dir.display(),
        registry = %config.registry_path.display(),
        cache_dir = %config.cache_dir.display(),
        "configuration"
    );

    match cli.command {
        Command::Extract(args) => extract(config, args).await,
        Command::Transcript(args) => transcript(config, args).await,
        Command::Description(args) => description(config, args).await,
        Command::Timestamps(args) => timestamps(config, args).await,
        Command::Registry => registry(config).await,
        Command::Show(args) => show(config, args).await,
    }
}

async fn extract(config: ExtractorConfig, args: ExtractArgs) -> Result<()> {
    let provider: Provider = args.provider.into();

    // Validate API key early
    if let Err(e) = provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    let video = VideoRef::parse(&args.video)?;
    let config = ExtractorConfig {
        use_cache: !args.force,
        provider,
        model: args.model,
        generation_timeout: Duration::from_secs(args.timeout),
        language: args.lang,
        ..config
    };
    let extractor = AnimeExtractor::from_config(config).with_configured_generator()?;

    print_banner();
    println!("{}", style("─".repeat(60)).dim());

    let start = Instant::now();
    let spinner = create_spinner(&format!(
        "Extracting anime references from {} with {}...",
        video.id,
        provider.name()
    ));
    let extracted = match extractor.process_video(&video, args.output.as_deref()).await {
        Ok(extracted) => extracted,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).with_context(|| format!("failed to process {}", video.url()));
        }
    };
    spinner.finish_with_message(format!(
        "{} {}: {} anime, {} timestamps {}",
        style("✓").green().bold(),
        style(&extracted.title).yellow(),
        extracted.table.rows.len(),
        extracted.timestamps,
        style(format!("[{}]", format_duration(start.elapsed()))).dim()
    ));

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(extracted.csv_path.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    // Human-readable output
    println!("{}", format_table_readable(&extracted.table));

    Ok(())
}

async fn transcript(config: ExtractorConfig, args: TranscriptArgs) -> Result<()> {
    let video = VideoRef::parse(&args.video)?;
    let extractor = AnimeExtractor::from_config(ExtractorConfig {
        use_cache: !args.force,
        language: args.lang,
        ..config
    });

    let spinner = create_spinner("Downloading transcript...");
    let saved = extractor.save_transcript(&video, args.filename.as_deref()).await;
    spinner.finish_and_clear();

    println!(
        "{} Transcript saved: {}",
        style("✓").green().bold(),
        style(saved?.display()).cyan()
    );
    Ok(())
}

async fn description(config: ExtractorConfig, args: DescriptionArgs) -> Result<()> {
    let video = VideoRef::parse(&args.video)?;
    let extractor = AnimeExtractor::from_config(ExtractorConfig {
        use_cache: !args.force,
        ..config
    });

    let spinner = create_spinner("Fetching description...");
    let saved = extractor.save_description(&video, args.filename.as_deref()).await;
    spinner.finish_and_clear();

    println!(
        "{} Description saved: {}",
        style("✓").green().bold(),
        style(saved?.display()).cyan()
    );
    Ok(())
}

async fn timestamps(config: ExtractorConfig, args: TimestampsArgs) -> Result<()> {
    let description = match (args.file, args.video) {
        (Some(path), _) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(video)) => {
            let video = VideoRef::parse(&video)?;
            AnimeExtractor::from_config(config)
                .description(&video)
                .await?
        }
        (None, None) => bail!("either a video or --file is required"),
    };

    let timestamps = extract_timestamps(&description);
    if timestamps.is_empty() {
        println!("{}", style("No timestamps found").dim());
    } else {
        print!("{}", format_timestamps(&timestamps));
    }
    Ok(())
}

async fn registry(config: ExtractorConfig) -> Result<()> {
    let registry = CsvRegistry::load(&config.registry_path).await?;
    if registry.files.is_empty() {
        println!("{}", style("No CSV files registered").dim());
    }
    for file in &registry.files {
        let path = config.output_dir.join(file);
        let marker = if path.exists() {
            style("✓").green().bold()
        } else {
            style("✗").red().bold()
        };
        println!("{} {}", marker, file);
    }
    Ok(())
}

async fn show(config: ExtractorConfig, args: ShowArgs) -> Result<()> {
    let path = if args.csv.exists() {
        args.csv
    } else {
        config.output_dir.join(&args.csv)
    };
    let table = read_csv_table(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let query = TableQuery {
        search: args.search,
        excited: args.excited,
        sort: args.sort.map(Into::into),
        descending: args.desc,
    };
    let shown = query.apply(&table);
    debug!(total = table.rows.len(), shown = shown.rows.len(), "filtered table");

    if shown.rows.is_empty() {
        println!("{}", style("No results").dim());
    } else {
        println!("{}", format_table_readable(&shown));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn timestamps_accepts_a_file() {
        let cli = Cli::try_parse_from(["animeref", "timestamps", "--file", "desc.txt"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Timestamps(TimestampsArgs { file: Some(_), video: None })
        ));
        assert!(Cli::try_parse_from(["animeref", "timestamps"]).is_err());
    }

    #[test]
    fn show_parses_filters_and_sort() {
        let cli = Cli::try_parse_from([
            "animeref", "show", "refs.csv", "--search", "frieren", "--excited", "yes", "--sort",
            "timestamp", "--desc",
        ])
        .unwrap();
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.csv, PathBuf::from("refs.csv"));
        assert_eq!(args.search.as_deref(), Some("frieren"));
        assert_eq!(args.excited.as_deref(), Some("yes"));
        assert!(matches!(args.sort, Some(CliSortColumn::Timestamp)));
        assert!(args.desc);

        assert!(Cli::try_parse_from(["animeref", "show", "refs.csv", "--desc"]).is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
