use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use insights_rs::api::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_GEOMETRY_URL};
use insights_rs::filters::{EXACT_MATCH, FilterSet, NormalizedFilters, Normalizer};
use insights_rs::timeseries::YearFilter;
use insights_rs::{Client, Dimension, FileSource, Metric, NameMap, Record, RecordSource};
use insights_rs::{aggregate, geo, stats, timeseries};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "insights",
    version,
    about = "Rank, bucket & map insight records into chart-ready aggregates"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Base URL of the insights data service.
    #[arg(long, env = "INSIGHTS_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_url: String,
    /// Request timeout in seconds.
    #[arg(long, env = "INSIGHTS_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout: u64,
    /// Read records from a local .csv or .json file instead of the service.
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,
    /// Filter as key=value (repeatable), e.g. --filter region=all --filter topic=oil
    #[arg(short, long = "filter", global = true)]
    filters: Vec<String>,
    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,
    /// Locale for count formatting (en, de, fr, ...).
    #[arg(long, default_value = "en", global = true)]
    locale: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top-N groups by mean metric value.
    Top(TopArgs),
    /// Every group of a dimension, in first-seen order.
    Groups(GroupsArgs),
    /// Year buckets of a metric with bar/line presentation hint.
    Timeseries(TimeseriesArgs),
    /// Count and metric means per dimension value.
    Profile(ProfileArgs),
    /// Record count, metric means and metric summaries.
    Summary,
    /// Distinct values available for each filter.
    Options,
    /// Join per-country aggregates onto world geometry names.
    Geo(GeoArgs),
}

#[derive(Args, Debug)]
struct TopArgs {
    #[arg(short, long, default_value = "intensity")]
    metric: Metric,
    /// Grouping dimension (country, topic, sector, region, pestle, source).
    #[arg(short, long = "by", default_value = "country")]
    dimension: Dimension,
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
    /// Let the service rank instead of aggregating locally.
    #[arg(long, default_value_t = false)]
    server: bool,
}

#[derive(Args, Debug)]
struct GroupsArgs {
    #[arg(short, long, default_value = "intensity")]
    metric: Metric,
    #[arg(short, long = "by", default_value = "country")]
    dimension: Dimension,
    /// Count records without a value under "Unknown" instead of dropping them.
    #[arg(long, default_value_t = false)]
    unknown: bool,
}

#[derive(Args, Debug)]
struct TimeseriesArgs {
    #[arg(short, long, default_value = "intensity")]
    metric: Metric,
    /// Single year to keep, or "all". Defaults to the end_year filter.
    #[arg(short, long)]
    year: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(short, long = "by", default_value = "sector")]
    dimension: Dimension,
    #[arg(short, long)]
    limit: Option<usize>,
    /// Let the service compute the profile (sector, topic, pestle, region only).
    #[arg(long, default_value_t = false)]
    server: bool,
}

#[derive(Args, Debug)]
struct GeoArgs {
    #[arg(short, long, default_value = "intensity")]
    metric: Metric,
    /// Geometry document (TopoJSON or GeoJSON): file path or http(s) URL.
    #[arg(short, long, default_value = DEFAULT_GEOMETRY_URL)]
    geometry: String,
}

struct Ctx {
    client: Client,
    input: Option<PathBuf>,
    filters: NormalizedFilters,
    json: bool,
    locale: String,
}

impl Ctx {
    fn records(&self, filters: &NormalizedFilters) -> Result<Vec<Record>> {
        match &self.input {
            Some(path) => FileSource::new(path).records(filters),
            None => self.client.records(filters),
        }
    }

    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            table();
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let client = Client::new(ClientConfig {
        base_url: cli.global.api_url.clone(),
        timeout: Duration::from_secs(cli.global.timeout),
        ..Default::default()
    })?;
    let raw = FilterSet::from_pairs(&cli.global.filters)?;
    let filters = Normalizer::new().preserve(EXACT_MATCH).normalize(&raw);
    let ctx = Ctx {
        client,
        input: cli.global.input,
        filters,
        json: cli.global.json,
        locale: cli.global.locale,
    };

    match cli.cmd {
        Command::Top(args) => cmd_top(&ctx, args),
        Command::Groups(args) => cmd_groups(&ctx, args),
        Command::Timeseries(args) => cmd_timeseries(&ctx, args),
        Command::Profile(args) => cmd_profile(&ctx, args),
        Command::Summary => cmd_summary(&ctx),
        Command::Options => cmd_options(&ctx),
        Command::Geo(args) => cmd_geo(&ctx, args),
    }
}

fn print_groups(groups: &[insights_rs::AggregateGroup]) {
    for (i, g) in groups.iter().enumerate() {
        println!(
            "{:>3}. {:<30} value={:<8} count={}",
            i + 1,
            stats::truncate_text(&g.name, 30),
            stats::format_number(Some(g.value)),
            g.count
        );
    }
}

fn cmd_top(ctx: &Ctx, args: TopArgs) -> Result<()> {
    let groups = if args.server && ctx.input.is_none() {
        ctx.client
            .fetch_top_n(args.metric, args.dimension, args.limit, &ctx.filters)?
    } else {
        let rows = ctx.records(&ctx.filters)?;
        aggregate::top_n(&rows, args.dimension, args.metric, args.limit, None)
    };
    ctx.emit(&groups, || print_groups(&groups))
}

fn cmd_groups(ctx: &Ctx, args: GroupsArgs) -> Result<()> {
    let rows = ctx.records(&ctx.filters)?;
    let policy = if args.unknown {
        aggregate::UnknownKeys::Bucket
    } else {
        aggregate::UnknownKeys::Drop
    };
    let groups = aggregate::group_all_with(&rows, args.dimension, args.metric, policy);
    ctx.emit(&groups, || print_groups(&groups))
}

fn cmd_timeseries(ctx: &Ctx, args: TimeseriesArgs) -> Result<()> {
    let year: YearFilter = match args.year {
        Some(y) => y.parse()?,
        None => match ctx.filters.get("end_year") {
            Some(v) => v.to_string().parse()?,
            None => YearFilter::All,
        },
    };
    // Years are filtered here, on both start and end year.
    let rows = ctx.records(&ctx.filters.without("end_year"))?;
    let ts = timeseries::bucket(&rows, args.metric, &year);
    ctx.emit(&ts, || {
        println!(
            "style={}  dated={}  (both={} start-only={} end-only={} none={})",
            ts.style(),
            ts.patterns.dated(),
            ts.patterns.both_dates,
            ts.patterns.start_only,
            ts.patterns.end_only,
            ts.patterns.no_dates
        );
        if ts.points.is_empty() {
            println!("no data");
        }
        for p in &ts.points {
            println!(
                "{}  value={:<8} count={:<5} start={} end={}",
                p.year,
                stats::format_number(Some(p.value)),
                p.count,
                p.has_start_year,
                p.has_end_year
            );
        }
    })
}

fn cmd_profile(ctx: &Ctx, args: ProfileArgs) -> Result<()> {
    if args.dimension == Dimension::Region {
        let mut regions = if args.server && ctx.input.is_none() {
            ctx.client.fetch_regions(&ctx.filters)?
        } else {
            aggregate::region_profiles(&ctx.records(&ctx.filters)?)
        };
        if let Some(limit) = args.limit {
            regions.truncate(limit);
        }
        return ctx.emit(&regions, || {
            for r in &regions {
                println!(
                    "{:<28} count={:<5} intensity={:<6} likelihood={:<6} relevance={:<6} topics={} sources={}",
                    stats::truncate_text(&r.region, 28),
                    r.count,
                    stats::format_number(Some(r.intensity)),
                    stats::format_number(Some(r.likelihood)),
                    stats::format_number(Some(r.relevance)),
                    r.topics.len(),
                    r.sources.len()
                );
            }
        });
    }

    let mut profiles = match (args.server && ctx.input.is_none(), args.dimension) {
        (true, Dimension::Sector) => ctx.client.fetch_sectors(&ctx.filters)?,
        (true, Dimension::Topic) => ctx.client.fetch_topics(&ctx.filters)?,
        (true, Dimension::Pestle) => ctx.client.fetch_pest(&ctx.filters)?,
        (true, other) => anyhow::bail!("the service has no profile endpoint for {}", other),
        (false, d) => aggregate::profiles(&ctx.records(&ctx.filters)?, d, None),
    };
    if let Some(limit) = args.limit {
        profiles.truncate(limit);
    }
    let shares = stats::count_shares(
        &profiles
            .iter()
            .map(|p| insights_rs::AggregateGroup {
                name: p.name.clone(),
                value: p.intensity,
                count: p.count,
            })
            .collect::<Vec<_>>(),
    );
    ctx.emit(&profiles, || {
        for (p, s) in profiles.iter().zip(&shares) {
            println!(
                "{:<28} count={:<5} ({:>5.1}%) intensity={:<6} likelihood={:<6} relevance={:<6}",
                stats::truncate_text(&p.name, 28),
                p.count,
                s.percentage,
                stats::format_number(Some(p.intensity)),
                stats::format_number(Some(p.likelihood)),
                stats::format_number(Some(p.relevance))
            );
        }
    })
}

#[derive(Serialize)]
struct SummaryOut {
    overview: aggregate::Overview,
    metrics: Vec<stats::Summary>,
}

fn cmd_summary(ctx: &Ctx) -> Result<()> {
    let rows = ctx.records(&ctx.filters)?;
    let out = SummaryOut {
        overview: aggregate::overview(&rows),
        metrics: Metric::ALL.iter().map(|m| stats::summary(&rows, *m)).collect(),
    };
    ctx.emit(&out, || {
        println!("records: {}", stats::format_count(out.overview.total, &ctx.locale));
        for s in &out.metrics {
            println!(
                "{:<10} min={} max={} mean={} median={}",
                s.metric,
                stats::format_number(s.min),
                stats::format_number(s.max),
                stats::format_number(s.mean),
                stats::format_number(s.median)
            );
        }
    })
}

fn cmd_options(ctx: &Ctx) -> Result<()> {
    let opts = match &ctx.input {
        Some(_) => aggregate::filter_options(&ctx.records(&NormalizedFilters::none())?),
        None => ctx.client.fetch_filter_options()?,
    };
    ctx.emit(&opts, || {
        let line = |label: &str, v: &[String]| {
            println!("{:<10} ({}) {}", label, v.len(), v.join(", "))
        };
        line("end_year", &opts.end_year);
        line("topics", &opts.topics);
        line("sectors", &opts.sectors);
        line("regions", &opts.regions);
        line("pestle", &opts.pestle);
        line("sources", &opts.sources);
        line("countries", &opts.countries);
        line("cities", &opts.cities);
    })
}

fn load_geometry(ctx: &Ctx, location: &str) -> Result<serde_json::Value> {
    if location.starts_with("http://") || location.starts_with("https://") {
        ctx.client.fetch_geometry(location)
    } else {
        let txt = std::fs::read_to_string(location).with_context(|| format!("read {}", location))?;
        serde_json::from_str(&txt).with_context(|| format!("parse {}", location))
    }
}

#[derive(Serialize)]
struct GeoOut {
    matched: usize,
    cells: Vec<geo::ChoroplethCell>,
}

fn cmd_geo(ctx: &Ctx, args: GeoArgs) -> Result<()> {
    // Records and geometry are independent downloads; join both before use.
    let (rows, doc) = std::thread::scope(|s| {
        let rows = s.spawn(|| ctx.records(&ctx.filters));
        let doc = s.spawn(|| load_geometry(ctx, &args.geometry));
        (rows.join(), doc.join())
    });
    let rows = rows.map_err(|_| anyhow::anyhow!("record fetch panicked"))??;
    let doc = doc.map_err(|_| anyhow::anyhow!("geometry fetch panicked"))??;

    let features = geo::feature_names(&doc)?;
    let countries = aggregate::filter_options(&rows).countries;
    let names = NameMap::build(&countries, &features);
    info!("matched {} of {} dataset countries", names.len(), countries.len());

    let groups = aggregate::group_all(&rows, Dimension::Country, args.metric);
    let cells = geo::join(&features, &groups, &names);
    let out = GeoOut {
        matched: names.len(),
        cells,
    };
    ctx.emit(&out, || {
        for c in &out.cells {
            match &c.data {
                Some(g) => println!(
                    "{:<32} {:<24} value={:<8} count={}",
                    c.feature,
                    g.name,
                    stats::format_number(Some(g.value)),
                    g.count
                ),
                None => println!("{:<32} no data", c.feature),
            }
        }
    })
}
