use clap::{Parser, Subcommand};
use flat_compare::analyzer::{arrange, auto_fit, chart_points, graph_score, GroupCriterion, SortCriterion};
use flat_compare::collection::{ImportMode, OfferCollection};
use flat_compare::config::{load_config_or_default, AppConfig};
use flat_compare::draft::{DraftField, OfferDraft};
use flat_compare::i18n::{Msg, Translator};
use flat_compare::model::{FieldKey, FieldValue, ObjectiveParam, Parameter, SubjectiveParam};
use flat_compare::normalizer::{describe_raw, ParameterRange, ParameterRanges};
use flat_compare::palette::generate_palette;
use flat_compare::parser::{Extractor, ListingExtractor};
use flat_compare::storage::{demo_document, export_file_name, Document, LocalCache};
use flat_compare::sync::{FirebaseRoomStore, SyncSession};
use flat_compare::utils::format_cs_number;
use futures::StreamExt;
use std::error::Error;
use std::fs;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flat-compare", version)]
#[command(about = "Compare flat offers side by side", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Database path (overrides the config)
    #[arg(long)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from listing text (file or stdin)
    Extract {
        #[arg(short, long)]
        file: Option<String>,

        /// Print the raw extraction result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an offer from listing text, with optional overrides
    Add {
        #[arg(short, long)]
        file: Option<String>,

        #[arg(long, default_value = "")]
        url: String,

        #[arg(short, long)]
        name: Option<String>,

        /// Field value, e.g. PRICE=7900000 (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,

        /// Subjective rating, e.g. Vibe=8 (repeatable)
        #[arg(long = "rate", value_parser = parse_assignment)]
        ratings: Vec<(String, String)>,

        /// Do not read listing text
        #[arg(long)]
        no_text: bool,
    },

    /// List offers, sorted and grouped
    List {
        #[arg(long)]
        sort: Option<SortCriterion>,

        #[arg(long)]
        group: Option<GroupCriterion>,
    },

    /// Normalized values of the starred offers per enabled parameter
    Chart {
        #[arg(long)]
        show_sold: bool,
    },

    /// Toggle the star (chart inclusion) of an offer
    Star { id: String },

    /// Toggle the sold flag of an offer
    Sold { id: String },

    /// Delete an offer
    Remove { id: String },

    /// Move an offer to another offer's position
    Move { from: String, to: String },

    /// Fit continuous ranges to the starred offers
    AutoRanges,

    /// Write all offers to a JSON file
    Export {
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Load offers from an exported JSON file
    Import {
        file: String,

        /// replace or extend
        #[arg(long, default_value = "replace")]
        mode: ImportMode,
    },

    /// Generate a random color palette
    Palette {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// Use it for new offers
        #[arg(long)]
        apply: bool,
    },

    /// Replace all offers with sample data
    Demo,

    /// Share offers through a live room
    Sync {
        /// Room code to join; a new room is created otherwise
        #[arg(long)]
        join: Option<String>,

        /// Stop after this many remote updates
        #[arg(long)]
        updates: Option<usize>,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn read_text(file: Option<&str>) -> Result<String, std::io::Error> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => std::io::read_to_string(std::io::stdin()),
    }
}

/// Numeric fields take numbers when the input parses as one.
fn field_value(key: &FieldKey, raw: &str) -> FieldValue {
    if key.is_numeric() {
        if let Ok(n) = raw.replace(' ', "").replace(',', ".").parse::<f64>() {
            return FieldValue::number(n);
        }
    }
    FieldValue::text(raw)
}

/// Locally persisted working set.
struct Workspace {
    cache: LocalCache,
    offers: OfferCollection,
    ranges: ParameterRanges,
    palette: Vec<String>,
}

impl Workspace {
    fn open(config: &AppConfig, db_path: &str) -> Self {
        let cache = LocalCache::open(db_path);
        let doc = cache.load().unwrap_or_default();
        let ranges = doc
            .meta
            .parameter_ranges
            .clone()
            .unwrap_or_else(|| config.parameter_ranges.clone());
        let palette = doc.meta.palette.clone().unwrap_or_else(|| config.palette.clone());
        Self {
            cache,
            offers: OfferCollection::new(doc.offers),
            ranges,
            palette,
        }
    }

    fn document(&self) -> Document {
        let mut doc = Document::new(self.offers.offers().to_vec(), self.ranges.clone());
        doc.meta.palette = Some(self.palette.clone());
        doc
    }

    fn replace_with(&mut self, doc: Document) {
        self.offers = OfferCollection::new(doc.offers);
        if let Some(ranges) = doc.meta.parameter_ranges {
            self.ranges = ranges;
        }
        if let Some(palette) = doc.meta.palette {
            self.palette = palette;
        }
    }

    fn save(&self) {
        self.cache.save(&self.document());
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), Box<dyn Error>> {
    let t = Translator::new(config.language);
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path.clone());

    if let Commands::Extract { file, json } = &cli.command {
        let text = read_text(file.as_deref())?;
        let result = ListingExtractor::new()?.extract(&text);
        if *json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }
        for (key, value) in &result.values {
            match result.sources.get(key) {
                Some(span) => println!(
                    "{:<16} {:<24} [{}..{}] \"{}\"",
                    t.field_label(key),
                    value,
                    span.start,
                    span.end,
                    span.text
                ),
                None => println!("{:<16} {}", t.field_label(key), value),
            }
        }
        for (param, rating) in &result.ratings {
            println!("{:<16} {}/10", param.name(), rating);
        }
        if !result.name.is_empty() {
            println!("→ {}", result.name);
        }
        return Ok(());
    }

    let mut ws = Workspace::open(&config, &db_path);

    match cli.command {
        Commands::Extract { .. } => {}

        Commands::Add {
            file,
            url,
            name,
            fields,
            ratings,
            no_text,
        } => {
            let mut draft = OfferDraft::new();
            if !no_text {
                let text = read_text(file.as_deref())?;
                draft.apply_extraction(&ListingExtractor::new()?, &text, &url);
            } else if !url.trim().is_empty() {
                draft.set(DraftField::Field(FieldKey::Url), FieldValue::text(url.trim()));
            }
            if let Some(name) = name {
                draft.set(DraftField::Name, FieldValue::text(name));
            }
            for (key, raw) in fields {
                let key = FieldKey::from(key.to_uppercase().as_str());
                let value = field_value(&key, &raw);
                draft.set(DraftField::Field(key), value);
            }
            for (param, raw) in ratings {
                match SubjectiveParam::from_name(&param) {
                    Some(param) => draft.set(DraftField::Rating(param), FieldValue::text(raw)),
                    None => warn!("Unknown subjective parameter '{}'", param),
                }
            }

            let new = draft.into_new_offer(ws.offers.len());
            let offer = ws.offers.add(new, &ws.palette);
            println!("✅ {}: {} ({})", t.t(Msg::Added), offer.name, offer.id);
            ws.save();
        }

        Commands::List { sort, group } => {
            if ws.offers.is_empty() {
                println!("{}", t.t(Msg::NoOffers));
                println!("{}", t.t(Msg::NoOffersTip));
                return Ok(());
            }
            let sort = sort.unwrap_or(config.sort);
            let group = group.unwrap_or(config.group);
            let groups = arrange(ws.offers.offers(), sort, group, &config.enabled_params, &ws.ranges);
            for section in groups {
                let heading = if section.is_sold {
                    Some(t.t(Msg::SoldSection).to_string())
                } else {
                    section.label.map(|label| {
                        if label == "Unknown" {
                            t.t(Msg::Unknown).to_string()
                        } else {
                            label
                        }
                    })
                };
                if let Some(heading) = heading {
                    println!("\n── {} ({})", heading, section.offers.len());
                }
                for offer in section.offers {
                    let star = if offer.featured { "★" } else { "☆" };
                    println!(
                        "{} {:<30} {}: {:>5.1}  {:<16} {:<10} {}",
                        star,
                        offer.name,
                        t.t(Msg::Score),
                        graph_score(offer, &config.enabled_params, &ws.ranges),
                        describe_raw(Parameter::Objective(ObjectiveParam::LowPrice), offer),
                        describe_raw(Parameter::Objective(ObjectiveParam::InteriorArea), offer),
                        offer.id
                    );
                }
            }
        }

        Commands::Chart { show_sold } => {
            let points = chart_points(
                ws.offers.offers(),
                &config.enabled_params,
                &ws.ranges,
                show_sold || config.show_sold_in_graph,
            );
            for point in points {
                println!("{}", point.param);
                for (id, value) in point.values {
                    let Some(offer) = ws.offers.find(&id) else {
                        continue;
                    };
                    println!(
                        "  {:<30} {:>4.1} {:<10} {}",
                        offer.name,
                        value,
                        "█".repeat(value.round() as usize),
                        describe_raw(point.param, offer)
                    );
                }
            }
        }

        Commands::Star { id } => match ws.offers.toggle_star(&id) {
            Some(on) => {
                println!("{} {}", if on { "★" } else { "☆" }, id);
                ws.save();
            }
            None => warn!("No offer with id {}", id),
        },

        Commands::Sold { id } => match ws.offers.toggle_sold(&id) {
            Some(sold) => {
                println!("{} sold: {}", id, sold);
                ws.save();
            }
            None => warn!("No offer with id {}", id),
        },

        Commands::Remove { id } => match ws.offers.remove(&id) {
            Some(offer) => {
                println!("🗑️ {}", offer.name);
                ws.save();
            }
            None => warn!("No offer with id {}", id),
        },

        Commands::Move { from, to } => {
            if ws.offers.move_offer(&from, &to) {
                ws.save();
                println!("↕️ {} → {} (list with --sort manual)", from, to);
            } else {
                warn!("Nothing to move for {} → {}", from, to);
            }
        }

        Commands::AutoRanges => {
            let outcome = auto_fit(ws.offers.offers(), &ws.ranges);
            if outcome.updated.is_empty() {
                println!("{}", t.t(Msg::RangesUnchanged));
                return Ok(());
            }
            for param in &outcome.updated {
                if let Some(ParameterRange::Continuous { min, max, .. }) = outcome.ranges.get(*param) {
                    println!(
                        "{:<18} {} – {}",
                        param.name(),
                        format_cs_number(*min, ' '),
                        format_cs_number(*max, ' ')
                    );
                }
            }
            ws.ranges = outcome.ranges;
            ws.save();
            println!("📐 {}", t.t(Msg::RangesFitted));
        }

        Commands::Export { out } => {
            let path = out.unwrap_or_else(|| export_file_name(chrono::Local::now().date_naive()));
            fs::write(&path, ws.document().to_export_json()?)?;
            info!("Exported {} offers to {}", ws.offers.len(), path);
            println!("💾 {}: {}", t.t(Msg::Exported), path);
        }

        Commands::Import { file, mode } => {
            let content = fs::read_to_string(&file)?;
            let doc = match Document::parse_import(&content) {
                Ok(doc) => doc,
                Err(e) => {
                    error!("{}: {}", t.t(Msg::InvalidFile), file);
                    return Err(e.into());
                }
            };
            println!("{} {}", doc.offers.len(), t.t(Msg::OffersToImport));

            let mode = if ws.offers.is_empty() { ImportMode::Replace } else { mode };
            let Document { offers, meta, .. } = doc;
            if mode == ImportMode::Replace {
                if let Some(ranges) = meta.parameter_ranges {
                    ws.ranges = ranges;
                }
            }
            ws.offers.import(offers, mode, &ws.palette);
            let label = match mode {
                ImportMode::Replace => t.t(Msg::ReplaceAll),
                ImportMode::Extend => t.t(Msg::AddToExisting),
            };
            println!("📥 {}: {}", label, ws.offers.len());
            ws.save();
        }

        Commands::Palette { count, apply } => {
            let colors = generate_palette(count);
            for color in &colors {
                println!("{}", color);
            }
            if apply {
                ws.palette = colors;
                ws.save();
            }
        }

        Commands::Demo => {
            ws.replace_with(demo_document()?);
            ws.save();
            println!("📦 {} offers", ws.offers.len());
        }

        Commands::Sync { join, updates } => {
            let Some(url) = config.sync.database_url.clone() else {
                return Err("sync.databaseUrl is not configured".into());
            };
            let store = Arc::new(FirebaseRoomStore::new(&url));
            let local = ws.document();
            let session = match join.or_else(|| config.sync.room.clone()) {
                Some(code) => SyncSession::join(store, &code, &config.sync, &local).await?,
                None => SyncSession::create(store, &config.sync, &local).await?,
            };
            println!("🔗 {}: {}", t.t(Msg::SyncConnected), session.room());
            println!("{}", t.t(Msg::SyncShareHint));

            let mut remote = Box::pin(session.subscribe());
            let mut received = 0usize;
            loop {
                tokio::select! {
                    update = remote.next() => {
                        let Some(doc) = update else { break };
                        ws.replace_with(doc);
                        ws.save();
                        received += 1;
                        println!("📥 {} offers", ws.offers.len());
                        if updates.is_some_and(|limit| received >= limit) {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted");
                        break;
                    }
                }
            }
            session.disconnect().await;
            println!("🔌 {}", t.t(Msg::SyncDisconnect));
        }
    }

    Ok(())
}
