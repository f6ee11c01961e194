use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use press_sdk::{
    ArticleError, ArticleStore, Confirmation, PressConfig, ReconciliationPolicy, RegistryEntry,
    RegistryLedger,
};
use press_types::{Address, Article, ArticleDraft, ContentId};
use press_wallet::{StaticProvider, Wallet};
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(&cli.config, args, format),
        command => {
            let config = load_config(&cli.config)?;
            let author = connect_wallet(&config).await?;
            let store = ArticleStore::open(&config, author)?;
            let result = match command {
                Command::Publish(args) => cmd_publish(&store, author, args, format).await,
                Command::Show(args) => cmd_show(&store, &args.cid, format).await,
                Command::Feed(args) => cmd_feed(&store, args.limit, format).await,
                Command::Register(args) => cmd_register(&store, &args.cid, format).await,
                Command::Entry(args) => cmd_entry(&store, &args.cid, format).await,
                Command::Cache => cmd_cache(&store, format),
                Command::Init(_) => unreachable!("handled above"),
            };
            store.shutdown().await?;
            result
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<PressConfig> {
    if !path.exists() {
        bail!(
            "no configuration at {}; run `press init` first",
            path.display()
        );
    }
    Ok(PressConfig::load(path)?)
}

/// Connect the configured account through the local wallet and check that
/// it is on the configured network.
///
/// The local wallet sits on whichever chain the data directory's registry
/// was first opened on.
async fn connect_wallet(config: &PressConfig) -> anyhow::Result<Address> {
    let author = config
        .author
        .context("no author address configured; set `author` in the config file")?;
    let chain_id = RegistryLedger::recorded_chain_id(&config.registry_path())
        .map_err(ArticleError::RegistryUnavailable)?
        .unwrap_or_else(|| config.network.chain_id());
    let wallet = Wallet::new(StaticProvider::new(vec![author], chain_id))
        .with_retry(config.wallet_retry);
    let address = wallet.connect().await.map_err(ArticleError::from)?;
    wallet
        .ensure_network(config.network)
        .await
        .map_err(ArticleError::from)?;
    Ok(address)
}

fn parse_cid(raw: &str) -> anyhow::Result<ContentId> {
    raw.parse::<ContentId>()
        .with_context(|| format!("invalid content id: {raw}"))
}

fn cmd_init(path: &Path, args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    let defaults = PressConfig::default();
    let author = match args.author {
        Some(raw) => raw
            .parse::<Address>()
            .with_context(|| format!("invalid author address: {raw}"))?,
        None => Address::random(),
    };
    let config = PressConfig {
        data_dir: args.data_dir.unwrap_or(defaults.data_dir.clone()),
        network: args.network.unwrap_or(defaults.network),
        reconciliation: if args.additive {
            ReconciliationPolicy::ChainPlusLocalAdditive
        } else {
            ReconciliationPolicy::ChainOnly
        },
        author: Some(author),
        ..defaults
    };

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;
    config.save(path)?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "config": path.display().to_string(),
                "data_dir": config.data_dir.display().to_string(),
                "network": config.network.name(),
                "author": author.to_hex(),
            })
        ),
        OutputFormat::Text => {
            println!(
                "{} Initialized CipherPress in {}",
                "✓".green().bold(),
                config.data_dir.display().to_string().bold()
            );
            println!("  Author: {}", author.to_hex().cyan());
            println!("  Network: {}", config.network.name().yellow());
            println!("  Config: {}", path.display());
        }
    }
    Ok(())
}

async fn cmd_publish(
    store: &ArticleStore,
    author: Address,
    args: PublishArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let content = match (args.content, args.file) {
        (Some(content), _) => content,
        (None, Some(file)) => fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?,
        (None, None) => bail!("either --content or --file is required"),
    };
    let draft = ArticleDraft::new(args.title, content).with_tags(&args.tags);

    let article = match store.publish(draft, author).await {
        Ok(article) => article,
        Err(ArticleError::RegistrationFailed { cid, source }) => {
            eprintln!(
                "{} Stored as {} but registration failed: {}",
                "!".yellow().bold(),
                cid.to_hex().yellow(),
                source
            );
            eprintln!("  Retry with: press register {cid}");
            return Err(ArticleError::RegistrationFailed { cid, source }.into());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => println!("{}", article_json(&article)),
        OutputFormat::Text => {
            println!("{} Article published", "✓".green().bold());
            if let Some(cid) = article.cid {
                println!("  CID: {}", cid.to_hex().yellow());
            }
            println!("  Title: {}", article.title.bold());
            println!("  Author: {}", article.author.short().cyan());
        }
    }
    Ok(())
}

async fn cmd_show(store: &ArticleStore, raw: &str, format: OutputFormat) -> anyhow::Result<()> {
    let cid = parse_cid(raw)?;
    let article = store.fetch_one(&cid).await?;
    match format {
        OutputFormat::Json => println!("{}", article_json(&article)),
        OutputFormat::Text => print_article(&article, true),
    }
    Ok(())
}

async fn cmd_feed(store: &ArticleStore, limit: usize, format: OutputFormat) -> anyhow::Result<()> {
    let articles = store.fetch_all().await?;
    let shown = articles.iter().take(limit);
    match format {
        OutputFormat::Json => {
            let items: Vec<_> = shown.map(article_json).collect();
            println!("{}", serde_json::Value::Array(items));
        }
        OutputFormat::Text => {
            if articles.is_empty() {
                println!("No articles published yet.");
            }
            for article in shown {
                print_article(article, false);
                println!();
            }
        }
    }
    Ok(())
}

async fn cmd_register(store: &ArticleStore, raw: &str, format: OutputFormat) -> anyhow::Result<()> {
    let cid = parse_cid(raw)?;
    let Confirmation {
        entry,
        already_registered,
    } = store.retry_registration(&cid).await?;
    match format {
        OutputFormat::Json => {
            let mut value = entry_json(&entry);
            value["already_registered"] = json!(already_registered);
            println!("{value}");
        }
        OutputFormat::Text if already_registered => {
            println!("{} {} was already registered", "✓".green(), cid.short_hex().yellow());
        }
        OutputFormat::Text => {
            println!(
                "{} Registered {} (entry #{})",
                "✓".green().bold(),
                cid.short_hex().yellow(),
                entry.seq
            );
        }
    }
    Ok(())
}

async fn cmd_entry(store: &ArticleStore, raw: &str, format: OutputFormat) -> anyhow::Result<()> {
    let cid = parse_cid(raw)?;
    let entry = store.registry_entry(&cid).await?;
    match (format, entry) {
        (OutputFormat::Json, Some(entry)) => println!("{}", entry_json(&entry)),
        (OutputFormat::Json, None) => println!("null"),
        (OutputFormat::Text, Some(entry)) => {
            println!("Entry #{} {}", entry.seq, entry.cid.to_hex().yellow());
            println!("  Publisher: {}", entry.publisher.to_hex().cyan());
            println!("  Block time: {}", entry.block_timestamp);
        }
        (OutputFormat::Text, None) => println!("{} is not registered", cid.short_hex().yellow()),
    }
    Ok(())
}

fn cmd_cache(store: &ArticleStore, format: OutputFormat) -> anyhow::Result<()> {
    let ids = store.cached_ids()?;
    match format {
        OutputFormat::Json => {
            let items: Vec<String> = ids.iter().map(ContentId::to_hex).collect();
            println!("{}", json!(items));
        }
        OutputFormat::Text => {
            println!("{} cached articles", ids.len().to_string().bold());
            for id in &ids {
                println!("  {}", id.to_hex());
            }
        }
    }
    Ok(())
}

fn print_article(article: &Article, full: bool) {
    let cid = article
        .cid
        .map(|c| c.short_hex())
        .unwrap_or_else(|| "-".into());
    println!("{}  {}", cid.yellow(), article.title.bold());
    println!(
        "  {} · {}",
        article.author.short().cyan(),
        article.timestamp.date_string().dimmed()
    );
    if !article.tags.is_empty() {
        let tags: Vec<String> = article.tags.iter().map(|t| format!("#{t}")).collect();
        println!("  {}", tags.join(" ").blue());
    }
    if full {
        println!();
        println!("{}", article.content);
    }
}

fn article_json(article: &Article) -> serde_json::Value {
    json!({
        "cid": article.cid.map(|c| c.to_hex()),
        "id": article.id,
        "title": article.title,
        "content": article.content,
        "tags": article.tags,
        "author": article.author,
        "timestamp": article.timestamp,
    })
}

fn entry_json(entry: &RegistryEntry) -> serde_json::Value {
    json!({
        "seq": entry.seq,
        "cid": entry.cid.to_hex(),
        "publisher": entry.publisher,
        "block_timestamp": entry.block_timestamp,
    })
}
