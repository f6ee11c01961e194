use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use press_wallet::Network;

#[derive(Parser)]
#[command(
    name = "press",
    about = "CipherPress: content-addressed articles with an on-chain registry",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "press.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a configuration file and create the data directory
    Init(InitArgs),
    /// Publish a new article
    Publish(PublishArgs),
    /// Show one article
    Show(CidArgs),
    /// List published articles, newest first
    Feed(FeedArgs),
    /// Retry registration of already stored content
    Register(CidArgs),
    /// Show the registry entry for a content id
    Entry(CidArgs),
    /// List content ids held in the local cache
    Cache,
}

#[derive(Args)]
pub struct InitArgs {
    /// Publisher address; a random one is generated if omitted
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub network: Option<Network>,
    /// Data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Surface locally cached articles the registry does not list
    #[arg(long)]
    pub additive: bool,
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct PublishArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub content: Option<String>,
    /// Read the article body from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct CidArgs {
    pub cid: String,
}

#[derive(Args)]
pub struct FeedArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["press", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init(_)));
        assert_eq!(cli.config, PathBuf::from("press.toml"));
    }

    #[test]
    fn parse_init_with_options() {
        let cli = Cli::try_parse_from([
            "press", "init", "--network", "sepolia", "--additive", "--author", "0xabc",
        ])
        .unwrap();
        if let Command::Init(args) = cli.command {
            assert_eq!(args.network, Some(Network::Sepolia));
            assert!(args.additive);
            assert_eq!(args.author, Some("0xabc".into()));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_init_rejects_unknown_network() {
        assert!(Cli::try_parse_from(["press", "init", "--network", "goerli"]).is_err());
    }

    #[test]
    fn parse_publish() {
        let cli = Cli::try_parse_from([
            "press", "publish", "--title", "Hello", "--content", "World", "-t", "go", "--tag",
            "rust",
        ])
        .unwrap();
        if let Command::Publish(args) = cli.command {
            assert_eq!(args.title, "Hello");
            assert_eq!(args.content, Some("World".into()));
            assert_eq!(args.tags, vec!["go", "rust"]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_publish_from_file() {
        let cli =
            Cli::try_parse_from(["press", "publish", "--title", "T", "--file", "body.md"]).unwrap();
        if let Command::Publish(args) = cli.command {
            assert_eq!(args.file, Some(PathBuf::from("body.md")));
            assert!(args.content.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn publish_needs_exactly_one_body_source() {
        assert!(Cli::try_parse_from(["press", "publish", "--title", "T"]).is_err());
        assert!(Cli::try_parse_from([
            "press", "publish", "--title", "T", "--content", "c", "--file", "f"
        ])
        .is_err());
    }

    #[test]
    fn parse_feed_limit() {
        let cli = Cli::try_parse_from(["press", "feed", "-n", "5"]).unwrap();
        if let Command::Feed(args) = cli.command {
            assert_eq!(args.limit, 5);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_register() {
        let cli = Cli::try_parse_from(["press", "register", "ab12"]).unwrap();
        if let Command::Register(args) = cli.command {
            assert_eq!(args.cid, "ab12");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_cache() {
        let cli = Cli::try_parse_from(["press", "cache"]).unwrap();
        assert!(matches!(cli.command, Command::Cache));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "press", "--verbose", "--format", "json", "--config", "/tmp/p.toml", "feed",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, PathBuf::from("/tmp/p.toml"));
    }
}
