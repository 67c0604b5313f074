use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use releaselens::models::{Shortcuts, SummaryLevel};
use releaselens::{ClaudeProvider, Config, GitHubClient, ReleaseAgent};

#[derive(Parser, Debug)]
#[command(name = "releaselens")]
#[command(version = "0.1.0")]
#[command(about = "Analyze a GitHub release: PR breakdown plus AI summaries")]
struct Args {
    /// Release to analyze: a shortcut (`js`), `owner/repo[:tag]`,
    /// `owner/repo tag`, or a release URL. Tag omitted means latest.
    command: Option<String>,

    /// Summary levels: executive, product, developer, all, or none
    #[arg(short, long, default_value = "executive")]
    summary: String,

    /// Compare two releases of the repository instead of analyzing one
    #[arg(long, num_args = 2, value_names = ["TAG_A", "TAG_B"])]
    compare: Option<Vec<String>>,

    /// List known repository shortcuts with their latest release tags
    #[arg(long)]
    list_repos: bool,
}

fn parse_levels(selector: &str) -> anyhow::Result<Vec<SummaryLevel>> {
    let mut levels = Vec::new();
    for part in selector.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match part {
            "executive" => levels.push(SummaryLevel::Executive),
            "product" => levels.push(SummaryLevel::Product),
            "developer" => levels.push(SummaryLevel::Developer),
            "all" => levels.extend(SummaryLevel::ALL),
            "none" => {}
            other => anyhow::bail!("unknown summary level: {}", other),
        }
    }
    Ok(levels)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("releaselens=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    let github = GitHubClient::new(&config.github_token)?;
    let llm = ClaudeProvider::new(config.anthropic_api_key.clone());

    let agent = ReleaseAgent::new(
        Arc::new(github),
        Arc::new(llm),
        Shortcuts::prebid(),
        config.agent_config(),
    );

    if args.list_repos {
        println!("{}", agent.list_known_repos().await);
        return Ok(());
    }

    let command = args
        .command
        .ok_or_else(|| anyhow::anyhow!("a repository command is required (or use --list-repos)"))?;

    let output = match args.compare {
        Some(tags) => {
            agent
                .compare_releases(&command, &tags[0], &tags[1])
                .await?
        }
        None => {
            let levels = parse_levels(&args.summary)?;
            agent.respond(&command, &levels).await?
        }
    };

    println!("{}", output);
    Ok(())
}
