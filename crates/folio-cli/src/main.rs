mod bootstrap;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use folio_config::{Config, ConfigManager};
use folio_observability::LogManager;
use folio_profile::{ProfileSource, Section};
use folio_router::{OutcomeKind, TurnOutcome};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Answer questions about one person's profile")]
#[command(version)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, short, default_value = "false")]
    debug: bool,

    /// Config file path (defaults to ~/.folio/config.json)
    #[arg(long, env = "FOLIO_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动交互式聊天
    Chat,
    /// 发送单条消息
    Ask {
        /// 消息内容
        message: String,
    },
    /// 获取资料
    Profile {
        /// 只显示某一部分 (all, bio, skills, projects, contact, hobbies)
        #[arg(long, default_value = "all")]
        section: Section,
    },
    /// 列出人设
    Agents,
    /// 配置管理命令
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// 获取配置值
    Get {
        /// 配置键 (如: profile.endpoint, conversation.history_cap)
        key: String,
    },
    /// 设置配置值
    Set {
        /// 配置键 (如: profile.endpoint, conversation.history_cap)
        key: String,
        /// 配置值
        value: String,
    },
    /// 初始化默认配置
    Init {
        /// 强制覆盖已有配置
        #[arg(long, default_value = "false")]
        force: bool,
    },
    /// 显示当前配置
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref())?;

    if cli.debug {
        eprintln!("{}", format!("[DEBUG] Config path: {:?}", config_path).dimmed());
    }

    if let Commands::Config(args) = cli.command {
        return handle_config(args, &config_path).await;
    }

    let config = ConfigManager::load(&config_path).await?.snapshot().await;
    let _logs = init_logging(&config, cli.debug).await;

    let span = folio_observability::command_span(command_name(&cli.command));
    async {
        match cli.command {
            Commands::Chat => run_interactive_chat(&config).await,
            Commands::Ask { message } => ask(&config, &message).await,
            Commands::Profile { section } => show_profile(&config, section).await,
            Commands::Agents => list_agents(&config),
            Commands::Config(_) => Ok(()),
        }
    }
    .instrument(span)
    .await
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Chat => "chat",
        Commands::Ask { .. } => "ask",
        Commands::Profile { .. } => "profile",
        Commands::Agents => "agents",
        Commands::Config(_) => "config",
    }
}

fn resolve_config_path(path: Option<&str>) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => Ok(folio_config::expand_tilde(path).unwrap_or_else(|| PathBuf::from(path))),
        None => Ok(ConfigManager::default_config_path()?),
    }
}

/// 日志只写文件；`--debug` 时同时输出到 stderr
async fn init_logging(config: &Config, debug: bool) -> Option<LogManager> {
    let mut settings = folio_observability::Config::from(&config.logging).with_console(debug);
    if debug {
        settings = settings.with_log_level("debug");
    }

    match LogManager::new(&settings).await {
        Ok(manager) => Some(manager),
        Err(e) => {
            eprintln!("{}", format!("⚠️  Logging disabled: {}", e).yellow());
            None
        }
    }
}

fn print_outcome(outcome: &TurnOutcome) {
    let text = match outcome.kind {
        OutcomeKind::Answered => outcome.text.normal(),
        OutcomeKind::Refused => outcome.text.yellow(),
        OutcomeKind::Failed => outcome.text.red(),
    };
    println!("{}", text);
}

async fn run_interactive_chat(config: &Config) -> anyhow::Result<()> {
    let app = bootstrap::build(config).await?;
    let (session_id, greeting) = app.service.open_session().await?;

    println!("{}", format!("🤖 {} Agent", config.agents.subject).cyan().bold());
    println!("{}", format!("Session ID: {}", session_id).dimmed());
    println!("{}", "Type 'exit' or 'quit' to leave".dimmed());
    println!();
    println!("{} {}", "Assistant:".green().bold(), greeting);

    let span = folio_observability::session_span(&session_id);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        let outcome = app
            .service
            .send(&session_id, input)
            .instrument(span.clone())
            .await?;
        print!("{} ", "Assistant:".green().bold());
        print_outcome(&outcome);
        println!();
    }

    app.service.close_session(&session_id)?;
    Ok(())
}

async fn ask(config: &Config, message: &str) -> anyhow::Result<()> {
    let app = bootstrap::build(config).await?;
    let (session_id, _) = app.service.open_session().await?;

    let outcome = app.service.send(&session_id, message).await?;
    print_outcome(&outcome);

    app.service.close_session(&session_id)?;
    Ok(())
}

async fn show_profile(config: &Config, section: Section) -> anyhow::Result<()> {
    let fetcher = bootstrap::profile_fetcher(&config.profile)?;
    println!("{}", format!("📡 Fetching {}", fetcher.endpoint()).dimmed());

    match fetcher.fetch_profile().await {
        Ok(profile) => {
            println!("{}", serde_json::to_string_pretty(&profile.section(section))?);
            Ok(())
        }
        Err(e) => {
            println!("{}", format!("❌ {}", e).red());
            std::process::exit(1);
        }
    }
}

fn list_agents(config: &Config) -> anyhow::Result<()> {
    let registry = bootstrap::agent_registry(config)?;
    let root = registry.root().name.clone();

    println!("{}", format!("📋 Agents ({} routing):", config.agents.routing).cyan().bold());
    for agent in registry.iter() {
        let marker = if agent.name == root { " (root)".green().to_string() } else { String::new() };
        println!("  {}{}", agent.name.bold(), marker);

        let tools: Vec<&str> = agent.tools.iter().map(|t| t.name()).collect();
        if !tools.is_empty() {
            println!("    {}", format!("tools: {}", tools.join(", ")).dimmed());
        }
        if !agent.keywords.is_empty() {
            println!("    {}", format!("keywords: {}", agent.keywords.join(", ")).dimmed());
        }
    }
    Ok(())
}

async fn handle_config(args: ConfigArgs, config_path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Get { key } => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            match config.get_value(&key) {
                Some(value) => {
                    println!("{}", format!("{} = {}", key, value).green());
                }
                None => {
                    println!("{}", format!("❌ Key not found: {}", key).red());
                    std::process::exit(1);
                }
            }
        }
        ConfigCommands::Set { key, value } => {
            let manager = ConfigManager::load(config_path).await?;

            if let Err(e) = manager.update(|config| config.set_value(&key, &value)).await {
                eprintln!("{}", format!("❌ Failed to set value: {}", e).red());
                std::process::exit(1);
            }
            println!("{}", format!("✅ Set {} = {}", key, value).green());
        }
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                println!("{}", format!("⚠️  Config already exists at {:?}", config_path).yellow());
                println!("{}", "Use --force to overwrite".dimmed());
                return Ok(());
            }

            let manager = ConfigManager::new(Config::default(), config_path.to_path_buf());
            manager.save().await?;

            println!("{}", format!("✅ Config initialized at {:?}", config_path).green());
            println!("{}", "You can edit this file to customize your settings".dimmed());
        }
        ConfigCommands::Show => {
            let manager = ConfigManager::load(config_path).await?;
            let config = manager.snapshot().await;

            println!("{}", "📋 Current Configuration:".cyan().bold());
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
