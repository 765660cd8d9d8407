//! taskpulse: command-line client for the TaskPulse dashboard.
//!
//! Logs in, lists tasks through the dashboard filters and watches live task
//! notifications arriving over the event channel. The last login is cached
//! on disk (see [`AuthCache`]) until `taskpulse logout`.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskpulse_client::{
    ApiClient, AuthCache, AuthSession, ChannelStatus, ClientConfig, Error, NotificationSnapshot,
    Session, TaskFilter, TaskPriority, TaskTab,
};

#[derive(Parser)]
#[command(name = "taskpulse")]
#[command(author, version, about = "TaskPulse dashboard client")]
#[command(propagate_version = true)]
struct Cli {
    /// Backend URL (overrides TASKPULSE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Credentials {
    /// Account email (default: TASKPULSE_EMAIL)
    #[arg(short, long)]
    email: Option<String>,

    /// Account password (default: TASKPULSE_PASSWORD)
    #[arg(short, long)]
    password: Option<String>,
}

impl Credentials {
    /// Email and password from flags or environment, if both are present.
    fn resolve(self) -> Option<(String, String)> {
        let email = self.email.or_else(|| std::env::var("TASKPULSE_EMAIL").ok())?;
        let password = self
            .password
            .or_else(|| std::env::var("TASKPULSE_PASSWORD").ok())?;
        Some((email, password))
    }

    /// Log in with explicit credentials, else reuse the cached session.
    async fn authenticate(
        self,
        api: &ApiClient,
        cache: Option<&AuthCache>,
    ) -> anyhow::Result<AuthSession> {
        if let Some((email, password)) = self.resolve() {
            let auth = api.login(&email, &password).await?;
            if let Some(cache) = cache {
                cache.save(&auth)?;
            }
            return Ok(auth);
        }
        let cached = match cache {
            Some(cache) => cache.load()?,
            None => None,
        };
        cached.context("not logged in (run `taskpulse login` or pass --email/--password)")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, print the user and cache the session
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Forget the cached session
    Logout,

    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// List tasks through the dashboard filters
    Tasks {
        #[command(flatten)]
        credentials: Credentials,

        /// all, assigned, created or overdue
        #[arg(long, default_value = "all")]
        tab: TaskTab,

        /// low, medium or high
        #[arg(long)]
        priority: Option<TaskPriority>,

        /// Case-insensitive match on title or description
        #[arg(long)]
        search: Option<String>,
    },

    /// Print notifications as they arrive until interrupted
    Watch {
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "taskpulse=info,taskpulse_client=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskpulse=info,taskpulse_client=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("taskpulse.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Logs go to stderr so command output stays clean on stdout
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("invalid client configuration")?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    info!(
        environment = ?config.environment,
        api_url = %config.api_url,
        events_url = %config.events_url,
        "Configuration loaded"
    );

    let cache = AuthCache::from_env();

    match cli.command {
        Commands::Login { credentials } => {
            cmd_login(config, credentials, cache.as_ref()).await
        }
        Commands::Logout => cmd_logout(cache.as_ref()),
        Commands::Register {
            username,
            email,
            password,
        } => cmd_register(config, &username, &email, &password).await,
        Commands::Tasks {
            credentials,
            tab,
            priority,
            search,
        } => {
            let filter = TaskFilter::new()
                .with_tab(tab)
                .with_priority(priority)
                .with_search(search.unwrap_or_default());
            cmd_tasks(config, credentials, cache.as_ref(), filter).await
        }
        Commands::Watch { credentials } => cmd_watch(config, credentials, cache.as_ref()).await,
    }
}

async fn cmd_login(
    config: ClientConfig,
    credentials: Credentials,
    cache: Option<&AuthCache>,
) -> anyhow::Result<()> {
    let (email, password) = credentials.resolve().context(
        "email and password required (--email/--password or TASKPULSE_EMAIL/TASKPULSE_PASSWORD)",
    )?;
    let auth = ApiClient::new(&config)?.login(&email, &password).await?;
    if let Some(cache) = cache {
        cache.save(&auth)?;
    }
    println!("Logged in as {} ({})", auth.user.username, auth.user.id);
    Ok(())
}

fn cmd_logout(cache: Option<&AuthCache>) -> anyhow::Result<()> {
    let removed = match cache {
        Some(cache) => cache.clear()?,
        None => false,
    };
    if removed {
        println!("Logged out");
    } else {
        println!("No cached session");
    }
    Ok(())
}

async fn cmd_register(
    config: ClientConfig,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    ApiClient::new(&config)?
        .register(username, email, password)
        .await?;
    println!("Registered {}", username);
    Ok(())
}

async fn cmd_tasks(
    config: ClientConfig,
    credentials: Credentials,
    cache: Option<&AuthCache>,
    filter: TaskFilter,
) -> anyhow::Result<()> {
    let api = ApiClient::new(&config)?;
    let auth = credentials.authenticate(&api, cache).await?;
    let api = api.with_token(auth.token);

    let tasks = match api.list_tasks().await {
        Err(Error::Unauthorized(message)) => {
            if let Some(cache) = cache {
                cache.clear()?;
            }
            anyhow::bail!("{} (session cleared, run `taskpulse login`)", message);
        }
        result => result?,
    };
    let visible = filter.apply(&tasks, &auth.user, chrono::Utc::now());
    if visible.is_empty() {
        println!("No tasks found");
        return Ok(());
    }
    for task in visible {
        let due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:<8} {:<12} {:<10} {}  -> {} (by {})",
            task.id,
            task.priority,
            task.status,
            due,
            task.title,
            task.assigned_to.as_deref().unwrap_or("-"),
            task.created_by
                .as_ref()
                .map(|creator| creator.display_name())
                .unwrap_or("-")
        );
    }
    Ok(())
}

async fn cmd_watch(
    config: ClientConfig,
    credentials: Credentials,
    cache: Option<&AuthCache>,
) -> anyhow::Result<()> {
    let auth = credentials
        .authenticate(&ApiClient::new(&config)?, cache)
        .await?;
    let mut session = Session::start(config, auth).await?;
    println!(
        "Watching notifications for {} (Ctrl-C to stop)",
        session.user().username
    );

    let mut updates = session.notifications().subscribe();
    let mut status = session.channel_status();
    let mut last = NotificationSnapshot::default();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_new(&last, &snapshot);
                last = snapshot;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                if let ChannelStatus::Failed(reason) = current {
                    eprintln!("Event channel lost: {}", reason);
                    break;
                }
            }
        }
    }

    session.logout().await;
    Ok(())
}

fn print_new(previous: &NotificationSnapshot, current: &NotificationSnapshot) {
    for record in current.records.iter().rev() {
        if !previous.contains(record.id) {
            println!(
                "[{}] {}: {} ({} unread)",
                record.kind, record.title, record.message, current.unread_count
            );
        }
    }
}
