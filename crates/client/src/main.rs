//! `ecowiser` terminal client.
//!
//! Signs in against the Ecowiser API and keeps the session in a file so it
//! survives between invocations.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ecowiser_auth::navigation;
use ecowiser_client::config::ENV_API_URL;
use ecowiser_client::{
    ClientConfig, EcowiserClient, FileStore, KeyValueStore, Navigator, Notifier, SessionStore,
};
use ecowiser_observability::LogFormat;

#[derive(Parser)]
#[command(name = "ecowiser")]
#[command(version, about = "Ecowiser API command line client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (overrides ECOWISER_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Log format: json or compact
    #[arg(long, default_value = "json")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "ECOWISER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the API instead of the local cache
        #[arg(long)]
        refresh: bool,
    },
    /// List projects
    Projects {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// List tenant members
    Members {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show the tenant's subscription
    Subscription,
    /// Show the current tenant
    Tenant,
}

/// Prints notifications to stderr.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn success(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// A terminal has no login page; tell the user how to get one.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        tracing::debug!(route, "login required");
        eprintln!("Not signed in. Run `ecowiser login`.");
    }
}

fn load_config(api_url: Option<String>) -> Result<ClientConfig> {
    let config = match api_url {
        Some(url) => ClientConfig::from_lookup(|key| {
            if key == ENV_API_URL {
                Some(url.clone())
            } else {
                std::env::var(key).ok()
            }
        }),
        None => ClientConfig::from_env(),
    };
    config.context("invalid client configuration")
}

fn open_session(config: &ClientConfig) -> Result<SessionStore> {
    let store = match config.session_file() {
        Some(path) => FileStore::new(path.clone()),
        None => FileStore::open_default().context("cannot locate the session file")?,
    };
    tracing::debug!(path = %store.path().display(), "using session file");
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(SessionStore::new(store))
}

fn print_pagination(pagination: Option<&ecowiser_core::Pagination>) {
    if let Some(p) = pagination {
        if let (Some(current), Some(total)) = (p.current_page, p.total_pages) {
            println!("page {current} of {total}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let format: LogFormat = cli
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    ecowiser_observability::init_with(format);

    let config = load_config(cli.api_url)?;
    let session = open_session(&config)?;
    let client = EcowiserClient::new(
        &config,
        session,
        Arc::new(TerminalNotifier),
        Arc::new(TerminalNavigator),
    )
    .context("failed to build the API client")?;

    match cli.command {
        Commands::Login { username, password } => {
            let outcome = client
                .auth()
                .login(&username, &password)
                .await
                .context("login failed")?;
            match outcome.user {
                Some(user) => println!("Signed in as {} ({})", user.full_name(), user.role),
                None => println!("Signed in as {username}"),
            }
        }
        Commands::Logout => {
            client.session().clear();
            println!("Signed out");
        }
        Commands::Whoami { refresh } => {
            let user = if refresh {
                Some(client.auth().current_user().await?)
            } else {
                match client.bootstrap().await {
                    ecowiser_client::Bootstrap::Ready { user, .. } => Some(user),
                    ecowiser_client::Bootstrap::RedirectToLogin => None,
                }
            };
            if let Some(user) = user {
                println!("{} <{}>", user.full_name(), user.email);
                println!("username: {}", user.username);
                println!("role:     {}", user.role);
                if let Some(tenant) = user.tenant_id() {
                    println!("tenant:   {tenant}");
                }
                let menu: Vec<&str> = navigation(user.role).iter().map(|e| e.title).collect();
                println!("menu:     {}", menu.join(", "));
            }
        }
        Commands::Projects { page } => {
            let projects = client.projects().list(page).await?;
            for project in &projects.items {
                println!("{:>6}  {}  {}", project.id, project.name, project.description);
            }
            print_pagination(projects.pagination.as_ref());
        }
        Commands::Members { page } => {
            let members = client.members().list(page).await?;
            for member in &members.items {
                println!(
                    "{:<8} {:<32} {}",
                    member.role.as_str(),
                    member.email,
                    member.display_name()
                );
            }
            print_pagination(members.pagination.as_ref());
        }
        Commands::Subscription => {
            let sub = client.billing().subscription().await?;
            println!("tier:       {}", sub.subscription_tier);
            if let Some(next) = sub.next_subscription_tier {
                println!("next tier:  {next}");
            }
            if let (Some(start), Some(end)) =
                (sub.current_cycle_start_date, sub.current_cycle_end_date)
            {
                println!("cycle:      {} .. {}", start.date_naive(), end.date_naive());
            }
            println!("auto renew: {}", sub.auto_renew);
        }
        Commands::Tenant => {
            let tenant = client.tenants().current().await?;
            println!("{} (#{})", tenant.name, tenant.id);
            println!("contact: {}", tenant.contact_email);
            if let Some(tier) = tenant.subscription_tier {
                println!("tier:    {tier}");
            }
        }
    }

    Ok(())
}
