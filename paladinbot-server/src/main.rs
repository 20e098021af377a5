use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod context;
mod server;

use server::run_server;

#[derive(Parser, Debug, Clone)]
#[command(name = "paladinbot")]
#[command(author, version, about = "PaladinBot - single-channel Twitch chat bot")]
pub struct Args {
    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://paladin@localhost:5432/paladinbot")]
    pub database_url: String,

    /// Channel the bot joins and serves, with or without `#`.
    #[arg(long, env = "TWITCH_CHANNEL")]
    pub channel: String,

    /// Login of the bot account used for chat.
    #[arg(long, env = "TWITCH_BOT_USERNAME")]
    pub bot_username: String,

    /// Chat OAuth token of the bot account.
    #[arg(long, env = "TWITCH_BOT_OAUTH", hide_env_values = true)]
    pub bot_oauth: String,

    #[arg(long, env = "TWITCH_CLIENT_ID")]
    pub client_id: String,

    #[arg(long, env = "TWITCH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Shared secret Twitch signs EventSub webhook deliveries with.
    #[arg(long, env = "TWITCH_EVENTSUB_SECRET", hide_env_values = true)]
    pub eventsub_secret: String,

    /// Address the HTTP API and webhook receiver bind to.
    #[arg(long, env = "PALADINBOT_HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: String,

    #[arg(long, env = "PALADINBOT_PREFIX", default_value = "!")]
    pub prefix: String,

    /// IANA time zone used by the `time` command.
    #[arg(long, env = "PALADINBOT_TIMEZONE", default_value = "America/Chicago")]
    pub timezone: String,

    /// Public site that lists the commands.
    #[arg(long, env = "PALADINBOT_WEBSITE_URL", default_value = "")]
    pub website_url: String,

    /// How long to wait for in-flight commands on shutdown.
    #[arg(long, default_value_t = 60)]
    pub shutdown_grace_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long, default_value = "false")]
    pub log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paladinbot=info,paladinbot_core=info,paladinbot_server=info,tower_http=info"));

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("log bridge already installed: {}", e);
    }
    if json {
        let sub = fmt().json().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(sub)
            .expect("Failed to set global subscriber");
    } else {
        let sub = fmt().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(sub)
            .expect("Failed to set global subscriber");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_json);
    info!(channel = %args.channel, "PaladinBot starting");

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}
