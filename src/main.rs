//! Attune - Personalized Tone Adaptation Service
//!
//! Binary entry point: starts the HTTP API server or runs a local
//! demonstration of the adaptation pipeline.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

use attune::{
    ApiServer, ApiServerConfig, Context, ContextPreferences, Empathy, Enthusiasm, Formality,
    Humor, MemoryStore, Settings, SqliteProfileStore, TonePreferences, ToneEngine, UserProfile,
    Verbosity,
};

#[derive(Parser)]
#[command(name = "attune", version, about = "Personalized tone adaptation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database URL (overrides configuration)
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides configuration)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Run a local demonstration of the adaptation pipeline
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "attune={},tower_http=warn,sqlx=warn",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Attune v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::load()?;
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }

    match cli.command {
        Some(Commands::Serve { addr }) => serve(settings, addr).await,
        Some(Commands::Demo) => demo(settings).await,
        None => serve(settings, None).await,
    }
}

async fn build_engine(settings: &Settings) -> anyhow::Result<Arc<ToneEngine>> {
    let memory = Arc::new(
        MemoryStore::new(&settings.database_url, settings.memory_config()).await?,
    );
    let profiles = Arc::new(SqliteProfileStore::new(&settings.database_url).await?);
    Ok(Arc::new(ToneEngine::new(memory, profiles)))
}

async fn serve(settings: Settings, addr_override: Option<String>) -> anyhow::Result<()> {
    let addr = match addr_override {
        Some(addr) => addr.parse()?,
        None => settings.bind_addr()?,
    };
    let engine = build_engine(&settings).await?;
    let server = ApiServer::new(ApiServerConfig { addr }, engine);
    server.serve().await
}

/// Walk two contrasting profiles through the same messages and show how the
/// rendered responses differ
async fn demo(settings: Settings) -> anyhow::Result<()> {
    let engine = build_engine(&settings).await?;

    let mut formal = UserProfile::new("formal_work_user");
    formal.tone_preferences = TonePreferences {
        formality: Formality::Formal,
        enthusiasm: Enthusiasm::Low,
        verbosity: Verbosity::Detailed,
        empathy_level: Empathy::Medium,
        humor: Humor::None,
    };
    formal.context_preferences = Some(ContextPreferences {
        work: Some(formal.tone_preferences),
        ..Default::default()
    });
    engine.profiles().put(&formal).await?;

    let mut casual = UserProfile::new("casual_personal_user");
    casual.tone_preferences = TonePreferences {
        formality: Formality::Casual,
        enthusiasm: Enthusiasm::High,
        verbosity: Verbosity::Concise,
        empathy_level: Empathy::High,
        humor: Humor::Moderate,
    };
    engine.profiles().put(&casual).await?;

    let test_messages = [
        ("I have a meeting with the client tomorrow", Some(Context::Work)),
        ("How are you doing today?", Some(Context::Personal)),
        ("Can you help me with this project?", Some(Context::Work)),
        ("I'm going to a party this weekend!", Some(Context::Personal)),
    ];

    for user_id in ["formal_work_user", "casual_personal_user"] {
        println!("--- {} ---", user_id);
        for (message, context) in &test_messages {
            let outcome = engine.handle_message(user_id, message, *context, None).await?;
            println!();
            println!("Message:  {}", message);
            println!("Context:  {}", outcome.context);
            println!("Response: {}", outcome.response);
            println!(
                "Tone:     formality={} enthusiasm={} verbosity={} empathy={} humor={}",
                outcome.applied_tone.formality,
                outcome.applied_tone.enthusiasm,
                outcome.applied_tone.verbosity,
                outcome.applied_tone.empathy_level,
                outcome.applied_tone.humor,
            );
        }
        println!();
    }

    let summary = engine.memory().summary("formal_work_user").await?;
    println!(
        "Memory: {} short-term exchanges, {:.2} KB long-term",
        summary.short_term_count, summary.long_term_size_kb
    );

    Ok(())
}
