use clap::Parser;
use log::{error, info, warn};
use server::auth::AuthRegistry;
use server::game::GameConfig;
use server::matchmaker::Matchmaker;
use server::network::Acceptor;
use server::scoreboard::Scoreboard;
use server::session::Services;
use server::words::WordList;
use std::path::PathBuf;
use std::sync::Arc;

/// Main-method of the application.
/// Parses command-line arguments, loads the word list, then runs the
/// accept loop until it fails or the process is interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
        port: u16,
        /// Path to the newline-delimited word list
        #[clap(short, long, default_value = "words.txt")]
        words: PathBuf,
        /// Seconds allowed for typing each word
        #[clap(long, default_value_t = shared::DEFAULT_TIME_LIMIT_SECS)]
        time_limit: u32,
        /// Players matched into one game
        #[clap(long, default_value_t = shared::DEFAULT_GROUP_SIZE)]
        group_size: usize,
        /// Words served in one game
        #[clap(long, default_value_t = shared::DEFAULT_WORDS_PER_GAME)]
        words_per_game: u32,
        /// Maximum concurrent client sessions
        #[clap(long, default_value_t = shared::DEFAULT_MAX_SESSIONS)]
        max_sessions: usize,
    }

    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    let words = Arc::new(WordList::load(&args.words));
    if words.is_empty() {
        warn!("Word list is empty; matched groups cannot play until the server is restarted with one");
    }

    let config = GameConfig {
        group_size: args.group_size,
        words_per_game: args.words_per_game,
        time_limit_secs: args.time_limit,
    };

    // Shared services, handed to every connection task
    let auth = Arc::new(AuthRegistry::new());
    let services = Services {
        scoreboard: Arc::new(Scoreboard::new(Arc::clone(&auth))),
        matchmaker: Arc::new(Matchmaker::new(words, config)),
        auth,
    };

    let address = format!("{}:{}", args.host, args.port);
    let acceptor = Acceptor::bind(&address, services, args.max_sessions).await?;

    // Spawn the accept loop
    let server_handle = tokio::spawn(acceptor.run());

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Accept loop failed: {}", e),
                Err(e) => error!("Server task panicked: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
