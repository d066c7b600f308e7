//! tomstudy CLI — serve the study backend, seed participant accounts,
//! export recorded data.

mod commands;

use clap::{Parser, Subcommand};

/// tomstudy CLI — research study platform
#[derive(Parser)]
#[command(name = "tomstudy", version, about = "tomstudy CLI — research study platform")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, env = "TOMSTUDY_DB_PATH", default_value = "tomstudy.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the study HTTP backend server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3210)]
        port: u16,
        /// Path to the experiment design file
        #[arg(long, default_value = "study/design.json")]
        design: String,
        /// Secret used to sign auth tokens
        #[arg(long, env = "API_JWT_KEY")]
        jwt_secret: String,
    },

    /// Create participant accounts and print their credentials
    SeedUsers {
        /// Number of accounts to create
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Create admin accounts instead of participants
        #[arg(long)]
        admin: bool,
    },

    /// Register external survey links from a JSON file (step key -> URL)
    SeedSurveys {
        /// Path to the survey link file
        #[arg(long)]
        file: String,
    },

    /// Export all participant data (steps and messages) as JSON
    Dump {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            host,
            port,
            design,
            jwt_secret,
        } => commands::serve::run(host, port, cli.db, design, jwt_secret).await,
        Commands::SeedUsers { count, admin } => commands::seed::run(&cli.db, count, admin).await,
        Commands::SeedSurveys { file } => commands::surveys::run(&cli.db, &file).await,
        Commands::Dump { out } => commands::dump::run(&cli.db, out.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
