use clap::{Parser, Subcommand};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use parlor_core::{seconds_remaining, totp, DEFAULT_TIME_STEP_SECS};
use parlor_shared::RoundLogEntry;

#[derive(Parser)]
#[command(name = "parlor-cli", about = "Admin CLI for the parlor server and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Database URL, default sqlite://parlor.db
    #[arg(long, value_parser, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current TOTP code for a Base32 secret
    Totp {
        secret: String,
        /// Code rotation window in seconds
        #[arg(long, default_value_t = DEFAULT_TIME_STEP_SECS)]
        step: u64,
    },
    /// View last N round-log entries
    ViewLogs {
        #[arg(default_value_t = 20)]
        n: i64,
    },
    /// Export the round log to a CSV path
    ExportCsv { path: String },
}

async fn get_pool(url: Option<String>) -> anyhow::Result<SqlitePool> {
    let url = url.unwrap_or_else(|| "sqlite://parlor.db".into());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    Ok(pool)
}

fn entry_from_row(r: &sqlx::sqlite::SqliteRow) -> RoundLogEntry {
    RoundLogEntry {
        id: r.get("id"),
        ts: r.get("ts"),
        session_id: r.get("session_id"),
        client_seed: r.get("client_seed"),
        nonce: r.get("nonce"),
        server_seed_hash: r.get("server_seed_hash"),
        player_sign: r.get::<i64, _>("player_sign") as u8,
        system_sign: r.get::<i64, _>("system_sign") as u8,
        bet: r.get("bet"),
        outcome: r.get("outcome"),
        payout: r.get("payout"),
        bonus_card: r.get("bonus_card"),
        round_hash: r.get("round_hash"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Totp { secret, step } => {
            let now = chrono::Utc::now().timestamp() as u64;
            let code = totp(&secret, step, now)?;
            println!("{} (valid for {}s)", code, seconds_remaining(step, now));
        }
        Commands::ViewLogs { n } => {
            let pool = get_pool(cli.database_url).await?;
            let rows = sqlx::query(
                "SELECT id, ts, session_id, client_seed, nonce, server_seed_hash, player_sign, system_sign, bet, outcome, payout, bonus_card, round_hash \
                 FROM rounds ORDER BY id DESC LIMIT ?",
            )
            .bind(n)
            .fetch_all(&pool)
            .await?;
            for r in &rows {
                let entry = entry_from_row(r);
                println!(
                    "#{:>6} {} session={} seed={} nonce={} {} bet={} payout={} card={} hash={}",
                    entry.id,
                    entry.ts.to_rfc3339(),
                    entry.session_id,
                    entry.client_seed,
                    entry.nonce,
                    entry.outcome,
                    entry.bet,
                    entry.payout,
                    entry.bonus_card.as_deref().unwrap_or("-"),
                    entry.round_hash
                );
            }
        }
        Commands::ExportCsv { path } => {
            let pool = get_pool(cli.database_url).await?;
            let mut wtr = csv::Writer::from_path(&path)?;
            let rows = sqlx::query(
                "SELECT id, ts, session_id, client_seed, nonce, server_seed_hash, player_sign, system_sign, bet, outcome, payout, bonus_card, round_hash \
                 FROM rounds ORDER BY id ASC",
            )
            .fetch_all(&pool)
            .await?;
            let total = rows.len();
            for r in &rows {
                let entry = entry_from_row(r);
                wtr.write_record(&[
                    entry.id.to_string(),
                    entry.ts.to_rfc3339(),
                    entry.session_id,
                    entry.client_seed,
                    entry.nonce.to_string(),
                    entry.server_seed_hash,
                    entry.player_sign.to_string(),
                    entry.system_sign.to_string(),
                    entry.bet.to_string(),
                    entry.outcome,
                    entry.payout.to_string(),
                    entry.bonus_card.unwrap_or_default(),
                    entry.round_hash,
                ])?;
            }
            wtr.flush()?;
            println!("Exported {} rows to {}", total, path);
        }
    }

    Ok(())
}
