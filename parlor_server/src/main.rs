use axum::extract::{ConnectInfo, Path, State};
use axum::http::StatusCode;
use axum::{
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::UserAgent;
use axum_extra::TypedHeader;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use parlor_core::{random_seed, HandSign, RoundRecord, Session};
use parlor_shared::{
    ApiError, CardView, NewSessionRequest, NewSessionResponse, PlayRequest, PlayResponse,
    RevealResponse, SessionSummary, WhoamiResponse,
};

struct AppState {
    db: SqlitePool,
    // Live sessions stay in memory behind one lock; round resolution is
    // single-writer per the engine's contract. SQLite keeps the audit log.
    sessions: Mutex<HashMap<String, Session>>,
}

// DB schema is defined in migrations (see migrations/ folder)

fn api_error(err: ApiError) -> (StatusCode, String) {
    let status = match err {
        ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
        ApiError::SessionNotFound => StatusCode::NOT_FOUND,
        ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn card_view(card: &parlor_core::BonusCard) -> CardView {
    CardView {
        name: card.name.clone(),
        multiplier: card.multiplier,
    }
}

struct RoundLog {
    session_id: String,
    client_seed: String,
    server_seed_hash: String,
    record: RoundRecord,
}

async fn log_round(db: &SqlitePool, log: &RoundLog) -> anyhow::Result<()> {
    let ts = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO rounds (ts, session_id, client_seed, nonce, server_seed_hash, player_sign, system_sign, bet, outcome, payout, bonus_card, round_hash) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(ts)
    .bind(&log.session_id)
    .bind(&log.client_seed)
    .bind(log.record.nonce as i64)
    .bind(&log.server_seed_hash)
    .bind(i64::from(log.record.player.to_index()))
    .bind(i64::from(log.record.system.to_index()))
    .bind(log.record.bet)
    .bind(log.record.outcome.as_str())
    .bind(log.record.payout)
    .bind(&log.record.bonus_card)
    .bind(&log.record.hash)
    .execute(db)
    .await?;
    Ok(())
}

async fn route_new_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, (StatusCode, String)> {
    let client_seed = req.client_seed.unwrap_or_else(random_seed);
    if client_seed.is_empty() || client_seed.len() > 64 {
        return Err(api_error(ApiError::Invalid(
            "client seed must be 1..=64 characters".into(),
        )));
    }
    let session = Session::new(random_seed(), client_seed);
    let session_id = uuid::Uuid::new_v4().to_string();
    let response = NewSessionResponse {
        session_id: session_id.clone(),
        server_seed_hash: session.server_seed_hash(),
        client_seed: session.client_seed().to_string(),
        balance: session.balance(),
        drop_threshold: session.drop_threshold(),
    };
    let mut sessions = state.sessions.lock().expect("sessions lock");
    sessions.insert(session_id.clone(), session);
    info!(%session_id, "session opened");
    Ok(Json(response))
}

async fn route_play(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<PlayResponse>, (StatusCode, String)> {
    if req.sign > 2 {
        return Err(api_error(ApiError::Invalid(
            "sign must be 0 (scissors), 1 (rock), or 2 (paper)".into(),
        )));
    }
    let sign = HandSign::from_index(req.sign);

    // Resolve under the lock, log to SQLite after releasing it.
    let (response, log) = {
        let mut sessions = state.sessions.lock().expect("sessions lock");
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| api_error(ApiError::SessionNotFound))?;
        let receipt = session
            .play(sign, req.bet, req.active_card)
            .map_err(|err| api_error(ApiError::Invalid(err.to_string())))?;
        let record = receipt.record;
        let log = RoundLog {
            session_id: id.clone(),
            client_seed: session.client_seed().to_string(),
            server_seed_hash: session.server_seed_hash(),
            record: record.clone(),
        };
        let response = PlayResponse {
            nonce: record.nonce,
            player_sign: record.player.to_index(),
            system_sign: record.system.to_index(),
            outcome: record.outcome.as_str().to_string(),
            payout: record.payout,
            balance: receipt.balance,
            hash: record.hash,
            bonus_card: record.bonus_card,
            dropped_card: receipt.dropped_card.as_ref().map(card_view),
            inventory: session.inventory().iter().map(card_view).collect(),
            busted: session.busted(),
        };
        (response, log)
    };

    if let Err(err) = log_round(&state.db, &log).await {
        error!(%err, "failed to log round");
        return Err(api_error(ApiError::Internal));
    }

    Ok(Json(response))
}

async fn route_session_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, (StatusCode, String)> {
    let sessions = state.sessions.lock().expect("sessions lock");
    let session = sessions
        .get(&id)
        .ok_or_else(|| api_error(ApiError::SessionNotFound))?;
    Ok(Json(SessionSummary {
        session_id: id.clone(),
        server_seed_hash: session.server_seed_hash(),
        client_seed: session.client_seed().to_string(),
        balance: session.balance(),
        rounds_played: session.rounds_played(),
        session_wager: session.session_wager(),
        drop_threshold: session.drop_threshold(),
        inventory: session.inventory().iter().map(card_view).collect(),
        busted: session.busted(),
        revealed: session.revealed(),
    }))
}

async fn route_reveal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RevealResponse>, (StatusCode, String)> {
    let mut sessions = state.sessions.lock().expect("sessions lock");
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| api_error(ApiError::SessionNotFound))?;
    let server_seed = session.reveal();
    info!(session_id = %id, "session revealed");
    Ok(Json(RevealResponse {
        server_seed_hash: session.server_seed_hash(),
        server_seed,
        rounds_played: session.rounds_played(),
    }))
}

async fn route_whoami(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user_agent: Option<TypedHeader<UserAgent>>,
) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        ip: addr.ip().to_string(),
        user_agent: user_agent
            .map(|TypedHeader(ua)| ua.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        timestamp: chrono::Utc::now(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(
            &std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://parlor.db".to_string()),
        )
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let state = Arc::new(AppState {
        db,
        sessions: Mutex::new(HashMap::new()),
    });

    let app = Router::new()
        .route("/session", post(route_new_session))
        .route("/session/:id", get(route_session_summary))
        .route("/session/:id/play", post(route_play))
        .route("/session/:id/reveal", post(route_reveal))
        .route("/whoami", get(route_whoami))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = std::env::var("BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
