use anyhow::Context;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use time::format_description::well_known::Rfc3339;
use toybot_engine::{
    Board, Direction, EngineError, LogEntry, MoveCommand, ParseError, Robot, Rotation,
    SimulationEngine, DEFAULT_BOARD_SIZE,
};
use toybot_protocol::{
    codes, BoardView, ErrorBody, LogRecord, MoveResponse, PlaceRequest, PositionView,
    ReportResponse, StateResponse,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub board_size: i64,
    /// Directory holding the browser client. `/` serves its `index.html`
    /// and `/static` the whole directory.
    pub static_dir: Option<PathBuf>,
    /// Skip the loopback/Tailscale peer allow-list.
    pub allow_remote: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            static_dir: None,
            allow_remote: false,
        }
    }
}

/// Every handler takes this lock for exactly one engine operation and
/// copies the result out before returning.
pub struct AppState {
    pub engine: Mutex<SimulationEngine>,
    pub static_dir: Option<PathBuf>,
    pub allow_remote: bool,
}

impl AppState {
    pub fn new(engine: SimulationEngine) -> Self {
        Self {
            engine: Mutex::new(engine),
            static_dir: None,
            allow_remote: false,
        }
    }

    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let board = Board::new(config.board_size)
            .with_context(|| format!("invalid board size: {}", config.board_size))?;
        Ok(Self {
            engine: Mutex::new(SimulationEngine::with_board(board)),
            static_dir: config.static_dir.clone(),
            allow_remote: config.allow_remote,
        })
    }

    fn with_engine<T>(
        &self,
        f: impl FnOnce(&mut SimulationEngine) -> Result<T, EngineError>,
    ) -> Result<T, ApiError> {
        let mut engine = self.engine.lock().map_err(|_| {
            error!("engine lock poisoned");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "engine state unavailable",
            )
        })?;
        f(&mut *engine).map_err(engine_error)
    }
}

pub type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/place", post(place))
        .route("/up", post(up))
        .route("/down", post(down))
        .route("/left", post(left))
        .route("/right", post(right))
        .route("/forward", post(forward))
        .route("/turn/{rotation}", post(turn))
        .route("/report", get(report))
        .route("/resize/{n}", post(resize));

    if let Some(dir) = &state.static_dir {
        router = router
            .route_service("/", ServeFile::new(dir.join("index.html")))
            .nest_service("/static", ServeDir::new(dir));
    }

    router
        .with_state(state.clone())
        // Local security: allow only loopback + Tailscale unless told otherwise.
        .layer(middleware::from_fn_with_state(state, ip_allowlist))
        // The browser client runs from a local origin. Never use
        // `Access-Control-Allow-Origin: *` here.
        .layer(local_only_cors())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

async fn place(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PlaceRequest>,
) -> ApiResult<StateResponse> {
    let direction = input
        .direction
        .as_deref()
        .map(str::parse::<Direction>)
        .transpose()
        .map_err(|e| {
            warn!(%e, "place rejected");
            api_error(StatusCode::BAD_REQUEST, codes::INVALID_DIRECTION, e.to_string())
        })?;
    let (robot, board) = state.with_engine(|engine| {
        let robot = engine.place(input.x, input.y, direction)?;
        Ok((robot, engine.board()))
    })?;
    info!(x = robot.x, y = robot.y, direction = %robot.direction, "robot placed");
    Ok(Json(StateResponse {
        position: Some(position_view(&robot)),
        board: board_view(board),
    }))
}

async fn up(State(state): State<Arc<AppState>>) -> ApiResult<MoveResponse> {
    step(&state, MoveCommand::Up)
}

async fn down(State(state): State<Arc<AppState>>) -> ApiResult<MoveResponse> {
    step(&state, MoveCommand::Down)
}

async fn left(State(state): State<Arc<AppState>>) -> ApiResult<MoveResponse> {
    step(&state, MoveCommand::Left)
}

async fn right(State(state): State<Arc<AppState>>) -> ApiResult<MoveResponse> {
    step(&state, MoveCommand::Right)
}

fn step(state: &AppState, command: MoveCommand) -> ApiResult<MoveResponse> {
    let outcome = state.with_engine(|engine| engine.move_robot(command))?;
    Ok(Json(MoveResponse {
        position: position_view(&outcome.robot),
        board: board_view(outcome.board),
        moved: outcome.moved,
    }))
}

async fn forward(State(state): State<Arc<AppState>>) -> ApiResult<MoveResponse> {
    let outcome = state.with_engine(|engine| engine.forward())?;
    Ok(Json(MoveResponse {
        position: position_view(&outcome.robot),
        board: board_view(outcome.board),
        moved: outcome.moved,
    }))
}

async fn turn(
    State(state): State<Arc<AppState>>,
    Path(rotation): Path<String>,
) -> ApiResult<StateResponse> {
    let rotation: Rotation = rotation.parse().map_err(|e: ParseError| {
        api_error(StatusCode::BAD_REQUEST, codes::INVALID_ROTATION, e.to_string())
    })?;
    let (robot, board) = state.with_engine(|engine| {
        let robot = engine.turn(rotation)?;
        Ok((robot, engine.board()))
    })?;
    Ok(Json(StateResponse {
        position: Some(position_view(&robot)),
        board: board_view(board),
    }))
}

async fn report(State(state): State<Arc<AppState>>) -> ApiResult<ReportResponse> {
    let report = state.with_engine(|engine| engine.report())?;
    Ok(Json(ReportResponse {
        position: position_view(&report.robot),
        logs: report.log.iter().map(ToString::to_string).collect(),
        history: report.log.iter().map(log_record).collect(),
        board: board_view(report.board),
    }))
}

async fn resize(
    State(state): State<Arc<AppState>>,
    Path(n): Path<i64>,
) -> ApiResult<StateResponse> {
    let snapshot = state.with_engine(|engine| engine.resize(n))?;
    info!(n, placed = snapshot.robot.is_some(), "board resized");
    Ok(Json(StateResponse {
        position: snapshot.robot.as_ref().map(position_view),
        board: board_view(snapshot.board),
    }))
}

fn position_view(robot: &Robot) -> PositionView {
    PositionView {
        x: robot.x,
        y: robot.y,
        direction: robot.direction.to_string(),
    }
}

fn board_view(board: Board) -> BoardView {
    BoardView { n: board.n() }
}

fn log_record(entry: &LogEntry) -> LogRecord {
    let position = entry.action.position();
    LogRecord {
        seq: entry.seq,
        at: entry.at.format(&Rfc3339).unwrap_or_default(),
        kind: entry.action.kind().to_string(),
        x: position.map(|(x, _)| x),
        y: position.map(|(_, y)| y),
        ok: entry.action.succeeded(),
        detail: entry.action.detail(),
        message: entry.to_string(),
    }
}

fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody::new(code, message)))
}

fn engine_error(err: EngineError) -> ApiError {
    let (status, code) = match err {
        EngineError::OutOfBounds { .. } => (StatusCode::BAD_REQUEST, codes::OUT_OF_BOUNDS),
        EngineError::InvalidSize { .. } => (StatusCode::BAD_REQUEST, codes::INVALID_SIZE),
        EngineError::NotPlaced => (StatusCode::CONFLICT, codes::NOT_PLACED),
    };
    warn!(%err, code, "request rejected");
    api_error(status, code, err.to_string())
}

pub async fn serve(addr: SocketAddr, config: ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    serve_listener(listener, config, shutdown_signal(tokio::signal::ctrl_c()))
    .await?;
    Ok(())
}

/// Resolves once `signal` fires. A signal source that fails to install
/// never resolves, so the server keeps running instead of exiting at once.
async fn shutdown_signal(signal: impl std::future::Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        // Without a handler the only way out is killing the process.
        error!(%e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}

pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    config: ServerConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state);
    let addr = listener.local_addr()?;
    info!(%addr, board_size = config.board_size, "toy robot server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    info!("server stopped");
    Ok(addr)
}

async fn ip_allowlist(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: axum::extract::Request,
    next: middleware::Next,
) -> axum::response::Response {
    let ip = peer.ip();
    if state.allow_remote || is_allowed_peer_ip(ip) {
        return next.run(req).await;
    }
    warn!(%ip, "peer rejected by allow-list");
    (StatusCode::FORBIDDEN, "forbidden").into_response()
}

fn is_allowed_peer_ip(ip: IpAddr) -> bool {
    if ip.is_loopback() {
        return true;
    }

    match ip {
        // Tailscale CGNAT range (100.64.0.0/10).
        IpAddr::V4(v4) => {
            let o = v4.octets();
            o[0] == 100 && (64..=127).contains(&o[1])
        }
        IpAddr::V6(v6) => v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
    }
}

fn local_only_cors() -> CorsLayer {
    use axum::http::header;
    use axum::http::Method;

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _req| {
            is_allowed_local_origin(origin)
        }))
}

fn is_allowed_local_origin(origin: &HeaderValue) -> bool {
    let Ok(s) = origin.to_str() else {
        return false;
    };

    is_http_origin_for_host(s, "localhost") || is_http_origin_for_host(s, "127.0.0.1")
}

fn is_http_origin_for_host(origin: &str, host: &str) -> bool {
    for scheme in ["http://", "https://"] {
        if let Some(rest) = origin.strip_prefix(scheme) {
            if let Some(after) = rest.strip_prefix(host) {
                // scheme://host[:port] only
                return after.is_empty() || after.starts_with(':');
            }
        }
    }
    false
}
