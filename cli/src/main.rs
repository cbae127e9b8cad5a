mod script;
mod session;

use std::path::Path;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use protocol::MediaKind;
use serde_json::Value;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("connection lost ({0}); reload the session")]
    ConnectionLost(String),
    #[error("channel error: {0}")]
    Channel(#[from] annotations::channel::ChannelError),
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("script error: {0}")]
    Script(String),
    #[error("file error: {0}")]
    File(String),
}

/// Accept a room code as printed by `room-code`, in either case.
fn parse_room_code(raw: &str) -> Result<String, String> {
    let code = raw.trim().to_ascii_uppercase();
    if annotations::ids::is_room_code(&code) {
        Ok(code)
    } else {
        Err(format!("`{raw}` is not a room code (five characters of A-Z or 0-9, e.g. K3Z9Q)"))
    }
}

#[derive(Parser, Debug)]
#[command(name = "annoroom-cli", about = "Annotation room relay CLI")]
struct Cli {
    #[arg(long, env = "ANNOROOM_BASE_URL", default_value = "http://127.0.0.1:8081")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the relay is up.
    Ping,
    /// Print a fresh room code.
    RoomCode,
    /// Join a room and drive it from a script of input events.
    Session(SessionCommand),
    /// Upload a reference file to a room.
    Upload(UploadCommand),
    /// List files uploaded to a room.
    Uploads {
        #[arg(long, value_parser = parse_room_code)]
        room: String,
    },
}

#[derive(Args, Debug)]
struct SessionCommand {
    #[arg(long, value_parser = parse_room_code)]
    room: String,

    #[arg(long, default_value = "-", help = "Script file path, or - for stdin")]
    script: String,

    #[arg(long, default_value_t = 500, help = "Keep listening this long after the script ends")]
    linger_ms: u64,
}

#[derive(Args, Debug)]
struct UploadCommand {
    #[arg(long, value_parser = parse_room_code)]
    room: String,

    #[arg(long)]
    kind: MediaKind,

    path: String,

    #[arg(long, default_value_t = false, help = "Announce the file to the room after uploading")]
    announce: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::RoomCode => {
            println!("{}", annotations::ids::room_code());
            Ok(())
        }
        Command::Session(args) => {
            let args = session::SessionArgs {
                room: args.room,
                script: args.script,
                linger: Duration::from_millis(args.linger_ms),
            };
            session::run(&ctx, args).await
        }
        Command::Upload(args) => run_upload(&ctx, args).await,
        Command::Uploads { room } => run_list_uploads(&ctx, &room).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_upload(cli: &CliContext, args: UploadCommand) -> Result<(), CliError> {
    let path = Path::new(&args.path);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CliError::File(format!("read {}: {e}", args.path)))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or(CliError::MissingField("filename"))?;
    let mime = guess_mime(&filename, args.kind);

    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename).mime_str(mime)?;
    let form = reqwest::multipart::Form::new()
        .text("annotationRoomCode", args.room.clone())
        .part("file", part);

    let url = format!("{}/api/upload/{}", cli.base_url.trim_end_matches('/'), args.kind);
    let response = reqwest::Client::new().post(url).multipart(form).send().await?;
    let json = read_json_response(response).await?;
    print_json(&json)?;

    if args.announce {
        let url = json
            .get("url")
            .and_then(Value::as_str)
            .ok_or(CliError::MissingField("url"))?;
        let notice = session::file_notice(args.kind, url.to_owned(), &args.room);
        session::announce(cli, &args.room, &notice).await?;
        eprintln!("announced {url} to room {}", args.room);
    }
    Ok(())
}

async fn run_list_uploads(cli: &CliContext, room: &str) -> Result<(), CliError> {
    let url = format!("{}/api/uploads", cli.base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .get(url)
        .query(&[("sessionCode", room)])
        .send()
        .await?;
    let json = read_json_response(response).await?;
    print_json(&json)
}

async fn read_json_response(response: reqwest::Response) -> Result<Value, CliError> {
    let status = response.status();
    let json = response.json::<Value>().await?;
    if !status.is_success() {
        let message = json
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_owned();
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }
    Ok(json)
}

/// Content type sent with an upload, picked from the file extension.
fn guess_mime(filename: &str, kind: MediaKind) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match (kind, ext.as_str()) {
        (MediaKind::Pdf, _) => "application/pdf",
        (MediaKind::Image, "png") => "image/png",
        (MediaKind::Image, "jpg" | "jpeg") => "image/jpeg",
        (MediaKind::Image, "gif") => "image/gif",
        (MediaKind::Image, "webp") => "image/webp",
        (MediaKind::Image, "svg") => "image/svg+xml",
        (MediaKind::Video, "mp4" | "m4v") => "video/mp4",
        (MediaKind::Video, "webm") => "video/webm",
        (MediaKind::Video, "mov") => "video/quicktime",
        (MediaKind::Video, "ogg" | "ogv") => "video/ogg",
        (MediaKind::Image | MediaKind::Video, _) => "application/octet-stream",
    }
}

fn ws_url(base_url: &str) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/ws"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/ws"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
