//! `testclient`-equivalent demo binary: connect, run `api status`, print
//! the reply body.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "esl-cli", about = "Minimal FreeSWITCH Event Socket client")]
struct Args {
    /// ESL host to connect to.
    #[arg(long)]
    host: Option<String>,

    /// ESL port to connect to.
    #[arg(long)]
    port: Option<u16>,

    /// Username for `userauth`; omit for plain password `auth`.
    #[arg(long)]
    user: Option<String>,

    /// Inbound-socket password.
    #[arg(long)]
    password: Option<String>,

    /// Optional ini-style config file layered under the flags above.
    #[arg(long)]
    config: Option<PathBuf>,
}

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8021;
const DEFAULT_PASSWORD: &str = "ClueCon";

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let file_config = args
        .config
        .as_deref()
        .and_then(|path| Config::load(path).map_err(|e| tracing::warn!("failed to read config {path:?}: {e}")).ok());

    let host = args
        .host
        .or_else(|| file_config.as_ref().and_then(|c| c.get("connection", "host")).map(String::from))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = args
        .port
        .or_else(|| file_config.as_ref().and_then(|c| c.get("connection", "port")).and_then(|p| p.parse().ok()))
        .unwrap_or(DEFAULT_PORT);
    let user = args
        .user
        .or_else(|| file_config.as_ref().and_then(|c| c.get("auth", "user")).map(String::from))
        .unwrap_or_default();
    let password = args
        .password
        .or_else(|| file_config.as_ref().and_then(|c| c.get("auth", "password")).map(String::from))
        .unwrap_or_else(|| DEFAULT_PASSWORD.to_string());

    let mut handle = match esl::Handle::connect_timeout(&host, port, &user, &password, 5_000) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("Failed to connect to ESL at {host}:{port}: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = handle.send_recv_timed("api status\n\n", 5_000) {
        eprintln!("Failed to send command: {err}");
        handle.disconnect();
        return ExitCode::FAILURE;
    }

    match handle.last_sr_event().and_then(esl::Event::get_body_str) {
        Some(body) => println!("{body}"),
        None => {
            let reply = handle.last_sr_reply();
            if reply.is_empty() {
                eprintln!("No reply received");
                handle.disconnect();
                return ExitCode::FAILURE;
            }
            println!("{reply}");
        }
    }

    handle.disconnect();
    ExitCode::SUCCESS
}
