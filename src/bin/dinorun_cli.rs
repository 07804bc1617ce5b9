//! One-shot CLI client for the dino backend.
//!
//! Examples:
//!   dinorun-cli start Alice
//!   dinorun-cli restart
//!   dinorun-cli jump
//!   dinorun-cli duck on
//!   dinorun-cli status
//!
//! By default it talks to http://127.0.0.1:5000; override with
//! `--server <url>` or the DINORUN_SERVER env var.

use std::process;

use dinorun::api::{self, format_status, GameApi, HttpApi};
use dinorun::controller::DEFAULT_PLAYER;

fn usage() -> ! {
    eprintln!("dinorun-cli (talks to {} by default)", api::DEFAULT_SERVER);
    eprintln!("Usage: dinorun-cli [--server url] <command> [args]\n");
    eprintln!("Commands:");
    eprintln!("  start [name]   Begin a session (default name: {DEFAULT_PLAYER})");
    eprintln!("  restart        Reset the current session");
    eprintln!("  jump           Attempt a jump");
    eprintln!("  duck <on|off>  Set the duck posture");
    eprintln!("  status         Fetch one status snapshot");
    process::exit(1);
}

fn parse_args() -> (HttpApi, Vec<String>) {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    let mut api = HttpApi::from_env();
    if args.len() >= 2 && args[0] == "--server" {
        api = HttpApi::new(args[1].clone());
        args.drain(0..2);
    }

    if args.is_empty() {
        usage();
    }

    (api, args)
}

fn fail(message: String) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let (api, args) = parse_args();
    let cmd = args[0].as_str();

    match cmd {
        "start" => {
            let name = args.get(1).map(String::as_str).unwrap_or(DEFAULT_PLAYER);
            match api.start_game(name).await {
                Ok(reply) if reply.success => match reply.game_id {
                    Some(id) => println!("started session {id} as {name}"),
                    None => println!("started session as {name}"),
                },
                Ok(reply) => fail(format!(
                    "start refused: {}",
                    reply.error.unwrap_or_else(|| "unknown error".into())
                )),
                Err(e) => fail(e.to_string()),
            }
        }
        "restart" => match api.restart().await {
            Ok(reply) if reply.success => println!("session restarted"),
            Ok(reply) => fail(format!(
                "restart refused: {}",
                reply.error.unwrap_or_else(|| "unknown error".into())
            )),
            Err(e) => fail(e.to_string()),
        },
        "jump" => match api.jump().await {
            Ok(reply) if reply.success && reply.jump_ok => println!("jump ok"),
            Ok(reply) if reply.success => println!("jump refused"),
            Ok(_) => fail("jump failed".into()),
            Err(e) => fail(e.to_string()),
        },
        "duck" => {
            let duck = match args.get(1).map(String::as_str) {
                Some("on") => true,
                Some("off") => false,
                _ => usage(),
            };
            match api.duck(duck).await {
                Ok(reply) if reply.success => {
                    println!("duck {}", if duck { "on" } else { "off" })
                }
                Ok(_) => fail("duck refused".into()),
                Err(e) => fail(e.to_string()),
            }
        }
        "status" => match api.update().await {
            Ok(reply) if reply.success => match reply.status {
                Some(status) => println!("{}", format_status(&status)),
                None => fail("update reply carried no status".into()),
            },
            Ok(reply) => fail(format!(
                "update refused: {}",
                reply.error.unwrap_or_else(|| "unknown error".into())
            )),
            Err(e) => fail(e.to_string()),
        },
        _ => usage(),
    }
}
