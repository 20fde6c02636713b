//! Echo Bot Demo
//!
//! A small bot showing the pieces of tabby working together: clap commands,
//! typed event handlers and the NapCat extension.
//!
//! The bot speaks OneBot frames as line-delimited JSON on stdin and stdout,
//! so any WebSocket bridge can connect it to a gateway:
//!
//! ```bash
//! websocat -t ws://localhost:3001/ sh-c:'cargo run --package echo-bot'
//! ```
//!
//! Logs go to stderr, since stdout carries the frames.

use std::path::PathBuf;

use anyhow::Result;
use tabby::prelude::*;
use tabby::runtime::config::{ConfigLoader, LogOutput};
use tabby::runtime::logging;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Command line of the demo binary itself.
#[derive(Parser, Debug)]
#[command(name = "echo-bot", about = "Echo bot demo for tabby")]
struct Cli {
    /// Config file; searched for in the usual places when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Commands
// ============================================================================

/// Repeat the given words.
#[derive(Parser, Debug)]
struct Echo {
    words: Vec<String>,
}

async fn echo(res: ParseResult<Echo>) -> String {
    match res.args {
        Some(echo) if !echo.words.is_empty() => echo.words.join(" "),
        Some(_) => "Nothing to echo".to_owned(),
        None => res.output().trim_end().to_owned(),
    }
}

/// Reply with pong.
#[derive(Parser, Debug)]
struct Ping {}

async fn ping(_res: ParseResult<Ping>) -> String {
    "Pong!".to_owned()
}

/// Describe the message that ran this command.
#[derive(Parser, Debug)]
struct Info {}

async fn info_command(res: ParseResult<Info>) -> Option<String> {
    let msg = res.message()?;
    let text = match &msg.kind {
        MessageKind::Private(private) => format!(
            "Private message {} from {} ({})",
            msg.message_id, private.sender.user.nickname, msg.user_id
        ),
        MessageKind::Group(group) => format!(
            "Group {} message {} from {} ({}), role {:?}",
            group.group_id,
            msg.message_id,
            group.sender.display_name(),
            msg.user_id,
            group.sender.role
        ),
        MessageKind::Unknown => return None,
    };
    Some(text)
}

/// Set the bot's avatar from a URL.
#[derive(Parser, Debug)]
struct Avatar {
    url: String,
}

async fn avatar(res: ParseResult<Avatar>) -> String {
    let Some(args) = &res.args else {
        return res.output().trim_end().to_owned();
    };
    match res.ctx.api().set_qq_avatar(&args.url).await {
        Ok(()) => "Avatar updated".to_owned(),
        Err(e) => format!("Failed to set avatar: {e}"),
    }
}

/// Count pending group invitations and join requests.
#[derive(Parser, Debug)]
struct Requests {}

async fn requests(res: ParseResult<Requests>) -> ApiResult<String> {
    let pending = res.ctx.api().get_group_system_msg().await?;
    Ok(format!(
        "{} invitation(s), {} join request(s)",
        pending.invited_requests.len(),
        pending.join_requests.len()
    ))
}

/// List the commands.
#[derive(Parser, Debug)]
struct Help {}

async fn help(_res: ParseResult<Help>) -> String {
    [
        "echo <words>  - repeat the words",
        "ping          - pong",
        "info          - describe this message",
        "avatar <url>  - set the bot's avatar",
        "requests      - pending group requests",
        "help          - this list",
        "Add --help to any command for its usage.",
    ]
    .join("\n")
}

// ============================================================================
// Event Handlers
// ============================================================================

async fn log_message(msg: MessageEvent) {
    let text = msg.message.plain_text();
    match &msg.kind {
        MessageKind::Private(private) => {
            info!("[Private] {} ({}): {}", private.sender.user.nickname, msg.user_id, text);
        }
        MessageKind::Group(group) => {
            info!(
                "[Group {}] {} ({}): {}",
                group.group_id,
                group.sender.display_name(),
                msg.user_id,
                text
            );
        }
        MessageKind::Unknown => {}
    }
}

async fn greet_member(notice: NoticeEvent, api: ApiClient) {
    let NoticeKind::GroupIncrease(joined) = &notice.kind else {
        return;
    };
    let welcome = Chain::new().at(notice.user_id.get()).text(" Welcome!");
    if let Err(e) = api.send_group_msg(joined.group_id, welcome).await {
        error!("Failed to greet new member: {e}");
    }
}

async fn poke_back(notice: NoticeEvent, api: ApiClient) {
    let NoticeKind::Poke(poke) = &notice.kind else {
        return;
    };
    if poke.group_id.get() == 0 {
        return;
    }
    let reply = Chain::new().at(notice.user_id.get()).text(" Stop poking me!");
    if let Err(e) = api.send_group_msg(poke.group_id, reply).await {
        error!("Failed to answer poke: {e}");
    }
}

async fn accept_friends(request: RequestEvent, api: ApiClient) {
    if request.kind != RequestKind::Friend {
        return;
    }
    match request.approve(&api, "").await {
        Ok(()) => info!(user_id = %request.user_id, "Accepted friend request"),
        Err(e) => warn!("Failed to accept friend request: {e}"),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = match &cli.config {
        Some(path) => ConfigLoader::new().file(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;

    let mut log_config = config.logging.clone();
    if log_config.output == LogOutput::Stdout {
        log_config.output = LogOutput::Stderr;
    }
    logging::init_from_config(&log_config);

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(64);
    let (inbound_tx, inbound_rx) = mpsc::channel::<Vec<u8>>(64);

    let mut bot = Bot::new(config.bot, outbound_tx);
    bot.register_extension(tabby::napcat::extension())?;

    bot.dispatcher_mut()
        .on_group_message(log_message)
        .on_private_message(log_message)
        .on_notice(greet_member)
        .on_notice(poke_back)
        .on_request(accept_friends)
        .command(on_command::<Echo>("echo").handler(echo))
        .command(on_command::<Ping>("ping").handler(ping))
        .command(on_command::<Info>("info").handler(info_command))
        .command(on_command::<Avatar>("avatar").handler(avatar))
        .command(on_command::<Requests>("requests").handler(requests))
        .command(on_command::<Help>("help").handler(help));

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    if inbound_tx.send(line.into_bytes()).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read stdin: {e}");
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(mut frame) = outbound_rx.recv().await {
            frame.push(b'\n');
            if let Err(e) = stdout.write_all(&frame).await {
                error!("Failed to write frame: {e}");
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let shutdown = bot.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            shutdown.cancel();
        }
    });

    bot.run(inbound_rx).await?;
    Ok(())
}
