//! Line-oriented console host.
//!
//! Each input line becomes one inbound message for the plugin registry:
//!
//! - plain text is sent as a text message
//! - `/image <path|url>` sends an image by reference
//! - `/as <user> [group]` switches the sender identity
//! - `/quit` ends the session

use {
    anyhow::Result,
    faceswap_channels::PluginRegistry,
    faceswap_common::types::{ImagePayload, InboundMessage},
    tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    tracing::debug,
};

pub const DEFAULT_USER: &str = "console";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Text(String),
    Image(String),
    SwitchUser {
        user: String,
        group: Option<String>,
    },
    Quit,
    /// Blank line or a malformed command, with a hint for the user.
    Skip(Option<&'static str>),
}

pub fn parse_line(line: &str) -> ConsoleLine {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return ConsoleLine::Skip(None);
    }

    let Some(command) = line.strip_prefix('/') else {
        return ConsoleLine::Text(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("image") => match parts.next() {
            Some(reference) => ConsoleLine::Image(reference.to_string()),
            None => ConsoleLine::Skip(Some("usage: /image <path|url>")),
        },
        Some("as") => match parts.next() {
            Some(user) => ConsoleLine::SwitchUser {
                user: user.to_string(),
                group: parts.next().map(str::to_string),
            },
            None => ConsoleLine::Skip(Some("usage: /as <user> [group]")),
        },
        Some("quit" | "exit") => ConsoleLine::Quit,
        _ => ConsoleLine::Text(line.to_string()),
    }
}

/// Feed `input` to `registry` line by line, writing replies to `output`.
pub async fn run<R, W>(registry: &PluginRegistry, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut user = DEFAULT_USER.to_string();
    let mut group: Option<String> = None;
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let msg = match parse_line(&line) {
            ConsoleLine::Text(text) => InboundMessage::text(&user, text),
            ConsoleLine::Image(reference) => {
                InboundMessage::image(&user, ImagePayload::Reference(reference))
            },
            ConsoleLine::SwitchUser {
                user: next_user,
                group: next_group,
            } => {
                user = next_user;
                group = next_group;
                output
                    .write_all(format!("(now {})\n", identity(&user, group.as_deref())).as_bytes())
                    .await?;
                continue;
            },
            ConsoleLine::Quit => break,
            ConsoleLine::Skip(hint) => {
                if let Some(hint) = hint {
                    output.write_all(format!("{hint}\n").as_bytes()).await?;
                }
                continue;
            },
        };
        let msg = match &group {
            Some(group) => msg.in_group(group),
            None => msg,
        };

        match registry.dispatch(&msg).await {
            Some(dispatched) => {
                output
                    .write_all(format!("{}\n", dispatched.reply).as_bytes())
                    .await?;
            },
            None => debug!(session_key = %msg.session_key(), "no plugin replied"),
        }
        output.flush().await?;
    }

    Ok(())
}

fn identity(user: &str, group: Option<&str>) -> String {
    match group {
        Some(group) => format!("{user} in {group}"),
        None => user.to_string(),
    }
}
