// src/bin/client.rs

//! A console client for the chat relay.

use anyhow::Result;
use chatrelay::client::{
    CONNECT_TIMEOUT, HandshakeReply, SERVER_DATA_FILE, ServerData, connect_with_timeout,
};
use chatrelay::core::protocol::{InboundFrame, LineFramed, framed_lines};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::env;
use tokio::io::Stdin;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::warn;

type Console = FramedRead<Stdin, LinesCodec>;

const MAX_SERVER_LINE: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("chatrelay-client version {VERSION}");
        return Ok(());
    }
    let password_mode = !args.contains(&"--no-password".to_string());
    let server_data_path = args
        .iter()
        .position(|arg| arg == "--server-data")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .unwrap_or(SERVER_DATA_FILE);

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .with_ansi(true)
        .init();

    let mut console = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    let Some(stream) = choose_server(&mut console, server_data_path).await? else {
        return Ok(());
    };
    run_chat(stream, &mut console, password_mode).await
}

/// The next text line from the server. Over-long lines are skipped.
async fn next_server_line(framed: &mut LineFramed<TcpStream>) -> Result<Option<String>> {
    while let Some(frame) = framed.next().await {
        match frame? {
            InboundFrame::Line(line) => return Ok(Some(line)),
            InboundFrame::TooLong => warn!("Skipped an over-long line from the server."),
        }
    }
    Ok(None)
}

/// Prints `text` and reads one console line. `None` on end of input.
async fn prompt(console: &mut Console, text: &str) -> Result<Option<String>> {
    println!("{text}");
    match console.next().await {
        Some(line) => Ok(Some(line?)),
        None => Ok(None),
    }
}

/// Tries the remembered server first, then asks the user until a connection
/// succeeds or they give up.
async fn choose_server(console: &mut Console, server_data_path: &str) -> Result<Option<TcpStream>> {
    match ServerData::load(server_data_path) {
        Ok(Some(saved)) => {
            println!("Connecting to saved server...");
            if let Some(stream) = connect_with_timeout(&saved.ip, saved.port, CONNECT_TIMEOUT).await
            {
                println!(
                    "Successful connection to the server! \n(IP-address = \"{}\", Port = \"{}\") \n",
                    saved.ip, saved.port
                );
                return Ok(Some(stream));
            }
            println!("Unfortunately, were unable to connect to the saved server :с");
        }
        Ok(None) => {}
        Err(e) => println!("Error occurred while reading server data: {e:#}"),
    }

    loop {
        let Some(ip) = prompt(console, "Enter the server IP-address:").await? else {
            return Ok(None);
        };
        let Some(port) = prompt(console, "Enter server port:").await? else {
            return Ok(None);
        };
        let Ok(port) = port.trim().parse::<u16>() else {
            println!("Invalid IP address or port! Be more attentive =з");
            continue;
        };

        let ip = ip.trim().to_string();
        if let Some(stream) = connect_with_timeout(&ip, port, CONNECT_TIMEOUT).await {
            println!("Successful connection to the server! c:");
            if let Err(e) = (ServerData { ip, port }).save(server_data_path) {
                warn!("Could not remember the server: {:#}", e);
            }
            return Ok(Some(stream));
        }

        let answer = prompt(
            console,
            "Failed to connect to the server! :с \nIf you want to exit, type \"stop\". \nIf you want to try connecting again, type \"more\".",
        )
        .await?;
        match answer {
            Some(answer) if answer.trim().eq_ignore_ascii_case("stop") => return Ok(None),
            None => return Ok(None),
            Some(_) => continue,
        }
    }
}

async fn run_chat(stream: TcpStream, console: &mut Console, password_mode: bool) -> Result<()> {
    let mut framed = framed_lines(stream, MAX_SERVER_LINE);

    'names: loop {
        let Some(name) = prompt(console, "Enter your name:").await? else {
            return Ok(());
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        framed.send(name.as_str()).await?;

        if password_mode {
            let Some(password) = prompt(console, "Enter your password:").await? else {
                return Ok(());
            };
            framed.send(password).await?;
        }

        loop {
            let Some(reply) = next_server_line(&mut framed).await? else {
                println!("Connection closed by the server.");
                return Ok(());
            };
            match HandshakeReply::classify(&reply) {
                HandshakeReply::Welcome => {
                    println!("Welcome to the chat, {name}!");
                    if let Some(listing) = next_server_line(&mut framed).await? {
                        println!("{listing}");
                    }
                    break 'names;
                }
                HandshakeReply::NameTaken => {
                    println!("This name is already taken! Enter another name.");
                    continue 'names;
                }
                HandshakeReply::IncorrectPassword => {
                    let Some(password) = prompt(console, "Incorrect password! Try again:").await?
                    else {
                        return Ok(());
                    };
                    framed.send(password).await?;
                }
                // The password was already sent along with the name.
                HandshakeReply::PasswordPrompt => println!("Creating a new account for {name}."),
                HandshakeReply::Other(line) => println!("{line}"),
            }
        }
    }

    println!("Enter your message:");
    let (mut sink, mut incoming): (SplitSink<LineFramed<TcpStream>, String>, _) = framed.split();

    let receive = async {
        while let Some(frame) = incoming.next().await {
            match frame {
                Ok(InboundFrame::Line(line)) if line.is_empty() => {}
                Ok(InboundFrame::Line(line)) => println!("{line}"),
                Ok(InboundFrame::TooLong) => warn!("Skipped an over-long line from the server."),
                Err(e) => {
                    println!("{e}");
                    break;
                }
            }
        }
    };

    let send = async {
        while let Some(line) = console.next().await {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            sink.send(line).await?;
        }
        Ok::<(), anyhow::Error>(())
    };

    tokio::select! {
        _ = receive => println!("Disconnected from the server."),
        res = send => res?,
    }
    Ok(())
}
