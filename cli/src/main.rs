use anyhow::Result;
use clap::{Parser, Subcommand};
use muresp::commands;
use muresp::Client;

#[derive(Parser)]
#[command(name = "muresp-cli")]
#[command(about = "An interactive CLI client for muresp", long_about = None)]
struct Cli {
    #[arg(short = 'H', long, default_value = "127.0.0.1", global = true)]
    host: String,
    #[arg(short, long, default_value_t = 6379, global = true)]
    port: u16,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a PING command
    Ping,
    /// Set a key-value pair
    Set { key: String, value: String },
    /// Get a value by key
    Get { key: String },
    /// Append an entry to a stream
    Xadd { stream: String, id: String, field: String, value: String },
    /// Report a stream's length
    Xlen { stream: String },
    /// Subscribe to one or more channels and print messages as they arrive
    Subscribe { channels: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let client = Client::connect_tcp(&format!("{}:{}", cli.host, cli.port)).await?;

    match cli.command {
        Commands::Ping => {
            let reply = commands::ping(&client).await?;
            println!("{reply}");
        }
        Commands::Set { key, value } => {
            let ok = commands::set(&client, &key, &value).await?;
            println!("{}", if ok { "OK" } else { "FAILED" });
        }
        Commands::Get { key } => match commands::get(&client, &key).await? {
            Some(value) => println!("{value}"),
            None => println!("(nil)"),
        },
        Commands::Xadd { stream, id, field, value } => {
            let assigned_id = commands::xadd(&client, &stream, &id, &[(field, value)]).await?;
            println!("{assigned_id}");
        }
        Commands::Xlen { stream } => {
            let len = commands::xlen(&client, &stream).await?;
            println!("{len}");
        }
        Commands::Subscribe { channels } => {
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(String, Vec<u8>)>();
            client
                .subscribe(channels, move |channel, payload| {
                    let _ = tx.send((channel.to_string(), payload.to_vec()));
                })
                .await?;
            println!("subscribed, waiting for messages (Ctrl-C to quit)...");
            while let Some((channel, payload)) = rx.recv().await {
                println!("{channel}: {}", String::from_utf8_lossy(&payload));
            }
        }
    }

    Ok(())
}
