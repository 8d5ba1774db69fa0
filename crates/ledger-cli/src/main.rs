use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount; any JSON number, e.g. -5 or 2.5
        #[arg(long, allow_hyphen_values = true)]
        amount: serde_json::Number,
    },
    /// List pending transactions
    Pending,
    /// Print the full chain
    Chain,
    /// Mine the pending transactions into a block
    Mine,
    /// Register peer nodes
    Register {
        /// Peer addresses, e.g. 127.0.0.1:8081
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Run consensus against registered peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: serde_json::Number,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();

    let request = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => client.post(format!("{node}/transactions/new")).json(&Tx {
            sender,
            recipient,
            amount,
        }),
        Command::Pending => client.get(format!("{node}/transactions")),
        Command::Chain => client.get(format!("{node}/chain")),
        Command::Mine => client.get(format!("{node}/mine")),
        Command::Register { nodes } => client
            .post(format!("{node}/nodes/new"))
            .json(&Nodes { nodes }),
        Command::Resolve => client.get(format!("{node}/nodes/resolve")),
    };

    debug!(?request, "sending");
    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
