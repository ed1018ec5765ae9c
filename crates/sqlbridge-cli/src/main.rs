use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

mod rpc;

use rpc::{tool_payload, RpcClient};

const SAMPLE_QUERY: &str =
    "SELECT TOP 3 TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_TYPE = 'BASE TABLE'";

#[derive(Parser)]
#[command(name = "sqlbridge", about = "sqlbridge CLI - client for the SQL Server MCP server")]
struct Cli {
    /// sqlbridge server URL
    #[arg(long, env = "SQLBRIDGE_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools the server exposes
    Tools,

    /// Call a tool and print its result
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, short, default_value = "{}")]
        args: String,
    },

    /// Show the server's initialize response
    Info,

    /// Check server and database health
    Health,

    /// Run get_database_info, list_tables and a sample query
    Smoke,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = RpcClient::new(&cli.url);

    match cli.command {
        Commands::Tools => {
            let resp = client.call("tools/list", None).await?;
            print_envelope(&resp)?;
        }
        Commands::Call { tool, args } => {
            let arguments: Value = serde_json::from_str(&args)
                .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))?;
            let resp = client.call_tool(&tool, arguments).await?;
            if resp.get("error").is_some() {
                print_envelope(&resp)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&tool_payload(&resp))?);
            }
        }
        Commands::Info => {
            let resp = client.call("initialize", Some(json!({}))).await?;
            print_envelope(&resp)?;
        }
        Commands::Health => {
            let body = client.get("/health").await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Smoke => smoke(&client).await?,
    }

    Ok(())
}

fn print_envelope(resp: &Value) -> anyhow::Result<()> {
    if let Some(result) = resp.get("result") {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if let Some(error) = resp.get("error") {
        eprintln!("Error: {}", serde_json::to_string_pretty(error)?);
    }
    Ok(())
}

/// Exercise the read-only tools against a live server.
async fn smoke(client: &RpcClient) -> anyhow::Result<()> {
    let steps = [
        ("get_database_info", json!({})),
        ("list_tables", json!({})),
        (
            "query_database",
            json!({
                "query": SAMPLE_QUERY,
                "limit": 3
            }),
        ),
    ];

    for (tool, arguments) in steps {
        println!("Testing {tool}...");
        match client.call_tool(tool, arguments).await {
            Ok(resp) => println!("{}", serde_json::to_string_pretty(&resp)?),
            Err(e) => println!("{}", json!({"error": format!("Request failed: {e}")})),
        }
        println!();
    }

    println!("Tests completed!");
    Ok(())
}
