use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use pipefy_flow::client::{GraphQlTransport, ReqwestTransport};
use pipefy_flow::config::Config;
use pipefy_flow::storage::{FileStore, KvStore};
use pipefy_flow::stream_engine::nodes::triggers::lifecycle::webhook_url;
use pipefy_flow::stream_engine::nodes::{ConsoleOutputNode, PipefyTrigger, PipefyTriggerConfig, WebhookLifecycle};
use pipefy_flow::stream_engine::{NodeFactory, StreamNode};
use pipefy_flow::{webhook, PipefyClient};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Pipefy nodes for workflow automation", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// GraphQL endpoint (default: https://app.pipefy.com/graphql)
    #[arg(long, global = true, env = "PIPEFY_ENDPOINT")]
    endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store the API token (encrypted) in the config file
    Credentials {
        #[command(subcommand)]
        cmd: CredentialCommands,
    },
    /// Print the node and credential descriptions as JSON
    NodeTypes,
    /// Manage webhooks of a pipe directly
    Webhooks {
        #[command(subcommand)]
        cmd: WebhookCommands,
    },
    /// Drive the trigger node's registration hooks
    Trigger {
        #[command(subcommand)]
        cmd: TriggerCommands,
        /// Path to the trigger node config (YAML/JSON)
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long, default_value = "default")]
        workflow: String,
        #[arg(long, default_value = "pipefy_trigger")]
        node: String,
    },
    /// Run a node definition over input items and print its output
    Run {
        /// Node file: `{ type, config }` (YAML/JSON)
        #[arg(short, long)]
        file: PathBuf,
        /// JSON file holding one item or an array of items
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Serve the inbound webhook route for a trigger and print received events
    Serve {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long, default_value = "default")]
        workflow: String,
        #[arg(long, default_value = "pipefy_trigger")]
        node: String,
        #[arg(long, default_value = "127.0.0.1:5678")]
        addr: SocketAddr,
        /// Register the webhook on Pipefy before serving
        #[arg(long)]
        activate: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CredentialCommands {
    Set {
        #[arg(long)]
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum WebhookCommands {
    List {
        #[arg(long)]
        pipe: String,
    },
    Create {
        #[arg(long)]
        pipe: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        url: String,
    },
}

#[derive(Subcommand, Debug)]
enum TriggerCommands {
    Exists,
    Activate {
        /// Callback URL; defaults to `webhook_base_url` from the config
        #[arg(long)]
        url: Option<String>,
    },
    Deactivate,
    State,
}

#[derive(Deserialize)]
struct NodeFile {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    config: Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load()?;
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    handle_command(args.command, config).await
}

fn load_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    // YAML is a superset of JSON
    Ok(serde_yaml::from_str(&content)?)
}

fn transport(config: &Config) -> Arc<dyn GraphQlTransport> {
    Arc::new(ReqwestTransport::new(config.endpoint()))
}

fn trigger_from_file(path: &Path, config: &Config) -> Result<PipefyTrigger> {
    let node_config: Value = load_file(path)?;
    let client = PipefyClient::from_secrets(&config.secrets()?, transport(config))?;
    Ok(PipefyTrigger::new(client, PipefyTriggerConfig::from_value(node_config)?))
}

fn callback_url(config: &Config, url: Option<String>, workflow: &str, node: &str) -> Result<String> {
    match url {
        Some(u) => Ok(u),
        None => config
            .webhook_base_url
            .as_deref()
            .map(|base| webhook_url(base, workflow, node))
            .ok_or_else(|| anyhow!("No callback URL given and no webhook_base_url configured")),
    }
}

async fn run_node(node: Box<dyn StreamNode>, items: Vec<Value>) -> Result<Vec<Value>> {
    let (in_tx, in_rx) = mpsc::channel(100);
    let (out_tx, mut out_rx) = mpsc::channel(100);

    let runner = tokio::spawn(async move { node.run(vec![in_rx], vec![out_tx]).await });
    tokio::spawn(async move {
        for item in items {
            if in_tx.send(item).await.is_err() {
                break;
            }
        }
    });

    let mut outputs = Vec::new();
    while let Some(v) = out_rx.recv().await {
        outputs.push(v);
    }
    runner.await??;
    Ok(outputs)
}

async fn handle_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Credentials { cmd: CredentialCommands::Set { token } } => {
            config.set_api_token(&token)?;
            config.save()?;
            println!("API token saved to {}", Config::get_path()?.display());
        }
        Commands::NodeTypes => {
            let out = json!({
                "nodes": pipefy_flow::node_registry::get_node_registry(),
                "credentials": pipefy_flow::integration_registry::get_integration_registry()
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Webhooks { cmd } => {
            let node_config = match cmd {
                WebhookCommands::List { pipe } => json!({
                    "resource": "webhook", "operation": "show", "pipe_id": pipe
                }),
                WebhookCommands::Create { pipe, name, email, url } => json!({
                    "resource": "webhook", "operation": "create",
                    "pipe_id": pipe, "name": name, "email": email, "url": url
                }),
            };
            let factory = NodeFactory::new(transport(&config));
            let node = factory.create("pipefy", node_config, &config.secrets()?)?;
            for record in run_node(node, vec![Value::Null]).await? {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Commands::Trigger { cmd, file, workflow, node } => {
            let trigger = Arc::new(trigger_from_file(&file, &config)?);
            let store: Arc<dyn KvStore> = Arc::new(FileStore::default_location()?);
            let lifecycle = WebhookLifecycle::new(trigger, store, &workflow, &node);
            match cmd {
                TriggerCommands::Exists => println!("{}", lifecycle.exists().await?),
                TriggerCommands::Activate { url } => {
                    let url = callback_url(&config, url, &workflow, &node)?;
                    let ok = lifecycle.activate(&url).await?;
                    println!("{}", if ok { "activated" } else { "activation failed" });
                }
                TriggerCommands::Deactivate => {
                    let ok = lifecycle.deactivate().await?;
                    println!("{}", if ok { "deactivated" } else { "deactivation failed" });
                }
                TriggerCommands::State => {
                    println!("{}", serde_json::to_string_pretty(&lifecycle.describe().await?)?);
                }
            }
        }
        Commands::Run { file, input } => {
            let node_file: NodeFile = load_file(&file)?;
            let items = match input {
                Some(path) => match load_file::<Value>(&path)? {
                    Value::Array(items) => items,
                    item => vec![item],
                },
                None => vec![Value::Null],
            };
            let factory = NodeFactory::new(transport(&config));
            let node = factory.create(&node_file.node_type, node_file.config, &config.secrets()?)?;
            for record in run_node(node, items).await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Commands::Serve { file, workflow, node, addr, activate } => {
            let trigger = Arc::new(trigger_from_file(&file, &config)?);
            let lifecycle = if activate {
                let store: Arc<dyn KvStore> = Arc::new(FileStore::default_location()?);
                let lifecycle = WebhookLifecycle::new(trigger.clone(), store, &workflow, &node);
                let url = callback_url(&config, None, &workflow, &node)?;
                if !lifecycle.activate(&url).await? {
                    return Err(anyhow!("Could not register the Pipefy webhook"));
                }
                Some(lifecycle)
            } else {
                None
            };

            let routes = webhook::new_routes();
            let trigger_rx = webhook::register(&routes, &workflow, &node).await;
            let (events_tx, events_rx) = mpsc::channel(100);

            let trigger_task = tokio::spawn(async move { trigger.run(vec![trigger_rx], vec![events_tx]).await });
            let sink = ConsoleOutputNode::new(Some(node.clone()));
            let sink_task = tokio::spawn(async move { sink.run(vec![events_rx], vec![]).await });

            let app = webhook::router(routes.clone()).layer(TraceLayer::new_for_http());
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!("Listening for Pipefy webhooks on http://{}/webhook/{}/{}/webhook", addr, workflow, node);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;

            // Dropping the route's sender ends the trigger and then the sink.
            webhook::unregister(&routes, &workflow, &node).await;
            if let Some(lifecycle) = lifecycle {
                if lifecycle.deactivate().await? {
                    tracing::info!("Removed the Pipefy webhook registration");
                } else {
                    tracing::warn!("Pipefy webhook is still registered; run `trigger deactivate` to retry");
                }
            }

            trigger_task.await??;
            sink_task.await??;
        }
    }
    Ok(())
}
