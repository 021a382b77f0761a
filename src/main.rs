use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use topowalk::config::{load_config, save_config, WalkerConfig};
use topowalk::errors::{Result, TraversalError};
use topowalk::graph::{load_graph, GraphQueryManager};
use topowalk::traversal::{Recorder, TraversalOutcome, Walker};
use topowalk::types::*;

/// Depth-first and breadth-first walks over graph files.
#[derive(Parser)]
#[command(name = "topowalk", about = "Directed-graph traversal engine")]
struct Cli {
    /// Directory holding the `.topowalk` settings (default: current directory)
    #[arg(long, global = true)]
    config_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Walk a graph file and print the visit order
    Walk {
        /// Graph file (.json or .toml)
        graph: PathBuf,
        /// Frontier discipline (dfs or bfs)
        #[arg(short, long)]
        strategy: Option<String>,
        /// Edge direction to follow (outgoing, incoming or both)
        #[arg(short, long)]
        direction: Option<String>,
        /// Start from these nodes instead of every node
        #[arg(short, long = "from")]
        from: Vec<String>,
        /// Do not expand nodes at this depth
        #[arg(long)]
        max_depth: Option<u32>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Check that every edge references nodes of the graph
    Check {
        /// Graph file (.json or .toml)
        graph: PathBuf,
    },
    /// Show graph statistics
    Stats {
        /// Graph file (.json or .toml)
        graph: PathBuf,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let root = resolve_path(cli.config_root.clone());
    let config = match load_config(&root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    init_tracing(&config);

    match run(cli, root, config) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Installs a stderr subscriber; `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &WalkerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs a command. Returns `Ok(false)` when a walk did not complete.
fn run(cli: Cli, root: PathBuf, config: WalkerConfig) -> Result<bool> {
    match cli.command {
        Commands::Init { path } => {
            let project_path = path.map(PathBuf::from).unwrap_or(root);
            save_config(&project_path, &WalkerConfig::default())?;
            println!("Initialized topowalk config at {}", project_path.display());
        }
        Commands::Walk {
            graph,
            strategy,
            direction,
            from,
            max_depth,
            json,
        } => {
            let g = load_graph(&graph)?;
            let mut options = config.traversal_options();
            if let Some(s) = strategy {
                options.strategy = Strategy::from_str(&s).ok_or_else(|| TraversalError::Config {
                    message: format!("unknown strategy '{}'", s),
                })?;
            }
            if let Some(d) = direction {
                options.direction =
                    Direction::from_str(&d).ok_or_else(|| TraversalError::Config {
                        message: format!("unknown direction '{}'", d),
                    })?;
            }
            if !from.is_empty() {
                options.seeds = Seeds::Sources(from.into_iter().map(NodeKey::from).collect());
            }
            if max_depth.is_some() {
                options.max_depth = max_depth;
            }

            // A CLI walk has nobody to resume it, so suspensions never block.
            let walker = Walker::new(options).with_suspend_policy(SuspendPolicy::Continue);
            let mut recorder = Recorder::new();
            let outcome = walker.traverse(&g, &mut recorder);
            let visited: Vec<&str> = recorder.visited().iter().map(NodeKey::as_str).collect();

            if json {
                let error = match &outcome {
                    TraversalOutcome::Failed(e) => Some(e.to_string()),
                    _ => None,
                };
                let body = serde_json::json!({
                    "outcome": outcome.as_str(),
                    "visited": visited,
                    "stats": outcome.stats(),
                    "error": error,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                for key in &visited {
                    println!("{}", key);
                }
                match &outcome {
                    TraversalOutcome::Failed(e) => println!("failed: {}", e),
                    other => println!("{} ({} visited)", other.as_str(), visited.len()),
                }
            }
            return Ok(outcome.is_completed());
        }
        Commands::Check { graph } => {
            let g = load_graph(&graph)?;
            g.validate()?;
            println!(
                "ok: {} nodes, {} edges",
                g.node_count(),
                g.edge_count()
            );
        }
        Commands::Stats { graph, json } => {
            let g = load_graph(&graph)?;
            let stats = GraphQueryManager::new(&g).stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Graph Status");
                println!("  Nodes:    {}", stats.node_count);
                println!("  Edges:    {}", stats.edge_count);
                println!("  Directed: {}", stats.directed_edge_count);
                println!("  Isolated: {}", stats.isolated_node_count);
                println!("  Max out-degree: {}", stats.max_out_degree);
                println!("  Max in-degree:  {}", stats.max_in_degree);
                if !stats.out_degree_histogram.is_empty() {
                    println!("\n  Nodes by out-degree:");
                    for (degree, count) in &stats.out_degree_histogram {
                        println!("    {}: {}", degree, count);
                    }
                }
            }
        }
    }
    Ok(true)
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
