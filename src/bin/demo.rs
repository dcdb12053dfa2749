//! distritree Demo Binary
//!
//! Seeds an engine, then runs the same point and range queries through the
//! indexed path and the brute-force scan path, printing traces and latency.

use clap::Parser;
use distritree::storage::Key;
use distritree::{Config, Engine, PointQuery, RangeQuery};
use tracing_subscriber::{fmt, EnvFilter};

/// distritree demo
#[derive(Parser, Debug)]
#[command(name = "distritree-demo")]
#[command(about = "Indexed vs. unindexed lookup over partitioned storage")]
#[command(version)]
struct Args {
    /// B+Tree order (branching factor, minimum 3)
    #[arg(short, long, default_value = "4")]
    order: usize,

    /// Number of storage partitions
    #[arg(short, long, default_value = "3")]
    partitions: usize,

    /// Number of records to seed (keys 1..=count)
    #[arg(short, long, default_value = "50")]
    count: i64,

    /// Key to look up on the point paths
    #[arg(short = 'k', long, default_value = "17")]
    probe: i64,

    /// Range start for the range paths
    #[arg(long, default_value = "5")]
    start: i64,

    /// Range end for the range paths
    #[arg(long, default_value = "9")]
    end: i64,

    /// Optional data directory for durable file-backed partitions
    #[arg(short, long)]
    data_dir: Option<String>,

    /// Print the tree structure as JSON after seeding
    #[arg(short = 't', long)]
    tree: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,distritree=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("distritree v{}", distritree::VERSION);

    let mut builder = Config::builder()
        .tree_order(args.order)
        .partition_count(args.partitions);
    if let Some(dir) = &args.data_dir {
        builder = builder.data_dir(dir);
    }
    let config = builder.build();

    let mut engine = match Engine::new(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("failed to build engine: {}", e);
            std::process::exit(1);
        }
    };

    // Seed keys 1..=count with simple payloads.
    for k in 1..=args.count {
        let value = format!("value for key {}", k).into_bytes();
        if let Err(e) = engine.insert(Key::Int(k), value) {
            tracing::warn!("insert {} skipped: {}", k, e);
        }
    }
    tracing::info!(
        records = engine.len(),
        depth = engine.index().depth(),
        "seeded"
    );

    if args.tree {
        match serde_json::to_string_pretty(&engine.tree_structure()) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("snapshot render failed: {}", e),
        }
    }

    let probe = Key::Int(args.probe);
    match (engine.search(&probe), engine.scan(&probe)) {
        (Ok(indexed), Ok(scanned)) => {
            print_point("B+Tree (optimized)", &indexed);
            print_point("Linear scan (unoptimized)", &scanned);
        }
        (Err(e), _) | (_, Err(e)) => tracing::error!("point query failed: {}", e),
    }

    let (start, end) = (Key::Int(args.start), Key::Int(args.end));
    match (engine.range_search(&start, &end), engine.scan_range(&start, &end)) {
        (Ok(indexed), Ok(scanned)) => {
            print_range("B+Tree (optimized)", &indexed);
            print_range("Linear scan (unoptimized)", &scanned);
        }
        (Err(e), _) | (_, Err(e)) => tracing::error!("range query failed: {}", e),
    }
}

fn print_point(label: &str, outcome: &PointQuery) {
    println!("\n== {} ==", label);
    println!("path: {}", outcome.trace.join(" -> "));
    match &outcome.result {
        Some((ptr, record)) => println!(
            "found key {} in partition_{} (record {})",
            record.key, ptr.partition_id, ptr.record_id
        ),
        None => println!("not found"),
    }
    println!("cost: {:.3} ms", outcome.elapsed_ms);
}

fn print_range(label: &str, outcome: &RangeQuery) {
    println!("\n== {} ==", label);
    println!("path: {}", outcome.trace.join(" -> "));
    let keys: Vec<String> = outcome.results.iter().map(|(k, _)| k.to_string()).collect();
    println!("keys: [{}]", keys.join(", "));
    println!("partitions visited: {:?}", outcome.visited);
    println!("cost: {:.3} ms", outcome.elapsed_ms);
}
