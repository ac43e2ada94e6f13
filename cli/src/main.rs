use anyhow::Context;
use clap::Parser;
use frr_paths::{FrrPaths, PSpaceMode, RlfaConfig, Topology, TrombonePolicy};
use std::path::PathBuf;

/// Compute SPF, LFA and remote-LFA paths for a topology document.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Topology JSON file to parse.
    #[arg(long)]
    json: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Print every path family for this source node (requires --target).
    #[arg(long, requires = "target")]
    source: Option<String>,

    /// Print every path family for this target node (requires --source).
    #[arg(long, requires = "source")]
    target: Option<String>,

    /// Use plain P-space instead of extended P-space for remote LFAs.
    #[arg(long)]
    plain_p_space: bool,

    /// Allow repair tunnels that revisit their own first segment.
    #[arg(long)]
    allow_trombone: bool,

    /// Write the loaded topology back out as JSON to this file.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = RlfaConfig {
        p_space: if args.plain_p_space {
            PSpaceMode::Plain
        } else {
            PSpaceMode::Extended
        },
        trombone: if args.allow_trombone {
            TrombonePolicy::Allow
        } else {
            TrombonePolicy::Forbid
        },
    };

    let topology = Topology::from_json_file(&args.json)
        .with_context(|| format!("loading {}", args.json.display()))?;
    if let Some(out) = &args.out {
        topology
            .to_json_file(out)
            .with_context(|| format!("writing {}", out.display()))?;
    }

    let frr = FrrPaths::new(topology, config).context("computing paths")?;

    println!(
        "{} nodes, {} edges: {} simple paths, {} SPF, {} LFA, {} remote LFA",
        frr.topology().node_count(),
        frr.topology().edge_count(),
        frr.all_paths().path_count(),
        frr.spf_paths().path_count(),
        frr.lfa_paths().path_count(),
        frr.rlfa_paths().path_count(),
    );

    if let (Some(source), Some(target)) = (&args.source, &args.target) {
        println!("\nAll paths between {source} and {target}:");
        print!("{}", frr.all_paths().paths_between_by_name(source, target)?);
        println!("\nLowest weighted paths between {source} and {target}:");
        print!("{}", frr.spf_paths().paths_between_by_name(source, target)?);
        println!("\nLFA paths between {source} and {target}:");
        print!("{}", frr.lfa_paths().paths_between_by_name(source, target)?);
        println!("\nRemote LFA paths between {source} and {target}:");
        print!("{}", frr.rlfa_paths().paths_between_by_name(source, target)?);
    }

    Ok(())
}
