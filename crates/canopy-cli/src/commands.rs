//! CLI command implementations.

use anyhow::{bail, Context as _};
use canopy_core::{DependencyEdge, DependencyNode, FileAnalysis, NullAnalysisProvider};
use canopy_engine::{ContextEngine, EngineConfig, EngineHandle, RelevanceWeights, SledStore};
use canopy_temporal::GitChangeLog;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// One file's worth of analyzer output, as found in an ingest file.
#[derive(Debug, Deserialize)]
struct AnalysisEntry {
    path: String,
    #[serde(default)]
    nodes: Vec<DependencyNode>,
    #[serde(default)]
    edges: Vec<DependencyEdge>,
}

/// User-editable settings in `.canopy/config.json`.
#[derive(Debug, Deserialize)]
struct CliConfig {
    #[serde(default)]
    weights: Option<RelevanceWeights>,
}

fn canopy_dir(root: &Path) -> PathBuf {
    root.join(".canopy")
}

fn load_config(dir: &Path, config: &mut EngineConfig) {
    let path = dir.join("config.json");
    let Ok(raw) = fs::read_to_string(&path) else {
        return;
    };
    match serde_json::from_str::<CliConfig>(&raw) {
        Ok(cli) => {
            if let Some(weights) = cli.weights {
                config.weights = weights;
            }
        }
        Err(err) => eprintln!(
            "{} Ignoring malformed {}: {}",
            "⚠".yellow(),
            path.display(),
            err
        ),
    }
}

fn open_engine(root: &Path, mut config: EngineConfig) -> anyhow::Result<ContextEngine> {
    let dir = canopy_dir(root);
    if !dir.exists() {
        bail!("canopy is not initialized here, run `canopy init` first");
    }
    load_config(&dir, &mut config);

    let store = SledStore::open(dir.join("store"))
        .with_context(|| format!("opening store in {}", dir.display()))?;
    let mut engine = ContextEngine::new(config, Box::new(NullAnalysisProvider))
        .with_change_log(Arc::new(GitChangeLog::new(root)))
        .with_store(Arc::new(store));
    engine.load_persisted();
    Ok(engine)
}

/// Spawns the engine task and replays version-control history into it,
/// so queries see both the persisted graph and fresh patterns.
async fn spawn_with_history(root: &Path) -> anyhow::Result<EngineHandle> {
    let handle = open_engine(root, EngineConfig::default())?.spawn();
    handle.import_history().await?;
    Ok(handle)
}

/// Initialize Canopy in a directory.
pub fn init(root: &Path) -> anyhow::Result<()> {
    let dir = canopy_dir(root);

    if dir.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    fs::create_dir_all(&dir)?;

    let config_path = dir.join("config.json");
    let default_config = serde_json::json!({
        "version": "1.0",
        "weights": {
            "proximity": 0.3,
            "access": 0.25,
            "temporal": 0.2,
            "dependency": 0.25
        }
    });
    fs::write(&config_path, serde_json::to_string_pretty(&default_config)?)?;

    println!("{} Initialized canopy in {}", "✓".green(), root.display());
    println!(
        "  Run {} to load analyzer output",
        "canopy ingest <analysis.json>".cyan()
    );
    println!(
        "  Run {} to mine version-control history",
        "canopy history".cyan()
    );

    Ok(())
}

/// Ingest analyzer output from a JSON file of per-file nodes/edges.
pub async fn ingest(root: &Path, analysis: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(analysis)
        .with_context(|| format!("reading {}", analysis.display()))?;
    let entries: Vec<AnalysisEntry> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", analysis.display()))?;

    let mut engine = open_engine(root, EngineConfig::default())?;
    let mut files = 0usize;
    let mut node_total = 0usize;
    let mut edge_total = 0usize;
    for AnalysisEntry { path, nodes, edges } in entries {
        files += 1;
        node_total += nodes.len();
        edge_total += edges.len();
        engine.ingest_file_analysis(&path, FileAnalysis { nodes, edges });
    }
    engine.persist_all();

    println!(
        "{} Ingested {} files ({} nodes, {} edges)",
        "✓".green(),
        files.to_string().cyan(),
        node_total.to_string().cyan(),
        edge_total.to_string().cyan()
    );

    Ok(())
}

/// Import version-control history into the pattern miners.
pub async fn history(root: &Path, days: i64) -> anyhow::Result<()> {
    let config = EngineConfig {
        history_days: days,
        ..EngineConfig::default()
    };
    let handle = open_engine(root, config)?.spawn();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Reading {} days of history...", days));

    let recorded = handle.import_history().await?;
    spinner.finish_and_clear();

    let stats = handle.stats().await?;
    handle.shutdown().await?;

    println!(
        "{} Replayed {} change events ({} patterns mined)",
        "✓".green(),
        recorded.to_string().cyan(),
        stats.patterns.to_string().cyan()
    );

    Ok(())
}

fn location(node: &DependencyNode) -> String {
    match (&node.path, node.start_line) {
        (Some(path), Some(line)) => format!("({}:{})", path, line),
        (Some(path), None) => format!("({})", path),
        _ => String::new(),
    }
}

/// Print the ranked context for a file.
pub async fn context(root: &Path, file: &str) -> anyhow::Result<()> {
    let handle = spawn_with_history(root).await?;
    let context = handle.weighted_context(file).await?;
    handle.shutdown().await?;

    println!("{}", format!("Context for {}", file).cyan().bold());
    println!();
    for scored in &context.relevant_nodes {
        println!(
            "  {}  {} {} {}",
            format!("{:.2}", scored.relevance).bold(),
            scored.node.kind.to_string().yellow(),
            scored.node.name.cyan(),
            location(&scored.node).dimmed()
        );
    }

    if !context.modification_patterns.is_empty() {
        println!();
        println!("{}", "Change patterns".cyan().bold());
        for pattern in &context.modification_patterns {
            println!(
                "  {}  {} {}",
                format!("{:.2}", pattern.confidence).bold(),
                pattern.name,
                format!("({}x)", pattern.frequency).dimmed()
            );
        }
    }

    if !context.recent_modifications.is_empty() {
        println!();
        println!("{}", "Recent changes".cyan().bold());
        for event in &context.recent_modifications {
            println!(
                "  {}  {} {}",
                event
                    .timestamp
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .dimmed(),
                event.kind,
                event.commit_id.as_deref().unwrap_or("").dimmed()
            );
        }
    }

    Ok(())
}

/// Suggest files related to a file.
pub async fn suggest(root: &Path, file: &str, limit: usize) -> anyhow::Result<()> {
    let handle = spawn_with_history(root).await?;
    let suggestions = handle.related_file_suggestions(file).await?;
    handle.shutdown().await?;

    if suggestions.is_empty() {
        println!("No related files known for {}", file);
        return Ok(());
    }

    println!("{}", format!("Files related to {}", file).cyan().bold());
    println!();
    for suggestion in suggestions.iter().take(limit) {
        println!(
            "  {}  {}",
            format!("{:.2}", suggestion.relevance).bold(),
            suggestion.file.cyan()
        );
    }

    Ok(())
}

/// Show modification patterns involving a file.
pub async fn patterns(root: &Path, file: &str) -> anyhow::Result<()> {
    let handle = spawn_with_history(root).await?;
    let patterns = handle.modification_patterns(file).await?;
    handle.shutdown().await?;

    if patterns.is_empty() {
        println!("No change patterns involve {}", file);
        return Ok(());
    }

    println!("{}", format!("Change patterns for {}", file).cyan().bold());
    println!();
    for pattern in &patterns {
        println!(
            "  {}  {} {}",
            format!("{:.2}", pattern.confidence).bold(),
            pattern.kind.to_string().yellow(),
            pattern.related_files.join(" + ").cyan()
        );
        println!("    {}", pattern.description.dimmed());
    }

    Ok(())
}

/// Show engine status and statistics.
pub async fn status(root: &Path) -> anyhow::Result<()> {
    if !canopy_dir(root).exists() {
        println!("{} Canopy not initialized in this directory", "✗".red());
        println!("  Run {} to initialize", "canopy init".cyan());
        return Ok(());
    }

    let engine = open_engine(root, EngineConfig::default())?;
    let stats = engine.stats();

    println!("{}", "Canopy Status".cyan().bold());
    println!();
    println!("  {} {}", "Files:".dimmed(), stats.files);
    println!("  {} {}", "Nodes:".dimmed(), stats.nodes);
    println!("  {} {}", "Edges:".dimmed(), stats.edges);
    println!("  {} {}", "Patterns:".dimmed(), stats.patterns);
    println!("  {} {}", "Tracked files:".dimmed(), stats.tracked_files);

    Ok(())
}
