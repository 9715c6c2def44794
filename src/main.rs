use anyhow::Context;
use clap::Parser;
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use queryscope::analyzer::StatsAggregator;
use queryscope::config::{CommandLineArgs, Config, OutputFormat};
use queryscope::models::ProfileReport;
use queryscope::parser::analyze_document;

fn main() -> anyhow::Result<()> {
    let args = CommandLineArgs::parse();
    let config = Config::load(&args)?;

    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    // Keep the appender guard alive for the lifetime of the process
    let _guard = if let Some(log_file) = &config.logging.file {
        let path = std::path::Path::new(log_file);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => std::path::Path::new("."),
        };
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "queryscope.log".to_string());
        let appender = tracing_appender::rolling::never(dir, file);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        Some(guard)
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        None
    };

    let raw = read_profile(&args.profile)?;
    let document: serde_json::Value =
        serde_json::from_str(&raw).context("profile is not valid JSON")?;

    let report = analyze_document(&document)
        .with_context(|| format!("failed to analyze profile '{}'", args.profile))?;

    tracing::info!(
        fragments = report.analysis.fragments.len(),
        wall_time_ms = report.analysis.query_wall_time_ms,
        "profile analyzed"
    );

    match config.output.format {
        OutputFormat::Json => {
            let json = if config.output.pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);
        },
        OutputFormat::Summary => print_summary(report, config.output.top_operators),
    }

    Ok(())
}

fn read_profile(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read profile from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile file '{}'", path))
    }
}

fn print_summary(report: ProfileReport, top_operators: usize) {
    let mut analysis = report.analysis;

    println!("Query wall time    {}", format_duration_ms(analysis.query_wall_time_ms));
    println!("Total active time  {}", format_duration_ms(analysis.total_active_time_ms));
    println!();

    let stats = &analysis.execution_stats;
    println!("Execution stats");
    println!("  allocated memory   {}", stats.allocated_memory);
    println!("  peak memory        {}", stats.peak_memory);
    println!("  cpu time           {}", stats.cumulative_cpu_time);
    println!("  scan time          {}", stats.cumulative_scan_time);
    println!("  network time       {}", stats.cumulative_network_time);
    println!("  operator time      {}", stats.cumulative_operator_time);
    let spill_marker = if stats.has_spill { "  (!)" } else { "" };
    println!("  spill bytes        {}{}", stats.spill_bytes, spill_marker);
    println!();

    if let Some(planner) = &analysis.planner_timing {
        println!("Planner phases");
        println!("  total          {}", format_duration_ms(planner.total_ms));
        println!("  analyzer       {}", format_duration_ms(planner.analyzer_ms));
        println!("  transformer    {}", format_duration_ms(planner.transformer_ms));
        println!("  optimizer      {}", format_duration_ms(planner.optimizer_ms));
        println!("  exec plan      {}", format_duration_ms(planner.exec_plan_build_ms));
        println!("  deploy         {}", format_duration_ms(planner.deploy_ms));
        println!();
    }

    let ranks = StatsAggregator::pipeline_ranks(&analysis.fragments);
    StatsAggregator::sort_pipelines_by_id(&mut analysis.fragments);

    for fragment in &analysis.fragments {
        println!(
            "Fragment {}  active {}",
            fragment.id,
            format_duration_ms(fragment.total_active_time_ms)
        );
        for pipeline in &fragment.pipelines {
            let rank = ranks.get(&(pipeline.fragment_id, pipeline.id)).copied().unwrap_or(0);
            println!(
                "  Pipeline {:<3} #{:<3} active {:>10}  [active {:>5.1}% | schedule {:>5.1}% | waiting {:>5.1}%]",
                pipeline.id,
                rank,
                format_duration_ms(pipeline.active_time_ms),
                pipeline.active_pct() * 100.0,
                pipeline.schedule_pct() * 100.0,
                pipeline.waiting_pct() * 100.0,
            );
        }
    }

    let top = StatsAggregator::top_operators(&analysis.fragments, top_operators);
    if !top.is_empty() {
        println!();
        println!("Top operators");
        for cost in top {
            println!(
                "  {:>10}  F{}/P{}  {}",
                format_duration_ms(cost.operator_time_ms),
                cost.fragment_id,
                cost.pipeline_id,
                cost.name
            );
        }
    }
}

/// Format milliseconds to a human-readable duration string
fn format_duration_ms(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.2}us", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.2}ms", ms)
    } else if ms < 60000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        let minutes = (ms / 60000.0).floor();
        let seconds = (ms % 60000.0) / 1000.0;
        format!("{:.0}m{:.2}s", minutes, seconds)
    }
}
