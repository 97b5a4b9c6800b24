// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use menu_scout::app::{create_router, AppState, VERSION};
use menu_scout::models::config::AnalysisConfig;
use menu_scout::models::report::SiteReport;
use menu_scout::services::fetcher::{FetcherFactory, LiveFetcherFactory};
use menu_scout::services::logging::init_tracing;
use menu_scout::services::pipeline::AnalysisPipeline;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Classify how a site can be crawled and extract its menu.
#[derive(Parser)]
#[command(name = "menu-scout")]
#[command(version = VERSION)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one site and print its report
    Analyze {
        /// Page to analyze
        url: String,

        /// User agent for robots.txt matching and requests
        #[arg(long)]
        user_agent: Option<String>,

        /// Never launch a browser; dynamic pages are analyzed from static HTML
        #[arg(long)]
        no_browser: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the analysis API over HTTP
    Serve {
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Environment first, flags on top
    let mut config = AnalysisConfig::from_env().context("Invalid MENU_SCOUT_* configuration")?;

    match cli.command {
        Commands::Analyze {
            url,
            user_agent,
            no_browser,
            json,
        } => {
            if let Some(user_agent) = user_agent {
                config.user_agent = user_agent;
            }
            if no_browser {
                config.browser_enabled = false;
            }
            analyze(&url, config, json).await
        }
        Commands::Serve { port } => serve(config, port).await,
    }
}

async fn analyze(url: &str, config: AnalysisConfig, json: bool) -> Result<()> {
    let fetcher = LiveFetcherFactory
        .build(&config)
        .context("Failed to build HTTP client")?;
    let mut pipeline = AnalysisPipeline::new(fetcher, config);
    let report = pipeline.run(url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn serve(config: AnalysisConfig, port: u16) -> Result<()> {
    let state = AppState {
        config,
        fetchers: Arc::new(LiveFetcherFactory),
    };
    let app = create_router(state);

    // Bind to 0.0.0.0 to accept connections from any network interface (required for Docker)
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("menu-scout v{} listening on {}", VERSION, addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn print_report(report: &SiteReport) {
    println!("URL:                {}", report.url);
    println!("Robots allowed:     {}", report.robots_allowed);
    println!("Render mode:        {}", report.render_mode);
    println!("Crawlability score: {}/100", report.crawlability_score);

    for sitemap in &report.sitemaps {
        println!("Sitemap:            {}", sitemap);
    }
    for delay in &report.crawl_delays {
        println!("Crawl-delay:        {}", delay);
    }

    if !report.feeds.is_empty() {
        println!("\nFeeds:");
        for feed in &report.feeds {
            println!("  {:?}  {}", feed.kind, feed.url);
        }
    }

    println!(
        "\nMenu items ({}, strategy: {}):",
        report.menu_items.len(),
        report.extraction_strategy.as_deref().unwrap_or("none")
    );
    for item in &report.menu_items {
        println!(
            "  {:<40} {:>12}  {}",
            item.name,
            item.price.as_deref().unwrap_or("-"),
            item.category.as_deref().unwrap_or("")
        );
    }

    if !report.summary.top_categories.is_empty() {
        println!("\nTop categories:");
        for category in &report.summary.top_categories {
            println!("  {:<40} {}", category.category, category.items);
        }
    }

    println!("\nRecommendations:");
    for rec in &report.recommendations {
        println!("  - {}", rec);
    }

    if !report.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
}
