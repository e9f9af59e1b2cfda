use anyhow::Context;
use clap::Parser;
use lunrsearch::cli::{Cli, Commands};
use lunrsearch::{Config, GeneratorIndex, QueryOutcome, SearchSession, render_hits};
use std::path::Path;

/// Number of "did you mean" names offered when a query has no hits.
const SUGGESTIONS: usize = 3;

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::from_env()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    lunrsearch::tracing::init(cli.verbose);

    match cli.command {
        Commands::Build {
            index,
            out_dir,
            config,
            include_terms,
        } => {
            let mut config = load_config(config.as_deref())?;
            config.include_terms |= include_terms;

            let source = GeneratorIndex::load(&index)?;
            let report = lunrsearch::build(&source, &config, &out_dir);

            println!(
                "{} entries ({} skipped) -> {}",
                report.entries,
                report.warnings.len(),
                report.bundle_path.display()
            );
            if let Some(digest) = &report.digest {
                let note = if report.prebuilt {
                    ""
                } else {
                    " (no pre-built index)"
                };
                println!("digest {}{}", digest, note);
            }
            if let Some(error) = &report.write_error {
                eprintln!("warning: {}; search is unavailable for this build", error);
            }
        }
        Commands::Query {
            bundle,
            text,
            config,
            limit,
            dedup,
            no_highlight,
            html,
        } => {
            let config = load_config(config.as_deref())?;
            let mut options = config.render_options();
            if let Some(limit) = limit {
                options.max_results = limit;
            }
            if let Some(dedup) = dedup {
                options.dedup = dedup;
            }
            options.highlight &= !no_highlight;

            let session = SearchSession::default();
            session
                .load_path(&bundle)
                .await
                .with_context(|| format!("Search unavailable for {}", bundle.display()))?;

            let QueryOutcome::Results(hits) = session.submit(&text).await? else {
                return Ok(());
            };

            if hits.is_empty() {
                println!("No results found for '{}'", text);
                let suggestions = session.with_client(|c| c.suggest(&text, SUGGESTIONS)).await;
                if !suggestions.is_empty() {
                    let names: Vec<_> = suggestions.iter().map(|e| e.name.as_str()).collect();
                    println!("Did you mean: {}?", names.join(", "));
                }
                return Ok(());
            }

            let rendered = session
                .with_client(|c| render_hits(&hits, c.tokenizer(), &options))
                .await;
            for result in &rendered {
                if html {
                    println!("{}", result.to_html());
                } else {
                    println!("{}  {}", result.label_text(), result.href);
                }
            }
        }
    }

    Ok(())
}
