mod db;
mod fetch;
mod ingest;
mod paragraphs;
mod seed;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use fetch::HttpFetcher;
use ingest::Ingestor;

#[derive(Parser)]
#[command(name = "topic_seeder", about = "Seed chapter topic contents from Wikipedia")]
struct Cli {
    /// SQLite catalog database
    #[arg(long, global = true, default_value = db::DB_PATH)]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog tables
    Init,
    /// Load exams, subjects and chapters from a JSON export
    Seed {
        /// Catalog file ({"exams": [...], "subjects": [...], "chapters": [...]})
        file: PathBuf,
    },
    /// Fetch every chapter topic and insert missing content records
    Run {
        /// Max topics to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Per-request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout_secs: u64,
    },
    /// Show catalog and content counts
    Stats,
    /// Stored content records
    Contents {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let conn = db::connect(&cli.db)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Init => {
            println!("Schema ready at {}", cli.db.display());
            Ok(())
        }
        Commands::Seed { file } => {
            let catalog = seed::load_file(&file)?;
            let counts = seed::seed(&conn, &catalog)?;
            println!(
                "Inserted {} exams, {} subjects, {} chapters ({} chapters in file)",
                counts.exams,
                counts.subjects,
                counts.chapters,
                catalog.chapters.len()
            );
            Ok(())
        }
        Commands::Run {
            limit,
            timeout_secs,
        } => {
            let fetcher = HttpFetcher::new(Duration::from_secs(timeout_secs))?;
            let report = Ingestor::new(&conn, fetcher).with_limit(limit).run().await?;
            println!(
                "Done: {} topics across {} chapters for {} ({} inserted, {} skipped, {} fetch failures).",
                report.topics,
                report.chapters,
                report.exam,
                report.inserted,
                report.skipped,
                report.fetch_failed
            );
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Exams:     {}", s.exams);
            println!("Subjects:  {}", s.subjects);
            println!("Chapters:  {}", s.chapters);
            println!("Topics:    {}", s.topics);
            println!("Contents:  {}", s.contents);
            println!("Empty:     {}", s.empty_descriptions);
            Ok(())
        }
        Commands::Contents { limit } => {
            let rows = db::fetch_contents(&conn, Some(limit))?;
            if rows.is_empty() {
                println!("No contents yet. Run 'run' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<32} | {:<24} | {:>6} | {:<20}",
                "#", "Title", "Chapter", "Points", "Created"
            );
            println!("{}", "-".repeat(98));

            for (i, r) in rows.iter().enumerate() {
                let chapter = r.chapter_ids.first().map(String::as_str).unwrap_or("-");
                println!(
                    "{:>3} | {:<32} | {:<24} | {:>6} | {:<20}",
                    i + 1,
                    truncate(&r.title, 32),
                    truncate(chapter, 24),
                    r.description.len(),
                    r.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }

            println!("\n{} contents", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Entropy", 10), "Entropy");
        assert_eq!(truncate("Thermodynamics", 6), "Thermo...");
        assert_eq!(truncate("Éléments", 3), "Élé...");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from(["topic_seeder", "--db", "x.sqlite", "run", "-n", "3"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("x.sqlite"));
        assert!(matches!(
            cli.command,
            Commands::Run { limit: Some(3), timeout_secs: 10 }
        ));
    }
}
