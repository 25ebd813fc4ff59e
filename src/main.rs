use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use jobmatch::application::ports::text_extractor::Document;
use jobmatch::application::ports::{SkillExtractor, TextExtractor};
use jobmatch::application::use_cases::RecommendJobsRequest;
use jobmatch::config::Config;
use jobmatch::domain::entities::JobPosting;
use jobmatch::infrastructure::AppContainer;
use jobmatch::presentation::RecommendationsView;

#[derive(Parser, Debug)]
#[command(name = "jobmatch", version, about = "Résumé to job-posting recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank stored job postings against a résumé PDF
    Recommend {
        resume: PathBuf,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        threshold: Option<f32>,
        /// Print JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// Embed a JSON array of job postings into the jobs collection
    Ingest { postings: PathBuf },
    /// Print the skills found in a text, text file or PDF
    Skills { input: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let container = AppContainer::new(&config)
        .await
        .context("Failed to initialise services")?;

    match cli.command {
        Command::Recommend {
            resume,
            top_k,
            threshold,
            json,
        } => recommend(&container, &resume, top_k, threshold, json).await,
        Command::Ingest { postings } => ingest(&container, &postings).await,
        Command::Skills { input } => skills(&container, &input).await,
    }
}

async fn recommend(
    container: &AppContainer,
    resume: &Path,
    top_k: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(resume)
        .await
        .with_context(|| format!("Failed to read {}", resume.display()))?;

    let mut request =
        RecommendJobsRequest::new(Document::new(bytes).with_name(resume.display().to_string()));
    request.top_k = top_k;
    request.threshold = threshold;

    let recommendations = container
        .recommend_jobs_use_case
        .execute(request)
        .await
        .context("Recommendation failed")?;
    let view = RecommendationsView::from(&recommendations);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.duplicate {
        println!("This résumé was analysed before; reusing its stored embedding.\n");
    }
    if view.resume_skills.is_empty() {
        println!("**Resume Skills**: none detected\n");
    } else {
        println!("**Resume Skills**: `{}`\n", view.resume_skills.join(", "));
    }
    if view.matches.is_empty() {
        println!("No job postings found.");
    }
    for (rank, job) in view.matches.iter().enumerate() {
        println!("### {}.\n{}", rank + 1, job.to_markdown());
    }
    info!("Recommendation finished in {} ms", view.elapsed_ms);
    Ok(())
}

async fn ingest(container: &AppContainer, path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let postings: Vec<JobPosting> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of job postings", path.display()))?;

    let summary = container.ingest_jobs_use_case.execute(postings).await?;
    println!(
        "received {}, upserted {}, already present {}, repeated {}, skipped {}",
        summary.received,
        summary.upserted,
        summary.already_present,
        summary.repeated,
        summary.skipped
    );
    Ok(())
}

async fn skills(container: &AppContainer, input: &str) -> Result<()> {
    let path = Path::new(input);
    let text = if path.is_file() {
        let bytes = tokio::fs::read(path).await?;
        if bytes.starts_with(b"%PDF") {
            container
                .text_extractor
                .extract(&Document::new(bytes))
                .await?
                .text
        } else {
            String::from_utf8(bytes).context("Input file is neither a PDF nor UTF-8 text")?
        }
    } else {
        input.to_string()
    };

    if text.trim().is_empty() {
        bail!("No text to extract skills from");
    }

    let found = container.resume_skills.extract(&text).await?;
    println!("strategy: {}", container.resume_skills.strategy());
    for skill in found.iter() {
        println!("{}", skill);
    }
    Ok(())
}
