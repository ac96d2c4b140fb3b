use crate::{AskArgs, IndexArgs, RetrieveArgs, SplitJsonArgs};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use quickrag::{GroqGenerator, Pipeline, RagConfig, StoreBackend};
use quickrag_ingest::{faq, load_csv_documents, Chunker};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct IndexReport<'a> {
    backend: &'a str,
    rows: usize,
    documents: usize,
}

#[derive(Serialize)]
struct RetrieveReport<'a> {
    query: &'a str,
    results: Vec<quickrag_vector_store::SearchHit>,
}

/// Rows of `csv` as chunked documents
fn load_documents(csv: &Path, max: Option<usize>, config: &RagConfig) -> Result<(usize, Vec<String>)> {
    let rows = load_csv_documents(csv, max)
        .with_context(|| format!("Failed to load documents from {}", csv.display()))?;
    let row_count = rows.len();
    let chunker = Chunker::new(config.chunking.clone()).context("Invalid chunking settings")?;
    Ok((row_count, chunker.chunk_all(rows)))
}

fn progress_bar(total: usize, hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%)")?
            .progress_chars("━━╸"),
    );
    Ok(pb)
}

async fn index_documents(
    pipeline: &mut Pipeline,
    documents: Vec<String>,
    batch_size: usize,
    hide_progress: bool,
) -> Result<()> {
    let pb = progress_bar(documents.len(), hide_progress)?;
    pipeline
        .index_with_progress(documents, batch_size, |done, _| pb.set_position(done as u64))
        .await
        .context("Indexing failed")?;
    pb.finish_and_clear();
    Ok(())
}

/// CSV the command should index before querying, if any.
///
/// The memory store starts empty in every process and needs the CSV. A Qdrant
/// collection persists and is only filled by `quickrag index`.
fn csv_to_index(store: StoreBackend, csv: Option<&Path>) -> Result<Option<&Path>> {
    match (store, csv) {
        (StoreBackend::Memory, None) => {
            bail!("The memory store starts empty; pass --csv to index documents first")
        }
        (StoreBackend::Qdrant, Some(csv)) => bail!(
            "--csv is only used with the memory store; load {} into Qdrant with `quickrag index --store qdrant --csv ...`",
            csv.display()
        ),
        (StoreBackend::Memory, Some(csv)) => Ok(Some(csv)),
        (StoreBackend::Qdrant, None) => Ok(None),
    }
}

/// Pipeline over `config`, with the CSV indexed first for the memory store
async fn prepared_pipeline(
    config: &RagConfig,
    csv: Option<&Path>,
    max: Option<usize>,
    hide_progress: bool,
) -> Result<Pipeline> {
    let csv = csv_to_index(config.store, csv)?;
    let mut pipeline = Pipeline::from_config(config)
        .await
        .context("Failed to initialise pipeline")?;
    if let Some(csv) = csv {
        let (_, documents) = load_documents(csv, max, config)?;
        index_documents(
            &mut pipeline,
            documents,
            config.retrieval.batch_size,
            hide_progress,
        )
        .await?;
    }
    Ok(pipeline)
}

pub async fn run_index(args: IndexArgs, mut config: RagConfig, quiet: bool) -> Result<()> {
    if let Some(batch_size) = args.batch_size {
        config.retrieval.batch_size = batch_size;
    }
    config.qdrant.recreate |= args.recreate;

    let (rows, documents) = load_documents(&args.csv, args.max, &config)?;
    let count = documents.len();
    let mut pipeline = Pipeline::from_config(&config)
        .await
        .context("Failed to initialise pipeline")?;
    index_documents(
        &mut pipeline,
        documents,
        config.retrieval.batch_size,
        quiet || args.json,
    )
    .await?;

    let report = IndexReport {
        backend: pipeline.backend(),
        rows,
        documents: count,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!(
            "Indexed {} documents ({} rows) into the {} store",
            report.documents, report.rows, report.backend
        );
    }
    Ok(())
}

pub async fn run_retrieve(args: RetrieveArgs, config: RagConfig) -> Result<()> {
    let top_k = args.top_k.unwrap_or(config.retrieval.top_k);
    let pipeline = prepared_pipeline(&config, args.csv.as_deref(), args.max, args.json).await?;
    let results = pipeline
        .retrieve_scored(&args.query, top_k)
        .await
        .context("Retrieval failed")?;

    if args.json {
        let report = RetrieveReport {
            query: &args.query,
            results,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (i, hit) in results.iter().enumerate() {
            println!("{}. (score: {:.3}) {}", i + 1, hit.score, hit.document);
            println!();
        }
    }
    Ok(())
}

pub async fn run_ask(args: AskArgs, mut config: RagConfig) -> Result<()> {
    if let Some(model) = args.model {
        config.groq.model = model;
    }
    let top_k = args.top_k.unwrap_or(config.retrieval.top_k);

    // Fail on a missing key before spending time on indexing
    let generator = GroqGenerator::new(&config.groq)?;
    let pipeline = prepared_pipeline(&config, args.csv.as_deref(), args.max, false)
        .await?
        .with_generator(Box::new(generator));

    let answer = pipeline
        .answer(&args.query, top_k)
        .await
        .context("Answer generation failed")?;
    println!("{answer}");
    Ok(())
}

pub fn run_split_json(args: &SplitJsonArgs) -> Result<()> {
    let count = faq::convert_faq_file(&args.input, &args.output, args.csv.as_deref())
        .with_context(|| format!("Failed to split {}", args.input.display()))?;
    eprintln!(
        "Wrote {count} records to {}{}",
        args.output.display(),
        args.csv
            .as_ref()
            .map(|csv| format!(" and {}", csv.display()))
            .unwrap_or_default()
    );
    Ok(())
}
