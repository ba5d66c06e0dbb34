//! seqtag CLI - tags a tab separated corpus with a model file and scores gold labeled corpora.

use anyhow::{Context, Result};
use clap::Parser;
use seqtag::{
    write_json_lines, CorpusVariant, GoldLabeled, InferencePipeline, ModelFile, RunSummary,
    Scores, TaggerConfig, TaggerConfigBuilder, TaggerModel, Unlabeled,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "seqtag")]
#[command(version)]
#[command(about = "Tags sentences with a windowed classifier and scores BIO/BILOU phrases")]
struct Cli {
    /// Path to the JSON model file
    model: PathBuf,

    /// Corpus to tag, one token per line (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where the tagged corpus is written (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The corpus has a gold label after each token
    #[arg(long)]
    gold: bool,

    /// Report phrase level precision, recall and f-score (gold corpora only)
    #[arg(long)]
    fscore: bool,

    /// Report the per word accuracy (gold corpora only)
    #[arg(long)]
    precision: bool,

    /// Also write the score rows as JSON lines to this file
    #[arg(long)]
    scores_jsonl: Option<PathBuf>,

    /// Sentences with fewer tokens are skipped
    #[arg(long, default_value_t = seqtag::DEFAULT_MIN_SENTENCE_LEN)]
    min_sentence_len: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn tag<V, R, W>(
    model: &TaggerModel,
    variant: V,
    config: &TaggerConfig,
    input: R,
    output: W,
    scores: &mut Scores,
) -> Result<RunSummary>
where
    V: CorpusVariant + Clone,
    R: BufRead,
    W: Write,
{
    let mut pipeline = InferencePipeline::new(model, variant, output)
        .with_min_sentence_len(config.min_sentence_len());
    pipeline.run(input, scores).context("Tagging failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    if !cli.gold && (cli.fscore || cli.precision) {
        warn!("--fscore and --precision are ignored without --gold");
    }
    let config = TaggerConfigBuilder::new()
        .model(cli.model)
        .input(cli.input)
        .output(cli.output)
        .gold(cli.gold)
        .fscore(cli.fscore)
        .precision(cli.precision)
        .scores_jsonl(cli.scores_jsonl)
        .min_sentence_len(cli.min_sentence_len)
        .build()?;

    let model = ModelFile::load(config.model())
        .with_context(|| format!("Failed to load model from {:?}", config.model()))?
        .compile()
        .context("Invalid model")?;

    let input = config.open_input().context("Failed to open the corpus")?;
    let output = config.open_output().context("Failed to open the output")?;
    let scoring = config.scoring();
    let mut scores = Scores::new(&model.scheme, scoring.fscore, scoring.accuracy);

    let summary = if config.gold() {
        let variant = GoldLabeled::new(&model.scheme);
        tag(&model, variant, &config, input, output, &mut scores)?
    } else {
        tag(&model, Unlabeled, &config, input, output, &mut scores)?
    };

    if let Some(path) = config.scores_jsonl() {
        write_json_lines(path, scores.report().rows())
            .with_context(|| format!("Failed to write scores to {:?}", path))?;
    }
    info!(%summary, "done");
    Ok(())
}
