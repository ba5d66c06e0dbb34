use clap::Parser;
use seqtag::{GoldLabeled, InferencePipeline, ModelFile, Scores};
use std::fs::read_to_string;
use std::io::{sink, Cursor};
use std::ops::Range;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
struct Args {
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    /// JSON model file
    #[arg(short, long)]
    model: PathBuf,
    /// Gold labeled corpus
    #[arg(short, long)]
    corpus: PathBuf,
}

fn main() {
    let args = Args::parse();
    let n_samples = args.n_samples;
    let iter = Range {
        start: 0,
        end: n_samples,
    };
    let model = ModelFile::load(&args.model).unwrap().compile().unwrap();
    let corpus = read_to_string(&args.corpus).unwrap();
    let mut total_duration = Duration::ZERO;
    for _ in iter {
        let mut scores = Scores::new(&model.scheme, true, true);
        let now = Instant::now();
        {
            InferencePipeline::new(&model, GoldLabeled::new(&model.scheme), sink())
                .run(Cursor::new(corpus.as_str()), &mut scores)
                .unwrap();
        }
        let elapsed = now.elapsed();
        total_duration += elapsed;
    }
    println!(
        "Total duration: {} with {n_samples} samples",
        total_duration.as_secs_f64()
    )
}
