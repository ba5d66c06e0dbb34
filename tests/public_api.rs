use seqtag::{
    ClassifierError, ConfusionAccumulator, GoldLabeled, InferencePipeline, ModelFile, Phrases,
    Ratio, RunSummary, ScoreRow, Scores, TagScheme, Unlabeled, WindowBatch, GLOBAL,
};
use std::io::Cursor;

pub trait CloseEnough {
    fn are_close(&self, other: &Self, eps: f64) -> bool;
}

impl CloseEnough for Ratio {
    fn are_close(&self, other: &Self, eps: f64) -> bool {
        match (self, other) {
            (Ratio::Value(a), Ratio::Value(b)) => f64::abs(a - b) < eps,
            (Ratio::NotApplicable, Ratio::NotApplicable) => true,
            _ => false,
        }
    }
}

// ScoreRow ratios are floats, compare them with a tolerance.
impl CloseEnough for ScoreRow {
    fn are_close(&self, other: &Self, eps: f64) -> bool {
        self.category == other.category
            && self.precision.are_close(&other.precision, eps)
            && self.recall.are_close(&other.recall, eps)
            && self.f1.are_close(&other.f1, eps)
    }
}

const MODEL: &str = r#"{
    "window_radius": 2,
    "labels": ["B-PER", "I-PER", "E-PER", "1-PER", "O", "B-LOC", "I-LOC", "E-LOC", "1-LOC"],
    "vocabulary": ["john", "smith", "lives", "in", "new", "york", "paris"],
    "features": ["capitalized", "has_digit"],
    "lexicon": {
        "john": "B-PER",
        "smith": "E-PER",
        "new": "B-LOC",
        "york": "E-LOC",
        "paris": "B-LOC"
    }
}"#;

const GOLD_CORPUS: &str = "John\tB-PER
Smith\tE-PER
lives\tO
in\tO
New\tB-LOC
York\tE-LOC

Hi\tO
there\tO

Mary\t1-PER
visited\tO
Paris\t1-LOC
.\tO

broken line\twith\tthree

Smith\t1-PER
left\tO
York\tO
";

fn row(category: &str, precision: Ratio, recall: Ratio, f1: Ratio) -> ScoreRow {
    ScoreRow {
        category: category.to_string(),
        precision,
        recall,
        f1,
    }
}

#[test]
fn gold_corpus_end_to_end() {
    let model = ModelFile::from_reader(MODEL.as_bytes())
        .unwrap()
        .compile()
        .unwrap();
    let mut pipeline =
        InferencePipeline::new(&model, GoldLabeled::new(&model.scheme), Vec::new());
    let mut scores = Scores::new(&model.scheme, true, true);
    let summary = pipeline
        .run(Cursor::new(GOLD_CORPUS), &mut scores)
        .unwrap();
    assert_eq!(
        summary,
        RunSummary {
            tagged: 3,
            skipped: 1,
            malformed: 1
        }
    );

    // Sentence 1: PER(0,1) and LOC(4,5) found.
    // Sentence 3: PER(0,0) missed, LOC(2,2) missed, `Paris` predicted as an unterminated B-LOC.
    // Sentence 5: PER(0,0) missed, `Smith` predicted as an unterminated E-PER, `York` as E-LOC.
    let report = scores.report();
    let expected = [
        row(
            "PER",
            Ratio::Value(1.0),
            Ratio::Value(1.0 / 3.0),
            Ratio::Value(0.5),
        ),
        row("LOC", Ratio::Value(1.0), Ratio::Value(0.5), Ratio::Value(2.0 / 3.0)),
        row(GLOBAL, Ratio::Value(1.0), Ratio::Value(0.4), Ratio::Value(4.0 / 7.0)),
    ];
    assert_eq!(report.rows().len(), expected.len());
    for (actual, expected) in report.rows().iter().zip(expected.iter()) {
        assert!(
            actual.are_close(expected, 1e-9),
            "{} != {}",
            actual,
            expected
        );
    }
    // 13 tokens scored, wrong: Mary, Paris, Smith (sentence 5), York (sentence 5)
    assert!(report
        .accuracy()
        .unwrap()
        .are_close(&Ratio::Value(9.0 / 13.0), 1e-9));

    let out = String::from_utf8(pipeline.into_writer()).unwrap();
    let mut blocks = out.split("\n\n");
    assert_eq!(
        blocks.next().unwrap(),
        "John\tB-PER\tB-PER\nSmith\tE-PER\tE-PER\nlives\tO\tO\nin\tO\tO\nNew\tB-LOC\tB-LOC\nYork\tE-LOC\tE-LOC"
    );
    assert_eq!(
        blocks.next().unwrap(),
        "Mary\t1-PER\tO\nvisited\tO\tO\nParis\t1-LOC\tB-LOC\n.\tO\tO"
    );
    assert_eq!(
        blocks.next().unwrap(),
        "Smith\t1-PER\tE-PER\nleft\tO\tO\nYork\tO\tE-LOC"
    );
    // the sentence of two tokens never reaches the output
    assert!(!out.contains("Hi\t"));
    assert!(out.ends_with("per word accuracy: 0.6923076923076923\n"));
}

#[test]
fn unlabeled_corpus_with_closure_classifier() {
    let model = ModelFile::from_reader(MODEL.as_bytes())
        .unwrap()
        .compile()
        .unwrap();
    let scheme = model.scheme.clone();
    let single_loc = scheme.index_of("1-LOC").unwrap();
    let outside = scheme.outside_index().unwrap();
    // Capitalized words are locations
    let classifier = move |windows: &WindowBatch| -> Result<Vec<usize>, ClassifierError> {
        Ok(windows
            .iter()
            .map(|w| {
                if w.features[0] == 1 {
                    single_loc
                } else {
                    outside
                }
            })
            .collect())
    };
    let model = seqtag::TaggerModel::new(
        model.scheme,
        model.vocabulary,
        model.featurizer,
        classifier,
        model.window_radius,
    );
    let mut pipeline = InferencePipeline::new(&model, Unlabeled, Vec::new());
    let mut scores = Scores::disabled();
    let summary = pipeline
        .run(Cursor::new("from\tX\nRome\nto\nOslo\n"), &mut scores)
        .unwrap();
    assert_eq!(summary.tagged, 1);
    assert_eq!(
        String::from_utf8(pipeline.into_writer()).unwrap(),
        "from\tO\nRome\t1-LOC\nto\tO\nOslo\t1-LOC\n\n"
    );
}

#[test]
fn scores_are_owned_by_the_caller() {
    let model = ModelFile::from_reader(MODEL.as_bytes())
        .unwrap()
        .compile()
        .unwrap();
    let mut scores = Scores::new(&model.scheme, true, false);
    let corpus = "John\tB-PER\nSmith\tE-PER\nleft\tO\n";
    for _ in 0..2 {
        let mut pipeline =
            InferencePipeline::new(&model, GoldLabeled::new(&model.scheme), Vec::new());
        pipeline.run(Cursor::new(corpus), &mut scores).unwrap();
    }
    let counts = scores
        .confusion
        .as_ref()
        .unwrap()
        .matrix()
        .get_by_name("PER")
        .unwrap();
    assert_eq!(counts.true_positive, 2.0);
    scores.reset();
    assert!(scores.confusion.unwrap().matrix().global().is_empty());
}

#[test]
fn phrases_and_accumulator() {
    let scheme = TagScheme::build(&["B-P", "I-P", "E-P", "1-P", "O"]).unwrap();
    let gold = Phrases::from_tags(&[0, 1, 2, 4, 3], &scheme);
    let predicted = Phrases::from_tags(&[0, 1, 2, 4, 4], &scheme);
    assert_eq!(gold.len(), 2);
    let mut accumulator = ConfusionAccumulator::new(&scheme);
    accumulator.update(&gold, &predicted);
    let rows: Vec<ScoreRow> = accumulator.report().collect();
    assert_eq!(rows[0].to_string(), "P\t1.0\t0.5\t0.6666666666666666");
    assert_eq!(rows[1].category, GLOBAL);
}

#[test]
fn undecodable_sentence_does_not_stop_the_run() {
    let model = ModelFile::from_reader(MODEL.as_bytes())
        .unwrap()
        .compile()
        .unwrap();
    let corpus: &[u8] =
        b"John\tB-PER\nSmith\tE-PER\nleft\tO\n\nbad\xff\tO\nline\tO\nhere\tO\n\nNew\tB-LOC\nYork\tE-LOC\nwins\tO\n";
    let mut pipeline =
        InferencePipeline::new(&model, GoldLabeled::new(&model.scheme), Vec::new());
    let mut scores = Scores::new(&model.scheme, true, false);
    let summary = pipeline.run(Cursor::new(corpus), &mut scores).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            tagged: 2,
            skipped: 0,
            malformed: 1
        }
    );
    let confusion = scores.confusion.as_ref().unwrap().matrix();
    assert_eq!(confusion.get_by_name("PER").unwrap().true_positive, 1.0);
    assert_eq!(confusion.get_by_name("LOC").unwrap().true_positive, 1.0);
    let out = String::from_utf8(pipeline.into_writer()).unwrap();
    assert!(out.contains("York\tE-LOC\tE-LOC\n"));
    assert!(!out.contains("line\t"));
}
