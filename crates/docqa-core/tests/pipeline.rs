//! End-to-end tests of the ingestion and retrieval pipeline through the
//! public API: the scenarios a user walks through, plus the concurrency
//! and ranking properties of the index.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use docqa_core::chunk::chunk_text;
use docqa_core::embedding::normalize;
use docqa_core::{
    AnswerExtractor, AnswerSpan, ChunkerConfig, Document, HashingEmbedder, InMemoryIndex,
    IndexBatch, IndexStore, IngestMode, IngestRequest, FrequencySummarizer, QaError, Session,
    SessionSettings, SourceKind,
};
use proptest::prelude::*;

const SCENARIO_TEXT: &str = "A variable stores a value. A function is reusable code.";

// ─── Helpers ────────────────────────────────────────────────────────

/// Lexical extraction that counts how often it is called.
struct CountingExtractor {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AnswerExtractor for CountingExtractor {
    fn name(&self) -> &str {
        "counting"
    }

    async fn extract(&self, question: &str, context: &str) -> anyhow::Result<AnswerSpan> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(docqa_core::LexicalExtractor::new().best_span(question, context))
    }
}

fn session_with_counter() -> (Session, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let session = Session::new(
        Arc::new(InMemoryIndex::new()),
        Arc::new(HashingEmbedder::new(256)),
        Arc::new(CountingExtractor {
            calls: calls.clone(),
        }),
        Arc::new(FrequencySummarizer::default()),
        SessionSettings::default(),
    );
    (session, calls)
}

fn text_request(title: &str, text: &str, mode: IngestMode) -> IngestRequest {
    IngestRequest::text(title, text, mode)
}

/// A one-chunk-per-vector batch with the given vectors.
fn batch_of(title: &str, vectors: Vec<Vec<f32>>) -> IndexBatch {
    let document = Document::new(title, SourceKind::Text, "", title, None);
    let config = ChunkerConfig {
        max_tokens: 100,
        min_tokens: 1,
        overlap_tokens: 0,
    };
    let chunks = (0..vectors.len())
        .map(|i| {
            let mut c = chunk_text(&document.id, title, &format!("{} chunk {}", title, i), &config)
                .remove(0);
            c.sequence_index = i;
            c
        })
        .collect();
    IndexBatch {
        document,
        chunks,
        vectors,
    }
}

// ─── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_single_chunk_index() {
    let (session, _) = session_with_counter();
    let report = session
        .ingest(text_request("Basics", SCENARIO_TEXT, IngestMode::Replace))
        .await
        .unwrap();

    assert_eq!(report.chunks_indexed, 1);
    assert!(report.ready);
    let status = session.status();
    assert_eq!(status.chunk_count, 1);
    assert!(status.ready);
    assert!(session.is_ready());
}

#[tokio::test]
async fn scenario_b_answer_with_citation() {
    let (session, _) = session_with_counter();
    session
        .ingest(text_request("Basics", SCENARIO_TEXT, IngestMode::Replace))
        .await
        .unwrap();

    let answer = session.ask("What is a variable?", Some(1)).await.unwrap();
    assert!(answer.found);
    assert!(answer.answer.contains("stores a value"));
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].document_title, "Basics");
}

#[tokio::test]
async fn scenario_c_accumulate_keeps_first_document() {
    let (session, _) = session_with_counter();
    session
        .ingest(text_request("Basics", SCENARIO_TEXT, IngestMode::Replace))
        .await
        .unwrap();
    session
        .ingest(text_request(
            "Async",
            "Tokio schedules tasks on a thread pool.",
            IngestMode::Accumulate,
        ))
        .await
        .unwrap();

    let status = session.status();
    assert_eq!(status.chunk_count, 2);
    assert_eq!(status.document_count, 2);

    let first = session.ask("What does a variable store?", Some(1)).await.unwrap();
    assert_eq!(first.citations[0].document_title, "Basics");
    let second = session.ask("What schedules tasks?", Some(1)).await.unwrap();
    assert_eq!(second.citations[0].document_title, "Async");

    let both = session.ask("variable tasks", Some(10)).await.unwrap();
    assert_eq!(both.citations.len(), 2);
}

#[tokio::test]
async fn scenario_d_empty_question_rejected_before_retrieval() {
    let (session, calls) = session_with_counter();
    session
        .ingest(text_request("Basics", SCENARIO_TEXT, IngestMode::Replace))
        .await
        .unwrap();

    let err = session.ask("", None).await.unwrap_err();
    assert!(matches!(err, QaError::Validation(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scenario_e_reset_then_ask_not_ready() {
    let (session, calls) = session_with_counter();
    session
        .ingest(text_request("Basics", SCENARIO_TEXT, IngestMode::Replace))
        .await
        .unwrap();

    session.reset();
    assert!(!session.is_ready());
    let err = session.ask("What is a variable?", None).await.unwrap_err();
    assert_eq!(err, QaError::IndexNotReady);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn replace_mode_supersedes_previous_document() {
    let (session, _) = session_with_counter();
    session
        .ingest(text_request("Old", SCENARIO_TEXT, IngestMode::Replace))
        .await
        .unwrap();
    session
        .ingest(text_request(
            "New",
            "Cargo builds packages.",
            IngestMode::Replace,
        ))
        .await
        .unwrap();

    let status = session.status();
    assert_eq!(status.document_count, 1);
    assert_eq!(status.documents[0].title, "New");
    let answer = session.ask("What is a variable?", Some(5)).await.unwrap();
    assert!(answer.citations.iter().all(|c| c.document_title == "New"));
}

// ─── Index properties ───────────────────────────────────────────────

#[test]
fn reset_is_idempotent() {
    let index = InMemoryIndex::new();
    index
        .insert(batch_of("a", vec![vec![1.0, 0.0]]), IngestMode::Replace)
        .unwrap();
    index.reset();
    let once = index.status();
    index.reset();
    let twice = index.status();
    assert_eq!(once, twice);
    assert!(!index.is_ready());
}

#[test]
fn query_equal_to_inserted_vector_ranks_it_first() {
    let vectors = vec![
        vec![0.2, 0.9, 0.1],
        vec![0.8, 0.1, 0.3],
        vec![0.3, 0.3, 0.9],
        vec![0.5, 0.5, 0.5],
    ];
    let index = InMemoryIndex::new();
    index
        .insert(batch_of("doc", vectors.clone()), IngestMode::Replace)
        .unwrap();

    for (i, v) in vectors.iter().enumerate() {
        let hits = index.search(v, vectors.len()).unwrap();
        assert_eq!(hits.len(), vectors.len());
        assert_eq!(hits[0].position, i);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }
}

#[test]
fn accumulate_dimension_mismatch_is_rejected_atomically() {
    let index = InMemoryIndex::new();
    index
        .insert(batch_of("a", vec![vec![1.0, 0.0], vec![0.0, 1.0]]), IngestMode::Replace)
        .unwrap();
    let before = index.status();

    let err = index
        .insert(batch_of("b", vec![vec![1.0, 0.0, 0.0]]), IngestMode::Accumulate)
        .unwrap_err();
    assert!(matches!(err, QaError::DimensionMismatch { expected: 2, actual: 3 }));
    assert_eq!(index.status(), before);
}

/// Readers racing replace-mode inserts must see either the old or the new
/// index in full, never a mix.
#[test]
fn concurrent_search_sees_whole_snapshots() {
    const SIZE: usize = 16;
    let index = Arc::new(InMemoryIndex::new());
    index
        .insert(batch_of("gen-a", vec![vec![1.0, 0.0]; SIZE]), IngestMode::Replace)
        .unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let index = index.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            for round in 0..200 {
                let title = if round % 2 == 0 { "gen-b" } else { "gen-a" };
                index
                    .insert(batch_of(title, vec![vec![1.0, 0.0]; SIZE]), IngestMode::Replace)
                    .unwrap();
            }
            stop.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = index.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    let hits = index.search(&[1.0, 0.0], SIZE).unwrap();
                    assert_eq!(hits.len(), SIZE);
                    let title = &hits[0].chunk.document_title;
                    assert!(hits.iter().all(|h| &h.chunk.document_title == title));
                    let status = index.status();
                    assert_eq!(status.chunk_count, SIZE);
                    assert_eq!(status.document_count, 1);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn chunking_is_deterministic() {
    let text = "First paragraph talks about ownership.\n\nSecond paragraph covers borrowing \
                and lifetimes. It is longer than the first one.\n\nThird.";
    let config = ChunkerConfig {
        max_tokens: 12,
        min_tokens: 3,
        overlap_tokens: 4,
    };
    let a = chunk_text("doc", "Guide", text, &config);
    let b = chunk_text("doc", "Guide", text, &config);
    assert_eq!(a, b);
}

fn unit_vector(raw: Vec<f32>) -> Vec<f32> {
    let mut v = raw;
    normalize(&mut v);
    v
}

proptest! {
    #[test]
    fn search_scores_are_non_increasing(
        vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 1..24),
        query in prop::collection::vec(-1.0f32..1.0, 4),
        top_k in 1usize..30,
    ) {
        let index = InMemoryIndex::new();
        let n = vectors.len();
        index
            .insert(batch_of("p", vectors.into_iter().map(unit_vector).collect()), IngestMode::Replace)
            .unwrap();

        let hits = index.search(&query, top_k).unwrap();
        prop_assert_eq!(hits.len(), top_k.min(n));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].position < pair[1].position);
            }
        }
    }
}
