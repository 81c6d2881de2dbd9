//! Property tests for similarity index ordering, thresholds and breadth.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use timeline_rag::{
    Embeddable, EmbeddingProvider, RagError, Result, ScoredItem, SearchParams, SimilarityIndex,
};

/// An item whose text is its own embedding, written as comma-separated floats.
#[derive(Debug, Clone, PartialEq)]
struct Item(String);

impl Item {
    fn from_vector(id: usize, vector: &[f32]) -> Self {
        let values: Vec<String> = vector.iter().map(f32::to_string).collect();
        Item(format!("{id}|{}", values.join(",")))
    }
}

impl Embeddable for Item {
    fn embedding_text(&self) -> &str {
        &self.0
    }
}

/// Parses the embedding back out of the text.
struct ParsingEmbedder;

#[async_trait]
impl EmbeddingProvider for ParsingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let values = text.split_once('|').map_or(text, |(_, values)| values);
        Ok(values.split(',').map(|v| v.parse().unwrap()).collect())
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// Returns one vector fewer than asked for.
struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortBatchEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Fails every call; used to prove the provider is never reached.
struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "unreachable".into(), message: "called".into() })
    }

    fn dimensions(&self) -> usize {
        2
    }
}

const DIM: usize = 4;

fn arb_embedding() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, DIM)
}

fn arb_params() -> impl Strategy<Value = SearchParams> {
    (-1.0f32..1.0, 1usize..6, 1usize..6, 1usize..30).prop_map(
        |(min_score, initial_results, result_increment, max_results)| SearchParams {
            min_score,
            initial_results,
            result_increment,
            max_results,
        },
    )
}

fn build(vectors: &[Vec<f32>]) -> SimilarityIndex<Item> {
    let items = vectors.iter().enumerate().map(|(i, v)| Item::from_vector(i, v)).collect();
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(SimilarityIndex::build(Arc::new(ParsingEmbedder), items)).unwrap()
}

fn ids(hits: &[ScoredItem<Item>]) -> Vec<String> {
    hits.iter().map(|hit| hit.item.0.clone()).collect()
}

mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_descend_clear_the_threshold_and_respect_the_cap(
            vectors in proptest::collection::vec(arb_embedding(), 1..25),
            query in arb_embedding(),
            params in arb_params(),
        ) {
            let index = build(&vectors);
            let hits = index.search_by_embedding(&query, &params);

            prop_assert!(hits.len() <= params.max_results);
            prop_assert!(hits.len() <= vectors.len());
            for hit in &hits {
                prop_assert!(hit.score >= params.min_score);
            }
            for pair in hits.windows(2) {
                prop_assert!(
                    pair[0].score >= pair[1].score,
                    "results not in descending order: {} < {}",
                    pair[0].score,
                    pair[1].score,
                );
            }
        }

        #[test]
        fn every_passing_item_is_returned_when_the_cap_allows(
            vectors in proptest::collection::vec(arb_embedding(), 1..25),
            query in arb_embedding(),
            min_score in -1.0f32..1.0,
            initial_results in 1usize..4,
            result_increment in 1usize..4,
        ) {
            let index = build(&vectors);
            let params = SearchParams {
                min_score,
                initial_results,
                result_increment,
                max_results: vectors.len(),
            };
            let hits = index.search_by_embedding(&query, &params);
            let all = index.search_by_embedding(
                &query,
                &SearchParams { min_score: -2.0, ..params },
            );

            let expected = all.iter().filter(|hit| hit.score >= min_score).count();
            prop_assert_eq!(hits.len(), expected);
        }
    }
}

mod prop_recall_monotonicity {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn lowering_the_threshold_never_drops_results(
            vectors in proptest::collection::vec(arb_embedding(), 1..25),
            query in arb_embedding(),
            params in arb_params(),
            delta in 0.0f32..1.0,
        ) {
            let index = build(&vectors);
            let strict = index.search_by_embedding(&query, &params);
            let relaxed = index.search_by_embedding(
                &query,
                &SearchParams { min_score: params.min_score - delta, ..params },
            );

            let strict_ids = ids(&strict);
            let relaxed_ids = ids(&relaxed);
            prop_assert!(relaxed_ids.len() >= strict_ids.len());
            prop_assert_eq!(&relaxed_ids[..strict_ids.len()], strict_ids.as_slice());
        }

        #[test]
        fn a_larger_budget_returns_a_superset(
            vectors in proptest::collection::vec(arb_embedding(), 1..25),
            query in arb_embedding(),
            params in arb_params(),
            extra_results in 0usize..10,
            extra_increment in 0usize..10,
        ) {
            let index = build(&vectors);
            let small = ids(&index.search_by_embedding(&query, &params));
            let large = ids(&index.search_by_embedding(
                &query,
                &SearchParams {
                    max_results: params.max_results + extra_results,
                    result_increment: params.result_increment + extra_increment,
                    ..params
                },
            ));

            prop_assert!(large.len() >= small.len());
            prop_assert_eq!(&large[..small.len()], small.as_slice());
        }
    }
}

#[test]
fn equal_scores_keep_insertion_order() {
    let vectors = vec![vec![1.0, 0.0, 0.0, 0.0]; 5];
    let index = build(&vectors);
    let params = SearchParams { min_score: 0.5, initial_results: 1, result_increment: 1, max_results: 10 };

    let hits = index.search_by_embedding(&[2.0, 0.0, 0.0, 0.0], &params);

    let order: Vec<&str> = hits.iter().map(|hit| hit.item.0.split('|').next().unwrap()).collect();
    assert_eq!(order, vec!["0", "1", "2", "3", "4"]);
}

#[test]
fn breadth_expands_until_a_candidate_fails() {
    let vectors = vec![
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.9, 0.1, 0.0, 0.0],
        vec![0.8, 0.2, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.0],
    ];
    let index = build(&vectors);
    let params = SearchParams { min_score: 0.9, initial_results: 1, result_increment: 1, max_results: 4 };

    let hits = index.search_by_embedding(&[1.0, 0.0, 0.0, 0.0], &params);

    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|hit| hit.score >= 0.9));
}

#[test]
fn threshold_above_every_score_yields_nothing() {
    let index = build(&[vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]]);
    let params = SearchParams { min_score: 0.99, ..SearchParams::default() };

    assert!(index.search_by_embedding(&[1.0, 1.0, 0.0, 0.0], &params).is_empty());
}

#[tokio::test]
async fn empty_index_never_calls_the_provider() {
    let index: SimilarityIndex<Item> =
        SimilarityIndex::build(Arc::new(UnreachableEmbedder), Vec::new()).await.unwrap();

    assert!(index.is_empty());
    let hits = index.search("anything", &SearchParams::default()).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn short_batch_is_an_error() {
    let items = vec![Item("a".into()), Item("b".into())];
    let err = SimilarityIndex::build(Arc::new(ShortBatchEmbedder), items).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { ref message, .. } if message.contains("expected 2")));
}

#[tokio::test]
async fn malformed_vectors_are_rejected() {
    let items = vec![Item("1.0,NaN".into())];
    let err = SimilarityIndex::build(Arc::new(ParsingEmbedder), items).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { ref message, .. } if message.contains("non-finite")));
}
