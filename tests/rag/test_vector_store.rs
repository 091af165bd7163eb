// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_vector_store.rs

use fabstir_breed_assistant::rag::{Document, VectorStore};

fn breed_store() -> VectorStore {
    let mut store = VectorStore::new(3);
    store
        .add(
            vec![
                Document::new("Holstein"),
                Document::new("Jersey"),
                Document::new("Gir"),
                Document::new("Sahiwal"),
            ],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.1, 0.9],
            ],
        )
        .unwrap();
    store
}

#[test]
fn test_nearest_first_with_squared_distance() {
    let store = breed_store();
    let results = store.similarity_search_by_vector(&[0.0, 0.0, 1.0], 2).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.page_content, "Gir");
    assert_eq!(results[0].1, 0.0);
    assert_eq!(results[1].0.page_content, "Sahiwal");
    // 0.1^2 + 0.1^2
    assert!((results[1].1 - 0.02).abs() < 1e-6);
}

#[test]
fn test_k_larger_than_store_returns_all() {
    let store = breed_store();
    let results = store.similarity_search_by_vector(&[1.0, 0.0, 0.0], 10).unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].0.page_content, "Holstein");
}

#[test]
fn test_k_zero_and_empty_store() {
    let store = breed_store();
    assert!(store.similarity_search_by_vector(&[1.0, 0.0, 0.0], 0).unwrap().is_empty());

    let empty = VectorStore::new(3);
    assert!(empty.is_empty());
    assert!(empty.similarity_search_by_vector(&[1.0, 0.0, 0.0], 4).unwrap().is_empty());
}

#[test]
fn test_equal_distances_keep_insertion_order() {
    let mut store = VectorStore::new(2);
    store
        .add(
            vec![Document::new("first"), Document::new("second"), Document::new("third")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]],
        )
        .unwrap();

    let results = store.similarity_search_by_vector(&[0.0, 0.0], 3).unwrap();
    let order: Vec<_> = results.iter().map(|(d, _)| d.page_content.as_str()).collect();
    assert_eq!(order, vec!["first", "second", "third"]);
}

#[test]
fn test_wrong_dimension_rejected() {
    let mut store = breed_store();
    assert!(store.similarity_search_by_vector(&[1.0, 0.0], 1).is_err());

    let err = store
        .add(vec![Document::new("Angus")], vec![vec![1.0, 2.0]])
        .unwrap_err();
    assert!(err.to_string().contains("dimensions"));
    assert_eq!(store.len(), 4);
}

#[test]
fn test_batch_with_bad_vector_adds_nothing() {
    let mut store = breed_store();
    let result = store.add(
        vec![Document::new("Angus"), Document::new("Hereford")],
        vec![vec![0.5, 0.5, 0.0], vec![f32::NAN, 0.0, 0.0]],
    );
    assert!(result.is_err());
    assert_eq!(store.len(), 4);
}

#[test]
fn test_mismatched_counts_rejected() {
    let mut store = VectorStore::new(3);
    assert!(store
        .add(vec![Document::new("Angus")], vec![])
        .is_err());
    assert!(store.is_empty());
}
