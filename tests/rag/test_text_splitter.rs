// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/rag/test_text_splitter.rs

use fabstir_breed_assistant::rag::{CharacterTextSplitter, Document};

#[test]
fn test_overlap_carries_trailing_pieces() {
    let splitter = CharacterTextSplitter::new("\n\n", 10, 4).unwrap();
    let chunks = splitter.split_text("aaa\n\nbbb\n\nccc\n\nddd");
    assert_eq!(chunks, vec!["aaa\n\nbbb", "bbb\n\nccc", "ccc\n\nddd"]);
}

#[test]
fn test_no_overlap_never_repeats_pieces() {
    let splitter = CharacterTextSplitter::new("\n\n", 10, 0).unwrap();
    let chunks = splitter.split_text("aaa\n\nbbb\n\nccc\n\nddd");
    assert_eq!(chunks, vec!["aaa\n\nbbb", "ccc\n\nddd"]);
}

#[test]
fn test_chunks_respect_size_when_pieces_fit() {
    let paragraphs: Vec<String> = (0..50)
        .map(|i| format!("Paragraph {} about dairy breeds.", i))
        .collect();
    let text = paragraphs.join("\n\n");

    let splitter = CharacterTextSplitter::new("\n\n", 200, 0).unwrap();
    let chunks = splitter.split_text(&text);

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= 200, "chunk too long: {}", chunk.len());
    }

    // Every paragraph survives exactly once
    let rejoined = chunks.join("\n\n");
    assert_eq!(rejoined, text);
}

#[test]
fn test_custom_separator() {
    let splitter = CharacterTextSplitter::new(". ", 20, 0).unwrap();
    let chunks = splitter.split_text("Gir are hardy. Sahiwal give milk. Angus are black");
    assert_eq!(chunks, vec!["Gir are hardy", "Sahiwal give milk", "Angus are black"]);
}

#[test]
fn test_multibyte_text_counted_in_chars() {
    // Each piece is 4 chars but 8 bytes
    let splitter = CharacterTextSplitter::new(" ", 9, 0).unwrap();
    let chunks = splitter.split_text("éééé ëëëë üüüü");
    assert_eq!(chunks, vec!["éééé ëëëë", "üüüü"]);
}

#[test]
fn test_split_documents_keeps_page_metadata() {
    let splitter = CharacterTextSplitter::new("\n\n", 12, 0).unwrap();
    let docs = vec![
        Document::new("Holstein\n\nblack and white")
            .with_metadata("source", "app/breed2.pdf")
            .with_metadata("page", 0),
        Document::new("Jersey")
            .with_metadata("source", "app/breed2.pdf")
            .with_metadata("page", 1),
    ];

    let chunks = splitter.split_documents(&docs);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].page_content, "Holstein");
    assert_eq!(chunks[1].page_content, "black and white");
    assert_eq!(chunks[0].page(), Some(0));
    assert_eq!(chunks[1].page(), Some(0));
    assert_eq!(chunks[2].page(), Some(1));
    assert!(chunks.iter().all(|c| c.source() == Some("app/breed2.pdf")));
}

#[test]
fn test_blank_pages_produce_no_chunks() {
    let splitter = CharacterTextSplitter::default();
    let docs = vec![Document::new(""), Document::new("  \n\n  ")];
    assert!(splitter.split_documents(&docs).is_empty());
}
