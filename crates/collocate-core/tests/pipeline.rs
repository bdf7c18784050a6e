//! End-to-end collocation runs over small in-memory corpora.

use collocate_core::{
    AssociationMeasures, CollocateEnumerator, CollocateRecord, CollocationError,
    CollocationOptions, CollocationResult, ContingencySignature, IndexStorage, Measure,
    MemoryCorpus, QueryError, Thresholds, TokenAnalyzer, WindowMode,
};

fn corpus() -> MemoryCorpus {
    MemoryCorpus::new()
        .with_document("mat.txt", "the cat sat on the mat")
        .with_document("dog.txt", "a cat and a dog")
        .with_document("none.txt", "no match here")
}

fn surface(left: usize, right: usize) -> CollocationOptions<'static> {
    CollocationOptions::new(WindowMode::Surface {
        left_span: left,
        right_span: right,
        within_sentence: false,
    })
}

fn collect(
    corpus: &MemoryCorpus,
    query: &str,
    options: CollocationOptions<'_>,
) -> Vec<CollocateRecord> {
    CollocateEnumerator::new(corpus, query, options)
        .unwrap()
        .collect::<CollocationResult<Vec<_>>>()
        .unwrap()
}

fn record<'r>(records: &'r [CollocateRecord], word: &str) -> &'r CollocateRecord {
    records
        .iter()
        .find(|r| r.word == word)
        .unwrap_or_else(|| panic!("missing record for {word}"))
}

#[test]
fn surface_records_in_vocabulary_order() {
    let records = collect(&corpus(), "cat", surface(2, 2));
    let words: Vec<&str> = records.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["cat", "a", "and", "on", "sat", "the"]);
}

#[test]
fn surface_signature_uses_corpus_marginals() {
    let records = collect(&corpus(), "cat", surface(2, 2));

    // two windows of four tokens each; fourteen corpus tokens
    let a = record(&records, "a");
    assert_eq!(a.signature, ContingencySignature::new("a", 2, 6, 2, 12));
    assert!((a.measures.mi - 1.0).abs() < 1e-12);
    assert_eq!(
        a.measures.log_likelihood.to_bits(),
        AssociationMeasures::from_signature(&a.signature)
            .log_likelihood
            .to_bits()
    );

    let the = record(&records, "the");
    assert_eq!(the.signature, ContingencySignature::new("the", 1, 6, 2, 12));
}

#[test]
fn surface_position_vectors() {
    let records = collect(&corpus(), "cat", surface(2, 2));

    let a = record(&records, "a");
    assert_eq!(a.left_freq, 1);
    assert_eq!(a.right_freq, 1);
    assert_eq!(a.positions.left(), [1, 0]);
    assert_eq!(a.positions.right(), [0, 1]);
    assert_eq!(a.positions.at(2), Some(1));

    let on = record(&records, "on");
    assert_eq!(on.positions.get("R2"), Some(1));
    assert_eq!(on.positions.get("R1"), Some(0));
    assert_eq!(on.left_freq, 0);
}

#[test]
fn node_is_reported_once_with_node_frequency() {
    let records = collect(&corpus(), "cat", surface(2, 2));
    let cat = record(&records, "cat");
    assert_eq!(cat.node_freq, 2);
    assert_eq!(cat.positions.at(0), Some(2));
    assert_eq!(cat.signature.o, 2);
    assert_eq!(cat.signature.f2, 2);
    assert_eq!(records.iter().filter(|r| r.word == "cat").count(), 1);
}

#[test]
fn thresholds_drop_records_below_any_cutoff() {
    let options =
        surface(2, 2).with_thresholds(Thresholds::new().with(Measure::Cooccurrence, 2.0));
    let records = collect(&corpus(), "cat", options);
    let words: Vec<&str> = records.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["cat", "a"]);
}

#[test]
fn sentence_mode_counts_windows() {
    let corpus = MemoryCorpus::new().with_document("abc", "A B C. D E F. G H.");
    let records = collect(
        &corpus,
        "E",
        CollocationOptions::new(WindowMode::TextualSentence),
    );
    let words: Vec<&str> = records.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["E", "D", "F"]);
    assert_eq!(
        record(&records, "D").signature,
        ContingencySignature::new("D", 1, 1, 1, 3)
    );
    assert_eq!(record(&records, "E").node_freq, 1);
}

#[test]
fn paragraph_mode_splits_on_newlines() {
    let corpus = MemoryCorpus::new().with_document("p", "x node y\nz w\nnode x");
    let records = collect(
        &corpus,
        "node",
        CollocationOptions::new(WindowMode::TextualParagraph),
    );
    // three paragraphs, two with the node, x in both of those
    let x = record(&records, "x");
    assert_eq!(x.signature, ContingencySignature::new("x", 2, 2, 2, 3));
    assert!(records.iter().all(|r| r.word != "z"));
}

#[test]
fn multi_word_node_is_joined_with_spaces() {
    let corpus = MemoryCorpus::new().with_document("t", "we take off now");
    let records = collect(&corpus, r#""take off""#, surface(3, 3));
    let node = record(&records, "take off");
    assert_eq!(node.node_freq, 1);
    assert_eq!(node.signature.o, 1);
    assert_eq!(node.signature.f2, 0);
    assert!(records.iter().any(|r| r.word == "we"));
}

#[test]
fn part_of_speech_terms_keep_their_tags() {
    let corpus = MemoryCorpus::new()
        .with_document("t", "the_POS_DT dog_POS_NN barks_POS_VBZ");
    let options =
        surface(2, 2).with_analyzer(TokenAnalyzer::new().with_part_of_speech(true));
    let records = collect(&corpus, "dog", options);
    let words: Vec<&str> = records.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["dog_POS_NN", "barks_POS_VBZ", "the_POS_DT"]);
    assert_eq!(record(&records, "the_POS_DT").signature.f2, 1);
}

#[test]
fn lowercase_folds_query_and_terms() {
    let corpus = MemoryCorpus::new()
        .with_lowercase(true)
        .with_document("a", "The Cat sat")
        .with_document("b", "the cat ran");
    let options = surface(2, 2).with_analyzer(TokenAnalyzer::new().with_lowercase(true));
    let records = collect(&corpus, "CAT", options);
    let the = record(&records, "the");
    assert_eq!(the.signature.o, 2);
    assert_eq!(the.signature.f2, 2);
}

#[test]
fn query_errors_surface_before_any_index_work() {
    let err = CollocateEnumerator::new(&corpus(), "*", surface(2, 2)).unwrap_err();
    assert!(matches!(
        err,
        CollocationError::Query(QueryError::BareWildcard(_))
    ));
}

#[test]
fn disk_storage_is_removed_after_exhaustion() {
    let corpus = corpus();
    let options = surface(2, 2).with_storage(IndexStorage::Disk);
    let mut records = CollocateEnumerator::new(&corpus, "cat", options).unwrap();
    let path = records.storage_path().unwrap().to_path_buf();
    assert!(path.exists());

    for record in records.by_ref() {
        record.unwrap();
    }
    assert!(records.is_finished());
    assert!(records.storage_path().is_none());
    assert!(!path.exists());
    assert!(records.next().is_none());
}

#[test]
fn dropping_early_releases_disk_storage() {
    let corpus = corpus();
    let options = surface(2, 2).with_storage(IndexStorage::Disk);
    let mut records = CollocateEnumerator::new(&corpus, "cat", options).unwrap();
    let path = records.storage_path().unwrap().to_path_buf();
    assert!(records.next().is_some());
    drop(records);
    assert!(!path.exists());
}

#[test]
fn disk_and_memory_storage_agree() {
    let memory = collect(&corpus(), "cat", surface(2, 2));
    let disk = collect(
        &corpus(),
        "cat",
        surface(2, 2)
            .with_storage(IndexStorage::Disk)
            .with_batch_size(1),
    );
    assert_eq!(memory.len(), disk.len());
    for (m, d) in memory.iter().zip(&disk) {
        assert_eq!(m.signature, d.signature);
        assert_eq!(m.positions, d.positions);
    }
}

#[test]
fn records_serialize_to_json() {
    let records = collect(&corpus(), "cat", surface(2, 2));
    let json = serde_json::to_value(record(&records, "on")).unwrap();
    assert_eq!(json["word"], "on");
    assert_eq!(json["signature"]["o"], 1);
    assert_eq!(json["positions"]["R2"], 1);
    assert!(json["measures"]["simpleLL"].is_number());
}
