use super::*;
use crate::index::build_cluster_index;
use crate::models::Form;

fn ids(concepts: &[&str]) -> Vec<ConceptId> {
    concepts.iter().map(|c| c.to_string()).collect()
}

fn languages() -> Vec<Language> {
    vec![
        Language::new("L1", "X"),
        Language::new("L2", "X"),
        Language::new("L3", "Y"),
        Language::new("L4", "Y"),
    ]
}

/// c1..c3 inherited within each family, c4..c6 borrowed across families
fn corpus() -> Vec<Form> {
    let mut forms = Vec::new();
    let mut next = 0;
    let mut id = || {
        next += 1;
        next.to_string()
    };
    for concept in ["c1", "c2", "c3"] {
        for (lang, family) in [("L1", "X"), ("L2", "X"), ("L3", "Y"), ("L4", "Y")] {
            forms.push(
                Form::new(id(), lang, family, concept).with_cognate(format!("{concept}-{family}")),
            );
        }
    }
    for concept in ["c4", "c5", "c6"] {
        for (lang, family) in [("L1", "X"), ("L2", "X"), ("L3", "Y"), ("L4", "Y")] {
            forms.push(
                Form::new(id(), lang, family, concept)
                    .with_cognate(format!("{concept}-{family}"))
                    .with_borrowing(format!("b-{concept}")),
            );
        }
    }
    forms
}

fn universe() -> Vec<ConceptId> {
    ids(&["c1", "c2", "c3", "c4", "c5", "c6"])
}

#[test]
fn test_score_subset_extremes() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    assert_eq!(score_subset(&index, &langs, &ids(&["c1", "c2"])).unwrap(), 1.0);
    assert_eq!(score_subset(&index, &langs, &ids(&["c4", "c6"])).unwrap(), 0.0);
    assert_eq!(score_subset(&index, &langs, &ids(&["c1", "c4"])).unwrap(), 0.5);
}

#[test]
fn test_score_subset_weights_synonyms() {
    let mut forms = corpus();
    // A second, unborrowed L1 word for c4 halves L1's borrowing there
    forms.push(Form::new("extra", "L1", "X", "c4"));
    let index = build_cluster_index(forms);
    let score = score_subset(&index, &languages(), &ids(&["c4"])).unwrap();
    assert!((score - 0.125).abs() < 1e-12);
}

#[test]
fn test_score_subset_skips_languages_without_data() {
    let forms: Vec<Form> = corpus()
        .into_iter()
        .filter(|f| !(f.language_id == "L4" && f.concept_id == "c4"))
        .collect();
    let index = build_cluster_index(forms);
    // L4 has no data for c4; the other three borrowed it
    assert_eq!(score_subset(&index, &languages(), &ids(&["c4"])).unwrap(), 0.0);
}

#[test]
fn test_score_subset_rejects_empty_and_unattested() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    assert!(matches!(
        score_subset(&index, &langs, &[]),
        Err(AnalysisError::InvalidArgument(_))
    ));
    assert!(matches!(
        score_subset(&index, &langs, &ids(&["nowhere"])),
        Err(AnalysisError::InvalidArgument(_))
    ));
}

#[test]
fn test_observed_difference() {
    let index = build_cluster_index(corpus());
    let result = permutation_test(
        &index,
        &languages(),
        &universe(),
        &ids(&["c1", "c2", "c3"]),
        &ids(&["c4", "c5", "c6"]),
        50,
        Some(7),
    )
    .unwrap();
    assert_eq!(result.observed_a, 1.0);
    assert_eq!(result.observed_b, 0.0);
    assert_eq!(result.observed_diff, 1.0);
    assert_eq!(result.size_a, 3);
    assert_eq!(result.size_b, 3);
    assert_eq!(result.universe_size, 6);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let run = || {
        permutation_test(
            &index,
            &langs,
            &universe(),
            &ids(&["c1", "c4"]),
            &ids(&["c2", "c3", "c5", "c6"]),
            200,
            Some(42),
        )
        .unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_unseeded_run_reports_replayable_seed() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let a = ids(&["c1", "c2", "c4"]);
    let b = ids(&["c3", "c5", "c6"]);
    let first = permutation_test(&index, &langs, &universe(), &a, &b, 100, None).unwrap();
    let replay =
        permutation_test(&index, &langs, &universe(), &a, &b, 100, Some(first.seed)).unwrap();
    assert_eq!(first, replay);
}

#[test]
fn test_p_value_is_hit_fraction() {
    let index = build_cluster_index(corpus());
    let result = permutation_test(
        &index,
        &languages(),
        &universe(),
        &ids(&["c1", "c2"]),
        &ids(&["c3", "c4", "c5", "c6"]),
        333,
        Some(3),
    )
    .unwrap();
    assert!((0.0..=1.0).contains(&result.p_value));
    assert_eq!(result.replicates, 333);
    assert_eq!(result.p_value, result.hits as f64 / 333.0);
}

#[test]
fn test_extreme_split_is_significant() {
    let index = build_cluster_index(corpus());
    let result = permutation_test(
        &index,
        &languages(),
        &universe(),
        &ids(&["c1", "c2", "c3"]),
        &ids(&["c4", "c5", "c6"]),
        2000,
        Some(11),
    )
    .unwrap();
    // Only the one sample out of C(6,3) = 20 matching A reaches d' = 1
    assert!(result.hits > 0);
    assert!(result.p_value < 0.15, "p = {}", result.p_value);
}

#[test]
fn test_unattested_universe_concepts_do_not_abort() {
    // "zz" has no forms, so some replicates draw a side without any data
    let index = build_cluster_index(corpus());
    let result = permutation_test(
        &index,
        &languages(),
        &ids(&["c1", "c2", "zz"]),
        &ids(&["c1"]),
        &ids(&["c2", "zz"]),
        200,
        Some(1),
    )
    .unwrap();
    assert_eq!(result.observed_a, 1.0);
    assert_eq!(result.observed_b, 1.0);
    assert_eq!(result.observed_diff, 0.0);
    // Drawing {zz} as A' gives d' = 0 - 1, every other draw ties the observation
    assert!(result.hits > 0 && result.hits < 200, "hits = {}", result.hits);
    assert!(result.null_mean < 0.0);
    assert_eq!(result.p_value, result.hits as f64 / 200.0);
}

#[test]
fn test_worker_count_does_not_change_result() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let calculator =
        AdmixtureCalculator::new(&index, &langs, AdmixtureOptions::default()).unwrap();
    let a = ids(&["c1", "c5"]);
    let b = ids(&["c2", "c3", "c4", "c6"]);

    let sequential = PermutationTester::new(&calculator)
        .run(&universe(), &a, &b, 300, Some(99))
        .unwrap();
    let parallel = PermutationTester::new(&calculator)
        .with_workers(4)
        .run(&universe(), &a, &b, 300, Some(99))
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_input_order_does_not_change_result() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let mut shuffled = universe();
    shuffled.reverse();
    let a = permutation_test(&index, &langs, &universe(), &ids(&["c1", "c6"]), &ids(&["c2", "c3"]), 100, Some(5)).unwrap();
    let b = permutation_test(&index, &langs, &shuffled, &ids(&["c6", "c1"]), &ids(&["c3", "c2"]), 100, Some(5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_rejects_sample_larger_than_universe() {
    let index = build_cluster_index(corpus());
    let err = permutation_test(
        &index,
        &languages(),
        &ids(&["c1", "c2", "c3", "c4"]),
        &ids(&["c1", "c2", "c3", "c4", "c5"]),
        &ids(&["c6"]),
        10,
        Some(1),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument(_)));
}

#[test]
fn test_rejects_sample_equal_to_universe() {
    let index = build_cluster_index(corpus());
    let err = permutation_test(
        &index,
        &languages(),
        &ids(&["c1", "c2"]),
        &ids(&["c1", "c2"]),
        &ids(&["c3"]),
        10,
        Some(1),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument(_)));
}

#[test]
fn test_rejects_zero_replicates() {
    let index = build_cluster_index(corpus());
    let err = permutation_test(
        &index,
        &languages(),
        &universe(),
        &ids(&["c1"]),
        &ids(&["c2"]),
        0,
        Some(1),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument(_)));
}

#[test]
fn test_rejects_empty_subsets() {
    let index = build_cluster_index(corpus());
    let err = permutation_test(&index, &languages(), &universe(), &[], &ids(&["c2"]), 10, None)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument(_)));
}

#[test]
fn test_validation_precedes_data_checks() {
    // Orphan form would be a DataIntegrity error, but zero replicates fails first
    let mut forms = corpus();
    forms.push(Form::new("x", "Ghost", "Z", "c1"));
    let index = build_cluster_index(forms);
    let err = permutation_test(&index, &languages(), &universe(), &ids(&["c1"]), &ids(&["c2"]), 0, None)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument(_)));

    let err = permutation_test(&index, &languages(), &ids(&["c1"]), &ids(&["c1"]), &ids(&["c2"]), 5, None)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidArgument(_)));

    let err = permutation_test(&index, &languages(), &universe(), &ids(&["c1"]), &ids(&["c2"]), 5, None)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::DataIntegrity { .. }));
}

#[test]
fn test_cancelled_before_first_replicate() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let calculator =
        AdmixtureCalculator::new(&index, &langs, AdmixtureOptions::default()).unwrap();
    let token = CancelToken::new();
    token.cancel();
    let err = PermutationTester::new(&calculator)
        .with_cancel_token(token)
        .run(&universe(), &ids(&["c1"]), &ids(&["c2"]), 100, Some(1))
        .unwrap_err();
    assert_eq!(err, AnalysisError::Cancelled { completed: 0 });
}

#[test]
fn test_cancel_from_progress_callback() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let calculator =
        AdmixtureCalculator::new(&index, &langs, AdmixtureOptions::default()).unwrap();
    let token = CancelToken::new();
    let trigger = token.clone();
    let err = PermutationTester::new(&calculator)
        .with_cancel_token(token)
        .with_progress_callback(Box::new(move |done, _| {
            if done == 10 {
                trigger.cancel();
            }
        }))
        .run(&universe(), &ids(&["c1"]), &ids(&["c2"]), 100, Some(1))
        .unwrap_err();
    assert_eq!(err, AnalysisError::Cancelled { completed: 10 });
}

#[test]
fn test_progress_callback_sees_every_replicate() {
    let index = build_cluster_index(corpus());
    let langs = languages();
    let calculator =
        AdmixtureCalculator::new(&index, &langs, AdmixtureOptions::default()).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    PermutationTester::new(&calculator)
        .with_workers(2)
        .with_progress_callback(Box::new(move |_, total| {
            assert_eq!(total, 64);
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .run(&universe(), &ids(&["c1", "c4"]), &ids(&["c2"]), 64, Some(8))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 64);
}
