//! Unit tests and property-based tests for the opponent model.

use std::collections::BTreeMap;

use parley_core::{BidDetails, Issue};

use super::*;

fn domain() -> Domain {
    Domain::new(vec![
        Issue::new(1, "price", ["low", "mid", "high"]).unwrap(),
        Issue::new(2, "delivery", ["fast", "normal", "slow"]).unwrap(),
        Issue::new(3, "warranty", ["none", "one", "two"]).unwrap(),
    ])
    .unwrap()
}

fn offer(price: &str, delivery: &str, warranty: &str) -> BidDetails {
    let outcome = domain()
        .outcome([(1, price), (2, delivery), (3, warranty)])
        .unwrap();
    BidDetails::new(outcome, 0.5, 0.0)
}

fn history(offers: Vec<BidDetails>) -> BidHistory {
    let mut history = BidHistory::new();
    for o in offers {
        history.push(o);
    }
    history
}

fn weight_sum(model: &FrequencyModel) -> f64 {
    model.weights().values().sum()
}

// ==========================================================================
// Initialization
// ==========================================================================

#[test]
fn starts_with_uniform_weights_and_flat_scores() {
    let model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();

    for issue in domain().issues() {
        assert!((model.weight(issue.id()).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        for value in issue.values() {
            assert_eq!(model.value_score(issue.id(), value), Some(1));
        }
    }
    assert!((model.golden_value() - 0.2 / 3.0).abs() < 1e-12);
    assert_eq!(model.update_count(), 0);
}

#[test]
fn untrained_model_rates_everything_equally() {
    let model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let a = model.evaluate(&offer("low", "fast", "none").outcome);
    let b = model.evaluate(&offer("high", "slow", "two").outcome);
    assert!((a - 1.0).abs() < 1e-12);
    assert!((a - b).abs() < 1e-12);
}

#[test]
fn rejects_invalid_params() {
    let params = ModelParams {
        number_of_rounds: 1,
        ..ModelParams::default()
    };
    assert!(FrequencyModel::new(&domain(), params).is_err());
}

// ==========================================================================
// Update gating
// ==========================================================================

#[test]
fn update_is_noop_below_round_to_update() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let snapshot = model.clone();

    let h = history(vec![
        offer("low", "fast", "none"),
        offer("low", "normal", "one"),
        offer("low", "slow", "two"),
    ]);
    model.update(&h, 0.3);

    assert_eq!(model, snapshot);
}

#[test]
fn first_offer_is_never_paired() {
    let params = ModelParams {
        round_to_update: 1,
        number_of_rounds: 2,
        ..ModelParams::default()
    };
    let mut model = FrequencyModel::new(&domain(), params).unwrap();

    let h = history(vec![offer("low", "fast", "none"), offer("low", "slow", "two")]);
    model.update(&h, 0.1);

    // weights untouched, the latest offer's values still counted
    for issue in domain().issues() {
        assert!((model.weight(issue.id()).unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }
    assert_eq!(model.value_score(IssueId(2), &Value::from("slow")), Some(2));
    assert_eq!(model.value_score(IssueId(2), &Value::from("fast")), Some(1));
}

// ==========================================================================
// Learning
// ==========================================================================

#[test]
fn unchanged_issue_gains_weight() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let h = history(vec![
        offer("low", "fast", "none"),
        offer("low", "normal", "one"),
        offer("low", "slow", "two"),
        offer("low", "fast", "one"),
    ]);
    model.update(&h, 0.4);

    let price = model.weight(IssueId(1)).unwrap();
    let delivery = model.weight(IssueId(2)).unwrap();
    let warranty = model.weight(IssueId(3)).unwrap();
    assert!(price > delivery);
    assert!(price > warranty);
    assert!((weight_sum(&model) - 1.0).abs() < 1e-9);
    assert_eq!(model.update_count(), 1);
}

#[test]
fn hard_headed_settings_match_single_pair_model() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::hard_headed()).unwrap();
    let h = history(vec![
        offer("high", "slow", "none"),
        offer("mid", "fast", "none"),
        offer("mid", "normal", "two"),
    ]);
    model.update(&h, 0.2);

    // single pair (offers 1 and 2): only price unchanged
    let g = 0.2 / 3.0;
    let expected_price = (1.0 / 3.0 + g) / (1.0 + g);
    let expected_other = (1.0 / 3.0) / (1.0 + g);
    assert!((model.weight(IssueId(1)).unwrap() - expected_price).abs() < 1e-12);
    assert!((model.weight(IssueId(2)).unwrap() - expected_other).abs() < 1e-12);
    assert!((model.weight(IssueId(3)).unwrap() - expected_other).abs() < 1e-12);

    // only the latest offer's values are counted
    assert_eq!(model.value_score(IssueId(1), &Value::from("mid")), Some(2));
    assert_eq!(model.value_score(IssueId(2), &Value::from("normal")), Some(2));
    assert_eq!(model.value_score(IssueId(2), &Value::from("fast")), Some(1));
    assert_eq!(model.value_score(IssueId(3), &Value::from("two")), Some(2));
}

#[test]
fn value_scores_count_recent_window() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let h = history(vec![
        offer("high", "slow", "two"),
        offer("mid", "slow", "two"),
        offer("low", "fast", "two"),
        offer("low", "normal", "two"),
    ]);
    model.update(&h, 0.5);

    // window = numberOfRounds - 1 = 2 latest offers
    assert_eq!(model.value_score(IssueId(1), &Value::from("low")), Some(3));
    assert_eq!(model.value_score(IssueId(1), &Value::from("mid")), Some(1));
    assert_eq!(model.value_score(IssueId(2), &Value::from("fast")), Some(2));
    assert_eq!(model.value_score(IssueId(2), &Value::from("slow")), Some(1));
    assert_eq!(model.value_score(IssueId(3), &Value::from("two")), Some(3));
}

#[test]
fn scores_never_decrease() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::hard_headed()).unwrap();
    let mut offers = vec![
        offer("low", "fast", "none"),
        offer("low", "fast", "none"),
        offer("mid", "slow", "one"),
    ];
    let mut previous = model.clone();
    for next in [offer("high", "normal", "two"), offer("low", "fast", "none")] {
        offers.push(next);
        model.update(&history(offers.clone()), 0.5);
        for issue in domain().issues() {
            for value in issue.values() {
                assert!(model.value_score(issue.id(), value) >= previous.value_score(issue.id(), value));
            }
        }
        previous = model.clone();
    }
}

#[test]
fn learned_model_prefers_repeated_values() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let mut offers = Vec::new();
    for delivery in ["fast", "normal", "slow", "fast", "normal", "slow"] {
        offers.push(offer("low", delivery, "two"));
        model.update(&history(offers.clone()), 0.5);
    }

    let liked = model.evaluate(&offer("low", "fast", "two").outcome);
    let disliked = model.evaluate(&offer("high", "fast", "none").outcome);
    assert!(liked > disliked);
}

// ==========================================================================
// Lookup failures
// ==========================================================================

fn raw(pairs: &[(u32, &str)]) -> BidDetails {
    let values: BTreeMap<IssueId, Value> = pairs
        .iter()
        .map(|(issue, value)| (IssueId(*issue), Value::from(*value)))
        .collect();
    BidDetails::new(Outcome::new(values), 0.5, 0.0)
}

#[test]
fn unknown_values_are_skipped_during_update() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::hard_headed()).unwrap();
    let h = history(vec![
        raw(&[(1, "low"), (2, "fast"), (3, "none")]),
        raw(&[(1, "low"), (2, "fast"), (3, "none")]),
        raw(&[(1, "free"), (2, "fast"), (9, "bogus")]),
    ]);
    model.update(&h, 0.3);

    assert!((weight_sum(&model) - 1.0).abs() < 1e-9);
    assert_eq!(model.value_score(IssueId(2), &Value::from("fast")), Some(2));
    assert_eq!(model.value_score(IssueId(1), &Value::from("free")), None);
    // warranty missing from the latest offer: its cell is skipped
    assert_eq!(model.value_score(IssueId(3), &Value::from("none")), Some(1));
}

#[test]
fn evaluate_skips_unknown_cells() {
    let model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let partial = raw(&[(1, "low"), (2, "teleport")]);
    let u = model.evaluate(&partial.outcome);
    assert!((u - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn evaluate_is_idempotent() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let h = history(vec![
        offer("low", "fast", "none"),
        offer("low", "normal", "one"),
        offer("low", "slow", "two"),
        offer("mid", "fast", "two"),
    ]);
    model.update(&h, 0.4);

    let target = offer("low", "slow", "two").outcome;
    assert_eq!(model.evaluate(&target), model.evaluate(&target));
}

// ==========================================================================
// Snapshots
// ==========================================================================

fn five_offers() -> BidHistory {
    history(vec![
        offer("low", "fast", "none"),
        offer("low", "normal", "one"),
        offer("mid", "slow", "two"),
        offer("low", "fast", "two"),
        offer("high", "fast", "one"),
    ])
}

fn assert_same_state(a: &FrequencyModel, b: &FrequencyModel) {
    assert_eq!(a.update_count(), b.update_count());
    for issue in domain().issues() {
        let (wa, wb) = (a.weight(issue.id()).unwrap(), b.weight(issue.id()).unwrap());
        assert!((wa - wb).abs() < 1e-12);
        for value in issue.values() {
            assert_eq!(a.value_score(issue.id(), value), b.value_score(issue.id(), value));
        }
    }
}

#[test]
fn snapshot_reloads_and_keeps_learning() {
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let h = five_offers();
    model.update(&h, 0.3);

    let json = serde_json::to_string(&model).unwrap();
    let mut reloaded: FrequencyModel = serde_json::from_str(&json).unwrap();
    assert_same_state(&reloaded, &model);

    reloaded.update(&h, 0.4);
    model.update(&h, 0.4);
    assert_same_state(&reloaded, &model);
}

#[test]
fn snapshot_with_zero_window_is_rejected() {
    let model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let mut value = serde_json::to_value(&model).unwrap();
    value["params"]["number_of_rounds"] = serde_json::json!(0);

    let loaded = serde_json::from_value::<FrequencyModel>(value);
    assert!(loaded.is_err());
}

#[test]
fn snapshot_with_out_of_range_coefficient_is_rejected() {
    let model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    let mut value = serde_json::to_value(&model).unwrap();
    value["params"]["learning_coefficient"] = serde_json::json!(2.5);

    assert!(serde_json::from_value::<FrequencyModel>(value).is_err());
}

#[test]
fn single_offer_window_learns_no_values() {
    let params = ModelParams {
        round_to_update: 1,
        number_of_rounds: 1,
        ..ModelParams::default()
    };
    // window of one offer, reachable only by skipping validation
    let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
    model.params = params;

    model.update(&five_offers(), 0.5);
    assert_eq!(model.update_count(), 1);
    let low = Value::from("low");
    assert_eq!(model.value_score(IssueId(1), &low), Some(1));
    assert!((weight_sum(&model) - 1.0).abs() < 1e-9);
}

// ==========================================================================
// Property-based tests with proptest
// ==========================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    const PRICES: [&str; 3] = ["low", "mid", "high"];
    const DELIVERIES: [&str; 3] = ["fast", "normal", "slow"];
    const WARRANTIES: [&str; 3] = ["none", "one", "two"];

    prop_compose! {
        fn arb_offer()(p in 0usize..3, d in 0usize..3, w in 0usize..3) -> BidDetails {
            offer(PRICES[p], DELIVERIES[d], WARRANTIES[w])
        }
    }

    prop_compose! {
        fn arb_params()(round_to_update in 1usize..6, number_of_rounds in 2usize..6, l in 0.0f64..=1.0) -> ModelParams {
            ModelParams {
                learning_coefficient: l,
                round_to_update,
                number_of_rounds,
                ..ModelParams::default()
            }
        }
    }

    proptest! {
        #[test]
        fn weights_sum_to_one_after_every_update(
            params in arb_params(),
            offers in proptest::collection::vec(arb_offer(), 1..20),
        ) {
            let mut model = FrequencyModel::new(&domain(), params).unwrap();
            let mut h = BidHistory::new();
            for o in offers {
                h.push(o);
                model.update(&h, 0.5);
                prop_assert!((weight_sum(&model) - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn evaluation_stays_in_unit_interval(
            offers in proptest::collection::vec(arb_offer(), 1..12),
            sample in arb_offer(),
        ) {
            let mut model = FrequencyModel::new(&domain(), ModelParams::default()).unwrap();
            let mut h = BidHistory::new();
            for o in offers {
                h.push(o);
                model.update(&h, 0.5);
            }
            let u = model.evaluate(&sample.outcome);
            prop_assert!((0.0..=1.0).contains(&u));
        }
    }
}
