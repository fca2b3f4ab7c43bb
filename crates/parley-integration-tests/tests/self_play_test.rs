//! Self-play tests: two engines negotiating with each other.
//!
//! Covers the complete session lifecycle:
//! 1. Opening bid
//! 2. Alternating offers with opponent model updates
//! 3. Acceptance and agreement on both sides

use parley_agent::{Action, NegotiationEngine, SessionPhase, StrategyConfig};
use parley_core::{AdditiveUtilitySpace, Domain, Issue, Outcome, OutcomeCatalog};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Helper Functions
// ============================================================================

const TURNS: usize = 200;
const VALUES: [&str; 4] = ["v0", "v1", "v2", "v3"];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn domain() -> Domain {
    Domain::new(vec![
        Issue::new(1, "price", VALUES).unwrap(),
        Issue::new(2, "delivery", VALUES).unwrap(),
        Issue::new(3, "warranty", VALUES).unwrap(),
    ])
    .unwrap()
}

/// Buyer prefers `v0` everywhere, seller `v3`; the utilities sum to 1 for
/// every outcome.
fn utility(domain: &Domain, buyer: bool) -> AdditiveUtilitySpace {
    let evals = [1.0, 2.0 / 3.0, 1.0 / 3.0, 0.0];
    let mut builder = AdditiveUtilitySpace::builder(domain)
        .weight(1, 0.5)
        .weight(2, 0.3)
        .weight(3, 0.2);
    for issue in 1..=3 {
        for (i, value) in VALUES.iter().enumerate() {
            let eval = if buyer { evals[i] } else { evals[3 - i] };
            builder = builder.evaluation(issue, *value, eval);
        }
    }
    builder.build().unwrap()
}

fn engine(buyer: bool, config: &StrategyConfig) -> NegotiationEngine {
    let domain = domain();
    let utility = utility(&domain, buyer);
    NegotiationEngine::with_sorted_space(domain, utility, config).unwrap()
}

fn time(turn: usize) -> f64 {
    turn as f64 / TURNS as f64
}

/// Alternates offers until one side accepts. Returns the agreed outcome
/// and the time of agreement.
fn run_session(first: &mut NegotiationEngine, second: &mut NegotiationEngine) -> Option<(Outcome, f64)> {
    let mut pending = first.opening_bid().unwrap().outcome;
    let mut turn = 0;

    loop {
        turn += 1;
        if turn > TURNS + 5 {
            return None;
        }
        let t = time(turn);
        let (responder, proposer) = if turn % 2 == 1 {
            (&mut *second, &mut *first)
        } else {
            (&mut *first, &mut *second)
        };

        responder.receive_offer(pending.clone(), t).unwrap();
        match responder.respond(t).unwrap() {
            Action::Accept(bid) => {
                proposer.confirm_agreement().unwrap();
                return Some((bid.outcome, t));
            }
            Action::Offer(bid) => pending = bid.outcome,
        }
    }
}

// ============================================================================
// Self-play Tests
// ============================================================================

#[test]
fn boulware_agents_reach_agreement_by_deadline() {
    init_tracing();
    let config = StrategyConfig::default();
    let mut buyer = engine(true, &config);
    let mut seller = engine(false, &config);

    let (outcome, t) = run_session(&mut buyer, &mut seller).expect("no agreement");
    tracing::info!(%outcome, t, "self-play agreement");

    assert!(t <= 1.0 + 3.0 / TURNS as f64);
    assert_eq!(buyer.session().phase(), SessionPhase::Agreed);
    assert_eq!(seller.session().phase(), SessionPhase::Agreed);

    let buyer_deal = buyer.session().agreement().unwrap();
    let seller_deal = seller.session().agreement().unwrap();
    assert_eq!(buyer_deal.outcome, seller_deal.outcome);

    // zero-sum domain
    let sum = buyer.utility_of(&outcome).unwrap() + seller.utility_of(&outcome).unwrap();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn histories_mirror_each_other() {
    let config = StrategyConfig::default();
    let mut buyer = engine(true, &config);
    let mut seller = engine(false, &config);
    run_session(&mut buyer, &mut seller).expect("no agreement");

    let buyer_offers: Vec<_> = buyer.session().own_history().iter().map(|b| &b.outcome).collect();
    let seen_by_seller: Vec<_> = seller
        .session()
        .opponent_history()
        .iter()
        .map(|b| &b.outcome)
        .collect();
    assert_eq!(buyer_offers, seen_by_seller);

    // the seller values the buyer's offers with its own utility
    for bid in seller.session().opponent_history().iter() {
        let expected = seller.utility_of(&bid.outcome).unwrap();
        assert!((bid.my_utility - expected).abs() < 1e-12);
    }
}

#[test]
fn model_learns_counterpart_preferences() {
    let config = StrategyConfig::default();
    let mut buyer = engine(true, &config);
    let mut seller = engine(false, &config);
    run_session(&mut buyer, &mut seller).expect("no agreement");

    let domain = domain();
    let buyer_best = domain.outcome([(1, "v0"), (2, "v0"), (3, "v0")]).unwrap();
    let buyer_worst = domain.outcome([(1, "v3"), (2, "v3"), (3, "v3")]).unwrap();

    let model = seller.opponent_model().unwrap();
    assert!(model.evaluate(&buyer_best) > model.evaluate(&buyer_worst));
}

#[test]
fn conceding_agent_agrees_earlier() {
    let stubborn = StrategyConfig::default();
    let mut conceder = StrategyConfig::default();
    conceder.concession.e = 2.0;

    let mut a = engine(true, &stubborn);
    let mut b = engine(false, &stubborn);
    let (_, slow) = run_session(&mut a, &mut b).expect("no agreement");

    let mut a = engine(true, &conceder);
    let mut b = engine(false, &conceder);
    let (_, fast) = run_session(&mut a, &mut b).expect("no agreement");

    assert!(fast < slow);
}

// ============================================================================
// Random Opponent Tests
// ============================================================================

#[test]
fn accepted_offers_respect_acceptance_rules() {
    init_tracing();
    let domain = domain();
    let outcomes = domain.outcomes();

    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut agent = engine(true, &StrategyConfig::default());
        agent.opening_bid().unwrap();

        let max_bid = agent.offering().catalog().max_bid().unwrap().my_utility;
        let surrender = agent.config().acceptance.surrender_time;
        let mut agreed = false;

        for turn in 1..=TURNS + 2 {
            let t = time(turn);
            let offer = outcomes[rng.gen_range(0..outcomes.len())].clone();
            agent.receive_offer(offer, t).unwrap();

            if let Action::Accept(bid) = agent.respond(t).unwrap() {
                let target = agent.offering().curve().target(t);
                assert!(
                    t > surrender || bid.my_utility >= target.min(max_bid) - 1e-9,
                    "seed {seed}: accepted {} below target {target} at t={t}",
                    bid.my_utility
                );
                agreed = true;
                break;
            }
        }

        assert!(agreed, "seed {seed}: random opponent never accepted by deadline");
        assert_eq!(agent.session().phase(), SessionPhase::Agreed);
    }
}
