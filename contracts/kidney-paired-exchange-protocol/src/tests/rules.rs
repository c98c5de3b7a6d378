use super::fixture::{
    donor_input, expect_assignments, load_paper_pool, patient_input, prefs, setup, TestContext,
};
use crate::{Assignment, BloodType, ChainRule, Outcome};

#[test]
fn priority_rule_favors_the_lowest_patient_id() {
    let ctx = setup();
    load_paper_pool(&ctx);

    // p1 sits in the longest candidate chain, so the priority scan lands on
    // the same chain the longest-chain rule picks.
    let summary = ctx.client.run_allocation(&ChainRule::Priority, &999, &999);
    assert_eq!(summary.rounds, 5);
    expect_assignments(
        &ctx,
        &[
            (1, Assignment::Kidney(9)),
            (9, Assignment::Waitlist),
            (10, Assignment::Kidney(1)),
            (12, Assignment::Kidney(12)),
        ],
    );
}

#[test]
fn priority_keep_matches_longest_keep_on_the_paper_pool() {
    let ctx = setup();
    load_paper_pool(&ctx);

    let summary = ctx.client.run_allocation(&ChainRule::PriorityKeep, &999, &999);
    assert_eq!(summary.rounds, 5);
    expect_assignments(
        &ctx,
        &[
            (10, Assignment::Kidney(1)),
            (12, Assignment::Kidney(10)),
        ],
    );
}

#[test]
fn hybrid_rule_keeps_chains_headed_by_non_o_donors() {
    let ctx = setup();
    load_paper_pool(&ctx);

    // Both selected chains are headed by pairs whose donors are B and A,
    // so the hybrid rule behaves exactly like priority-keep here.
    let summary = ctx.client.run_allocation(&ChainRule::HybridODonor, &999, &999);
    assert_eq!(summary.rounds, 5);
    expect_assignments(
        &ctx,
        &[
            (9, Assignment::Waitlist),
            (10, Assignment::Kidney(1)),
            (12, Assignment::Kidney(10)),
        ],
    );
}

/// Two chained pairs plus an absorber that only reaches the head's kidney
/// once its first choice is gone. The head pair's donor blood type decides
/// whether the chain parks as a bridge or leaves immediately.
fn hybrid_pool(head_donor: BloodType) -> TestContext {
    let ctx = setup();
    let env = &ctx.env;

    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 40, 0),
        &donor_input(env, head_donor, 40),
        &true,
    );
    ctx.client.add_pair(
        &patient_input(env, BloodType::B, 45, 0),
        &donor_input(env, BloodType::A, 45),
        &true,
    );
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 50, 0),
        &donor_input(env, BloodType::B, 50),
        &true,
    );

    ctx.client.set_preferences(&1, &prefs(env, &[2], true));
    ctx.client.set_preferences(&2, &prefs(env, &[], true));
    ctx.client.set_preferences(&3, &prefs(env, &[2, 1], true));
    ctx
}

#[test]
fn hybrid_rule_removes_chain_headed_by_o_donor() {
    let ctx = hybrid_pool(BloodType::O);

    let summary = ctx.client.run_allocation(&ChainRule::HybridODonor, &999, &999);

    // The selected chain p1 -> k2 -> p2 -> w is finalized on the spot: its
    // head donor is type O. k1 leaves with it, so p3 never reaches it and
    // falls through to the waitlist.
    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.waitlisted, 2);
    expect_assignments(
        &ctx,
        &[
            (1, Assignment::Kidney(2)),
            (2, Assignment::Waitlist),
            (3, Assignment::Waitlist),
        ],
    );
}

#[test]
fn hybrid_rule_keeps_chain_and_leaves_the_bridge_donor() {
    let ctx = hybrid_pool(BloodType::A);

    let summary = ctx.client.run_allocation(&ChainRule::HybridODonor, &999, &999);

    // Same chain, but an A-type head donor parks it instead. k1 stays in
    // play as a bridge, and p3 walks the kept chain out through it.
    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.waitlisted, 1);
    expect_assignments(
        &ctx,
        &[
            (1, Assignment::Kidney(2)),
            (2, Assignment::Waitlist),
            (3, Assignment::Kidney(1)),
        ],
    );
}

#[test]
fn best_value_rule_scores_type_o_patients() {
    let ctx = setup();
    load_paper_pool(&ctx);

    let summary = ctx.client.run_allocation(&ChainRule::BestValue, &999, &999);
    assert_eq!(summary.rounds, 5);
    assert_eq!(summary.waitlisted, 1);

    // The winning round-three chain p8 -> k4 -> p4 -> k9 -> p9 -> w scores
    // 35 (three patients, one of them type O) and is kept; p8 later trades
    // out of it through its own kidney, p1 and p10 swap in round four.
    expect_assignments(
        &ctx,
        &[
            (1, Assignment::Kidney(10)),
            (2, Assignment::Kidney(11)),
            (3, Assignment::Kidney(2)),
            (4, Assignment::Kidney(9)),
            (5, Assignment::Kidney(7)),
            (6, Assignment::Kidney(5)),
            (7, Assignment::Kidney(6)),
            (8, Assignment::Kidney(8)),
            (9, Assignment::Waitlist),
            (10, Assignment::Kidney(1)),
            (11, Assignment::Kidney(3)),
            (12, Assignment::Kidney(12)),
        ],
    );
    assert_eq!(ctx.client.get_outcome(&8), Outcome::NoExchange);
}

#[test]
fn best_value_rule_rewards_high_pra_patients() {
    let ctx = setup();
    let env = &ctx.env;

    // Two two-patient chains of equal length; only the second holds a
    // highly sensitized patient, which is worth an extra ten points.
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 40, 0),
        &donor_input(env, BloodType::A, 40),
        &true,
    );
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 45, 0),
        &donor_input(env, BloodType::A, 45),
        &true,
    );
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 50, 85),
        &donor_input(env, BloodType::A, 50),
        &true,
    );
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 55, 0),
        &donor_input(env, BloodType::A, 55),
        &true,
    );
    ctx.client.set_preferences(&1, &prefs(env, &[], true));
    ctx.client.set_preferences(&2, &prefs(env, &[1], true));
    ctx.client.set_preferences(&3, &prefs(env, &[], true));
    ctx.client.set_preferences(&4, &prefs(env, &[3], true));

    let summary = ctx.client.run_allocation(&ChainRule::BestValue, &999, &999);
    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.transplants, 2);
    assert_eq!(summary.waitlisted, 2);

    expect_assignments(
        &ctx,
        &[
            (1, Assignment::Waitlist),
            (2, Assignment::Kidney(1)),
            (3, Assignment::Waitlist),
            (4, Assignment::Kidney(3)),
        ],
    );
}

#[test]
fn capped_best_value_reanchors_on_the_surviving_tail() {
    let ctx = setup();
    load_paper_pool(&ctx);

    // With chains capped at two patients the kept chain p1 -> k9 -> p9 is
    // repeatedly raided: a cycle captures p1 (superseding its tentative
    // k9), then p4 re-anchors on p9, loses p4 to another cycle, and p12
    // finally walks the tail out on the last transaction.
    let summary = ctx.client.run_allocation(&ChainRule::BestValue, &999, &2);
    assert_eq!(summary.rounds, 7);

    expect_assignments(
        &ctx,
        &[
            (1, Assignment::Kidney(10)),
            (2, Assignment::Kidney(11)),
            (3, Assignment::Kidney(2)),
            (4, Assignment::Kidney(8)),
            (5, Assignment::Kidney(7)),
            (6, Assignment::Kidney(5)),
            (7, Assignment::Kidney(6)),
            (8, Assignment::Kidney(4)),
            (9, Assignment::Waitlist),
            (10, Assignment::Kidney(1)),
            (11, Assignment::Kidney(3)),
            (12, Assignment::Kidney(9)),
        ],
    );
}
