use soroban_sdk::{testutils::Address as _, Address, Env, Vec};

use super::fixture::{donor_input, patient_input, prefs, setup, strings};
use crate::{
    Assignment, BloodType, KidneyPairedExchangeContract, KidneyPairedExchangeContractClient,
    PatientInput,
};

#[test]
fn initialize_only_once() {
    let ctx = setup();
    let result = ctx.client.try_initialize(&ctx.admin, &64);
    assert!(result.is_err());
}

#[test]
fn uninitialized_contract_rejects_registration() {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(KidneyPairedExchangeContract, ());
    let client = KidneyPairedExchangeContractClient::new(&env, &contract_id);

    let result = client.try_add_pair(
        &patient_input(&env, BloodType::A, 40, 0),
        &donor_input(&env, BloodType::B, 40),
        &false,
    );
    assert!(result.is_err());
}

#[test]
fn add_pair_allocates_shared_indices() {
    let ctx = setup();
    let env = &ctx.env;

    let first = ctx.client.add_pair(
        &patient_input(env, BloodType::A, 45, 10),
        &donor_input(env, BloodType::B, 50),
        &true,
    );
    let second = ctx.client.add_pair(
        &patient_input(env, BloodType::O, 30, 0),
        &donor_input(env, BloodType::O, 28),
        &false,
    );
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(ctx.client.pair_count(), 2);

    let patient = ctx.client.get_patient(&1).unwrap();
    assert_eq!(patient.patient_id, 1);
    assert_eq!(patient.blood_type, BloodType::A);
    assert_eq!(patient.donor_kidney_id, 1);
    assert_eq!(patient.wants_waitlist, true);
    assert_eq!(patient.assignment, Assignment::Unset);
    assert!(patient.preferences.is_empty());

    let kidney = ctx.client.get_kidney(&1).unwrap();
    assert_eq!(kidney.kidney_id, 1);
    assert_eq!(kidney.blood_type, BloodType::B);
    assert_eq!(kidney.donor_patient_id, 1);
}

#[test]
fn pra_above_100_is_rejected() {
    let ctx = setup();
    let result = ctx.client.try_add_pair(
        &patient_input(&ctx.env, BloodType::A, 40, 101),
        &donor_input(&ctx.env, BloodType::B, 40),
        &false,
    );
    assert!(result.is_err());
}

#[test]
fn unknown_antigen_is_rejected() {
    let ctx = setup();
    let env = &ctx.env;

    let mut patient = patient_input(env, BloodType::A, 40, 0);
    patient.unacceptable_antigens = strings(env, &["B99"]);
    let result = ctx
        .client
        .try_add_pair(&patient, &donor_input(env, BloodType::B, 40), &false);
    assert!(result.is_err());
}

#[test]
fn antigen_in_wrong_locus_is_rejected() {
    let ctx = setup();
    let env = &ctx.env;

    // DR15 is a real label, but not an HLA-A antigen.
    let patient = PatientInput {
        blood_type: BloodType::A,
        age: 40,
        hla_profile: crate::HLAProfile {
            hla_a: strings(env, &["DR15"]),
            hla_b: Vec::new(env),
            hla_dr: Vec::new(env),
        },
        pra: 0,
        unacceptable_antigens: Vec::new(env),
    };
    let result = ctx
        .client
        .try_add_pair(&patient, &donor_input(env, BloodType::B, 40), &false);
    assert!(result.is_err());
}

#[test]
fn capacity_is_enforced() {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(KidneyPairedExchangeContract, ());
    let client = KidneyPairedExchangeContractClient::new(&env, &contract_id);
    let admin = Address::generate(&env);
    client.initialize(&admin, &2);

    for _ in 0..2 {
        client.add_pair(
            &patient_input(&env, BloodType::A, 40, 0),
            &donor_input(&env, BloodType::B, 40),
            &false,
        );
    }
    let result = client.try_add_pair(
        &patient_input(&env, BloodType::A, 40, 0),
        &donor_input(&env, BloodType::B, 40),
        &false,
    );
    assert!(result.is_err());
}

#[test]
fn preferences_must_reference_registered_kidneys() {
    let ctx = setup();
    let env = &ctx.env;
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 40, 0),
        &donor_input(env, BloodType::B, 40),
        &false,
    );

    let result = ctx.client.try_set_preferences(&1, &prefs(env, &[7], false));
    assert!(result.is_err());

    ctx.client.set_preferences(&1, &prefs(env, &[1], true));
    let patient = ctx.client.get_patient(&1).unwrap();
    assert_eq!(patient.preferences.len(), 2);
}

#[test]
fn duplicate_preference_entries_are_accepted() {
    let ctx = setup();
    let env = &ctx.env;
    for _ in 0..2 {
        ctx.client.add_pair(
            &patient_input(env, BloodType::A, 40, 0),
            &donor_input(env, BloodType::B, 40),
            &false,
        );
    }

    ctx.client.set_preferences(&1, &prefs(env, &[2, 1, 2], false));
    let patient = ctx.client.get_patient(&1).unwrap();
    assert_eq!(patient.preferences.len(), 3);
}

#[test]
fn reset_clears_the_pool() {
    let ctx = setup();
    let env = &ctx.env;
    ctx.client.add_pair(
        &patient_input(env, BloodType::A, 40, 0),
        &donor_input(env, BloodType::B, 40),
        &false,
    );
    assert_eq!(ctx.client.pair_count(), 1);

    ctx.client.reset();
    assert_eq!(ctx.client.pair_count(), 0);
    assert!(ctx.client.get_patient(&1).is_none());
    assert!(ctx.client.get_kidney(&1).is_none());

    // Ids restart from one on a fresh pool.
    let id = ctx.client.add_pair(
        &patient_input(env, BloodType::O, 35, 0),
        &donor_input(env, BloodType::A, 35),
        &false,
    );
    assert_eq!(id, 1);
}
