use soroban_sdk::{contracttype, Env, Vec};

use crate::{AllocationSummary, BloodType, ChainRule};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairRegisteredEvent {
    pub patient_id: u32,
    pub patient_blood_type: BloodType,
    pub donor_blood_type: BloodType,
    pub wants_waitlist: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreferencesGeneratedEvent {
    pub pair_count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleExecutedEvent {
    pub round: u32,
    pub patients: Vec<u32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainProcessedEvent {
    pub round: u32,
    pub head: u32,
    pub patients: Vec<u32>,
    pub retained: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationCompletedEvent {
    pub rule: ChainRule,
    pub rounds: u32,
    pub transplants: u32,
    pub waitlisted: u32,
    pub no_exchange: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StateImportedEvent {
    pub pair_count: u32,
}

pub fn emit_pair_registered(
    env: &Env,
    patient_id: u32,
    patient_blood_type: BloodType,
    donor_blood_type: BloodType,
    wants_waitlist: bool,
) {
    let event = PairRegisteredEvent {
        patient_id,
        patient_blood_type,
        donor_blood_type,
        wants_waitlist,
    };
    env.events().publish(("pair_registered",), event);
}

pub fn emit_preferences_generated(env: &Env, pair_count: u32) {
    let event = PreferencesGeneratedEvent { pair_count };
    env.events().publish(("preferences_generated",), event);
}

pub fn emit_cycle_executed(env: &Env, round: u32, patients: Vec<u32>) {
    let event = CycleExecutedEvent { round, patients };
    env.events().publish(("cycle_executed",), event);
}

pub fn emit_chain_processed(env: &Env, round: u32, head: u32, patients: Vec<u32>, retained: bool) {
    let event = ChainProcessedEvent {
        round,
        head,
        patients,
        retained,
    };
    env.events().publish(("chain_processed",), event);
}

pub fn emit_allocation_completed(env: &Env, summary: &AllocationSummary) {
    let event = AllocationCompletedEvent {
        rule: summary.rule.clone(),
        rounds: summary.rounds,
        transplants: summary.transplants,
        waitlisted: summary.waitlisted,
        no_exchange: summary.no_exchange,
    };
    env.events().publish(("allocation_completed",), event);
}

pub fn emit_state_imported(env: &Env, pair_count: u32) {
    let event = StateImportedEvent { pair_count };
    env.events().publish(("state_imported",), event);
}

pub fn emit_pool_reset(env: &Env) {
    env.events().publish(("pool_reset",), ());
}
