#![no_std]
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env, Map, String, Vec};

mod compatibility;
mod engine;
mod error;
mod events;
mod graph;
mod protocol;
mod selection;
mod storage;

#[cfg(test)]
mod tests;

pub use compatibility::{hla_mismatch, is_blood_compatible, is_crossmatch_negative, survival_penalty};
pub use error::ContractError;
pub use events::*;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    NextId,
    PatientIds,
    KidneyIds,
    Patient(u32),
    Kidney(u32),
    Snapshot(SnapshotStage),
    LastRun,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExchangeConfig {
    pub admin: Address,
    pub max_pairs: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BloodType {
    A,
    B,
    AB,
    O,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HLAProfile {
    pub hla_a: Vec<String>,
    pub hla_b: Vec<String>,
    pub hla_dr: Vec<String>,
}

/// One ranked entry in a patient's preference list.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PreferenceTarget {
    Kidney(u32),
    Waitlist,
}

/// Where a patient ends up. `Unset` only exists while a run is in flight;
/// after finalization every patient holds one of the other three.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Assignment {
    Unset,
    Kidney(u32),
    Waitlist,
    NoExchange,
}

/// Outcome category derived from an assignment at the reporting boundary.
/// An assignment equal to the patient's own paired kidney reads as
/// `NoExchange` even when a trading cycle produced it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Pending,
    Transplanted(u32),
    Waitlisted,
    NoExchange,
}

/// A node of the pointer graph: patients and kidneys alternate, with the
/// deceased-donor waitlist as the single terminal source.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Patient(u32),
    Kidney(u32),
    Waitlist,
}

/// Chain selection rules a-g from the TTCC literature.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChainRule {
    /// (a) shortest chain, participants removed
    MinimumLength,
    /// (b) longest chain, participants removed
    MaximumLength,
    /// (c) longest chain, participants kept active
    MaximumLengthKeep,
    /// (d) first chain holding the highest-priority patient, removed
    Priority,
    /// (e) as (d) but kept active
    PriorityKeep,
    /// (f) as (d); removed only when the head's paired donor is type O
    HybridODonor,
    /// (g) highest-scoring chain (length, type-O and high-PRA patients), kept
    BestValue,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SnapshotStage {
    Initial,
    PostCycles,
    Final,
}

/// Pointer map and active set captured for off-chain graph rendering.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GraphSnapshot {
    pub pointers: Map<Node, Node>,
    pub active: Vec<u32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllocationSummary {
    pub rule: ChainRule,
    pub rounds: u32,
    pub transplants: u32,
    pub waitlisted: u32,
    pub no_exchange: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PatientProfile {
    pub patient_id: u32,
    pub blood_type: BloodType,
    pub age: u32,
    pub hla_profile: HLAProfile,
    pub donor_kidney_id: u32,
    pub pra: u32,
    pub unacceptable_antigens: Vec<String>,
    pub wants_waitlist: bool,
    pub preferences: Vec<PreferenceTarget>,
    pub assignment: Assignment,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonorKidney {
    pub kidney_id: u32,
    pub blood_type: BloodType,
    pub age: u32,
    pub hla_profile: HLAProfile,
    pub donor_patient_id: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PatientInput {
    pub blood_type: BloodType,
    pub age: u32,
    pub hla_profile: HLAProfile,
    pub pra: u32,
    pub unacceptable_antigens: Vec<String>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DonorInput {
    pub blood_type: BloodType,
    pub age: u32,
    pub hla_profile: HLAProfile,
}

/// Serializable pool snapshot for the host-side persistence layer. Hosts
/// render this as JSON off-chain; preferences are regenerated after import.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PatientState {
    pub patient_id: u32,
    pub blood_type: BloodType,
    pub age: u32,
    pub hla_profile: HLAProfile,
    pub donor_kidney_id: u32,
    pub pra: u32,
    pub unacceptable_antigens: Vec<String>,
    pub wants_waitlist: bool,
    pub assignment: Assignment,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KidneyState {
    pub kidney_id: u32,
    pub blood_type: BloodType,
    pub age: u32,
    pub hla_profile: HLAProfile,
    pub donor_patient_id: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolState {
    pub patients: Vec<PatientState>,
    pub kidneys: Vec<KidneyState>,
    pub next_id: u32,
}

const UNBOUNDED: u32 = 999;

#[contract]
pub struct KidneyPairedExchangeContract;

#[contractimpl]
impl KidneyPairedExchangeContract {
    /// Initialize the exchange with an administrator and a pool capacity
    pub fn initialize(env: Env, admin: Address, max_pairs: u32) -> Result<(), ContractError> {
        admin.require_auth();

        if storage::has_config(&env) {
            return Err(ContractError::AlreadyInitialized);
        }

        let config = ExchangeConfig {
            admin: admin.clone(),
            max_pairs,
        };
        storage::set_config(&env, &config);
        storage::set_next_id(&env, 1);

        Ok(())
    }

    /// Register an incompatible patient-donor pair; both sides share one
    /// fresh pair index. Returns the new patient id.
    pub fn add_pair(
        env: Env,
        patient: PatientInput,
        donor: DonorInput,
        wants_waitlist: bool,
    ) -> Result<u32, ContractError> {
        let config = storage::get_config(&env).ok_or(ContractError::NotInitialized)?;
        config.admin.require_auth();

        if storage::patient_ids(&env).len() >= config.max_pairs {
            return Err(ContractError::MaxCapacityReached);
        }

        protocol::validate_patient_input(&env, &patient)?;
        protocol::validate_hla_profile(&env, &donor.hla_profile)?;

        let id = storage::allocate_id(&env);
        let profile = PatientProfile {
            patient_id: id,
            blood_type: patient.blood_type.clone(),
            age: patient.age,
            hla_profile: patient.hla_profile,
            donor_kidney_id: id,
            pra: patient.pra,
            unacceptable_antigens: patient.unacceptable_antigens,
            wants_waitlist,
            preferences: Vec::new(&env),
            assignment: Assignment::Unset,
        };
        let kidney = DonorKidney {
            kidney_id: id,
            blood_type: donor.blood_type.clone(),
            age: donor.age,
            hla_profile: donor.hla_profile,
            donor_patient_id: id,
        };

        storage::insert_patient(&env, &profile);
        storage::insert_kidney(&env, &kidney);
        events::emit_pair_registered(&env, id, patient.blood_type, donor.blood_type, wants_waitlist);

        Ok(id)
    }

    /// Install a hand-ranked preference list, bypassing compatibility
    /// screening. Duplicate entries are accepted; the first occurrence
    /// decides where the patient points.
    pub fn set_preferences(
        env: Env,
        patient_id: u32,
        preferences: Vec<PreferenceTarget>,
    ) -> Result<(), ContractError> {
        let config = storage::get_config(&env).ok_or(ContractError::NotInitialized)?;
        config.admin.require_auth();

        let mut patient =
            storage::get_patient(&env, patient_id).ok_or(ContractError::PatientNotFound)?;
        for target in preferences.iter() {
            if let PreferenceTarget::Kidney(kidney_id) = target {
                if storage::get_kidney(&env, kidney_id).is_none() {
                    return Err(ContractError::InvalidPreference);
                }
            }
        }
        patient.preferences = preferences;
        storage::set_patient(&env, &patient);

        Ok(())
    }

    /// Rank every available kidney for every patient by blood compatibility,
    /// virtual crossmatch and survival penalty
    pub fn generate_preferences(env: Env) -> Result<(), ContractError> {
        let config = storage::get_config(&env).ok_or(ContractError::NotInitialized)?;
        config.admin.require_auth();

        let pool = storage::load_pool(&env)?;
        for patient_id in pool.patient_ids.iter() {
            let mut patient = pool.patients.get(patient_id).unwrap();
            patient.preferences = compatibility::build_preferences(&env, &pool, &patient);
            storage::set_patient(&env, &patient);
        }
        events::emit_preferences_generated(&env, pool.patient_ids.len());

        Ok(())
    }

    /// Run the Top Trading Cycles and Chains allocation over the current
    /// pool. Reruns start from a clean slate, so an unchanged pool always
    /// produces the same assignments.
    pub fn run_allocation(
        env: Env,
        rule: ChainRule,
        max_cycle_len: u32,
        max_chain_len: u32,
    ) -> Result<AllocationSummary, ContractError> {
        let config = storage::get_config(&env).ok_or(ContractError::NotInitialized)?;
        config.admin.require_auth();

        let pool = storage::load_pool(&env)?;
        storage::clear_snapshots(&env);

        let outcome = engine::run(&env, &pool, rule.clone(), max_cycle_len, max_chain_len);

        let mut transplants = 0u32;
        let mut waitlisted = 0u32;
        let mut no_exchange = 0u32;
        for patient_id in pool.patient_ids.iter() {
            let mut patient = pool.patients.get(patient_id).unwrap();
            let assignment = outcome.assignments.get(patient_id).unwrap();
            match assignment {
                Assignment::Kidney(kidney_id) if kidney_id == patient.donor_kidney_id => {
                    no_exchange += 1
                }
                Assignment::Kidney(_) => transplants += 1,
                Assignment::Waitlist => waitlisted += 1,
                Assignment::NoExchange => no_exchange += 1,
                Assignment::Unset => panic!("patient left unassigned after finalization"),
            }
            patient.assignment = assignment;
            storage::set_patient(&env, &patient);
        }

        let summary = AllocationSummary {
            rule,
            rounds: outcome.rounds,
            transplants,
            waitlisted,
            no_exchange,
        };
        storage::set_last_run(&env, &summary);
        events::emit_allocation_completed(&env, &summary);

        Ok(summary)
    }

    /// Run with the defaults: longest-chain-keep and effectively unbounded
    /// cycle and chain lengths
    pub fn run_allocation_default(env: Env) -> Result<AllocationSummary, ContractError> {
        Self::run_allocation(env, ChainRule::MaximumLengthKeep, UNBOUNDED, UNBOUNDED)
    }

    /// Get a patient profile
    pub fn get_patient(env: Env, patient_id: u32) -> Option<PatientProfile> {
        storage::get_patient(&env, patient_id)
    }

    /// Get a donor kidney
    pub fn get_kidney(env: Env, kidney_id: u32) -> Option<DonorKidney> {
        storage::get_kidney(&env, kidney_id)
    }

    /// Get a patient's raw assignment
    pub fn get_assignment(env: Env, patient_id: u32) -> Result<Assignment, ContractError> {
        let patient =
            storage::get_patient(&env, patient_id).ok_or(ContractError::PatientNotFound)?;
        Ok(patient.assignment)
    }

    /// Get a patient's outcome category
    pub fn get_outcome(env: Env, patient_id: u32) -> Result<Outcome, ContractError> {
        let patient =
            storage::get_patient(&env, patient_id).ok_or(ContractError::PatientNotFound)?;
        let outcome = match patient.assignment {
            Assignment::Unset => Outcome::Pending,
            Assignment::Waitlist => Outcome::Waitlisted,
            Assignment::NoExchange => Outcome::NoExchange,
            Assignment::Kidney(kidney_id) if kidney_id == patient.donor_kidney_id => {
                Outcome::NoExchange
            }
            Assignment::Kidney(kidney_id) => Outcome::Transplanted(kidney_id),
        };
        Ok(outcome)
    }

    /// Complete assignment map for the display layer
    pub fn list_assignments(env: Env) -> Map<u32, Assignment> {
        let mut assignments = Map::new(&env);
        for patient_id in storage::patient_ids(&env).iter() {
            if let Some(patient) = storage::get_patient(&env, patient_id) {
                assignments.set(patient_id, patient.assignment);
            }
        }
        assignments
    }

    /// Number of registered pairs
    pub fn pair_count(env: Env) -> u32 {
        storage::patient_ids(&env).len()
    }

    /// Summary of the most recent allocation run
    pub fn get_last_run(env: Env) -> Option<AllocationSummary> {
        storage::get_last_run(&env)
    }

    /// Pointer-graph snapshot captured at the given stage of the last run
    pub fn get_graph_snapshot(env: Env, stage: SnapshotStage) -> Option<GraphSnapshot> {
        storage::get_snapshot(&env, &stage)
    }

    /// Export the pool for host-side persistence
    pub fn export_state(env: Env) -> Result<PoolState, ContractError> {
        if !storage::has_config(&env) {
            return Err(ContractError::NotInitialized);
        }

        let mut patients = Vec::new(&env);
        for patient_id in storage::patient_ids(&env).iter() {
            let p = storage::get_patient(&env, patient_id).unwrap();
            patients.push_back(PatientState {
                patient_id: p.patient_id,
                blood_type: p.blood_type,
                age: p.age,
                hla_profile: p.hla_profile,
                donor_kidney_id: p.donor_kidney_id,
                pra: p.pra,
                unacceptable_antigens: p.unacceptable_antigens,
                wants_waitlist: p.wants_waitlist,
                assignment: p.assignment,
            });
        }
        let mut kidneys = Vec::new(&env);
        for kidney_id in storage::kidney_ids(&env).iter() {
            let k = storage::get_kidney(&env, kidney_id).unwrap();
            kidneys.push_back(KidneyState {
                kidney_id: k.kidney_id,
                blood_type: k.blood_type,
                age: k.age,
                hla_profile: k.hla_profile,
                donor_patient_id: k.donor_patient_id,
            });
        }

        Ok(PoolState {
            patients,
            kidneys,
            next_id: storage::next_id(&env),
        })
    }

    /// Replace the pool with an imported snapshot. The snapshot is validated
    /// before the current pool is dropped; assignments and preferences are
    /// cleared, matching a freshly entered pool.
    pub fn import_state(env: Env, state: PoolState) -> Result<(), ContractError> {
        let config = storage::get_config(&env).ok_or(ContractError::NotInitialized)?;
        config.admin.require_auth();

        protocol::validate_pool_state(&env, &state)?;

        storage::clear_pool(&env);
        let mut max_id = 0u32;
        for p in state.patients.iter() {
            let profile = PatientProfile {
                patient_id: p.patient_id,
                blood_type: p.blood_type.clone(),
                age: p.age,
                hla_profile: p.hla_profile.clone(),
                donor_kidney_id: p.donor_kidney_id,
                pra: p.pra,
                unacceptable_antigens: p.unacceptable_antigens.clone(),
                wants_waitlist: p.wants_waitlist,
                preferences: Vec::new(&env),
                assignment: Assignment::Unset,
            };
            storage::insert_patient(&env, &profile);
            if p.patient_id > max_id {
                max_id = p.patient_id;
            }
        }
        for k in state.kidneys.iter() {
            let kidney = DonorKidney {
                kidney_id: k.kidney_id,
                blood_type: k.blood_type.clone(),
                age: k.age,
                hla_profile: k.hla_profile.clone(),
                donor_patient_id: k.donor_patient_id,
            };
            storage::insert_kidney(&env, &kidney);
            if k.kidney_id > max_id {
                max_id = k.kidney_id;
            }
        }

        let next_id = if state.next_id > max_id {
            state.next_id
        } else {
            max_id + 1
        };
        storage::set_next_id(&env, next_id);
        events::emit_state_imported(&env, state.patients.len());

        Ok(())
    }

    /// Clear the pool and every run artifact
    pub fn reset(env: Env) -> Result<(), ContractError> {
        let config = storage::get_config(&env).ok_or(ContractError::NotInitialized)?;
        config.admin.require_auth();

        storage::clear_pool(&env);
        storage::set_next_id(&env, 1);
        events::emit_pool_reset(&env);

        Ok(())
    }
}
