use soroban_sdk::{Env, Map, Vec};

use crate::{
    AllocationSummary, ContractError, DataKey, DonorKidney, ExchangeConfig, GraphSnapshot,
    PatientProfile, SnapshotStage,
};

/// In-memory view of the pool, loaded once per operation. The id registries
/// are kept in ascending order so that every traversal is deterministic.
pub(crate) struct Pool {
    pub patients: Map<u32, PatientProfile>,
    pub kidneys: Map<u32, DonorKidney>,
    pub patient_ids: Vec<u32>,
    pub kidney_ids: Vec<u32>,
}

pub(crate) fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub(crate) fn get_config(env: &Env) -> Option<ExchangeConfig> {
    env.storage().instance().get(&DataKey::Config)
}

pub(crate) fn set_config(env: &Env, config: &ExchangeConfig) {
    env.storage().instance().set(&DataKey::Config, config);
}

pub(crate) fn next_id(env: &Env) -> u32 {
    env.storage().instance().get(&DataKey::NextId).unwrap_or(1)
}

pub(crate) fn set_next_id(env: &Env, id: u32) {
    env.storage().instance().set(&DataKey::NextId, &id);
}

pub(crate) fn allocate_id(env: &Env) -> u32 {
    let id = next_id(env);
    set_next_id(env, id + 1);
    id
}

pub(crate) fn patient_ids(env: &Env) -> Vec<u32> {
    env.storage()
        .instance()
        .get(&DataKey::PatientIds)
        .unwrap_or_else(|| Vec::new(env))
}

pub(crate) fn kidney_ids(env: &Env) -> Vec<u32> {
    env.storage()
        .instance()
        .get(&DataKey::KidneyIds)
        .unwrap_or_else(|| Vec::new(env))
}

pub(crate) fn get_patient(env: &Env, patient_id: u32) -> Option<PatientProfile> {
    env.storage().persistent().get(&DataKey::Patient(patient_id))
}

pub(crate) fn set_patient(env: &Env, patient: &PatientProfile) {
    env.storage()
        .persistent()
        .set(&DataKey::Patient(patient.patient_id), patient);
}

pub(crate) fn get_kidney(env: &Env, kidney_id: u32) -> Option<DonorKidney> {
    env.storage().persistent().get(&DataKey::Kidney(kidney_id))
}

pub(crate) fn set_kidney(env: &Env, kidney: &DonorKidney) {
    env.storage()
        .persistent()
        .set(&DataKey::Kidney(kidney.kidney_id), kidney);
}

/// Store a new patient and register its id in ascending order.
pub(crate) fn insert_patient(env: &Env, patient: &PatientProfile) {
    set_patient(env, patient);
    let ids = insert_sorted(patient_ids(env), patient.patient_id);
    env.storage().instance().set(&DataKey::PatientIds, &ids);
}

/// Store a new kidney and register its id in ascending order.
pub(crate) fn insert_kidney(env: &Env, kidney: &DonorKidney) {
    set_kidney(env, kidney);
    let ids = insert_sorted(kidney_ids(env), kidney.kidney_id);
    env.storage().instance().set(&DataKey::KidneyIds, &ids);
}

fn insert_sorted(mut ids: Vec<u32>, id: u32) -> Vec<u32> {
    let mut at = ids.len();
    for i in 0..ids.len() {
        if ids.get_unchecked(i) > id {
            at = i;
            break;
        }
    }
    ids.insert(at, id);
    ids
}

pub(crate) fn load_pool(env: &Env) -> Result<Pool, ContractError> {
    let patient_ids = patient_ids(env);
    if patient_ids.is_empty() {
        return Err(ContractError::PoolEmpty);
    }
    let kidney_ids = kidney_ids(env);

    let mut patients = Map::new(env);
    for id in patient_ids.iter() {
        patients.set(id, get_patient(env, id).unwrap());
    }
    let mut kidneys = Map::new(env);
    for id in kidney_ids.iter() {
        kidneys.set(id, get_kidney(env, id).unwrap());
    }

    Ok(Pool {
        patients,
        kidneys,
        patient_ids,
        kidney_ids,
    })
}

pub(crate) fn set_snapshot(env: &Env, stage: SnapshotStage, snapshot: &GraphSnapshot) {
    env.storage()
        .persistent()
        .set(&DataKey::Snapshot(stage), snapshot);
}

pub(crate) fn get_snapshot(env: &Env, stage: &SnapshotStage) -> Option<GraphSnapshot> {
    env.storage()
        .persistent()
        .get(&DataKey::Snapshot(stage.clone()))
}

pub(crate) fn clear_snapshots(env: &Env) {
    env.storage()
        .persistent()
        .remove(&DataKey::Snapshot(SnapshotStage::Initial));
    env.storage()
        .persistent()
        .remove(&DataKey::Snapshot(SnapshotStage::PostCycles));
    env.storage()
        .persistent()
        .remove(&DataKey::Snapshot(SnapshotStage::Final));
}

pub(crate) fn set_last_run(env: &Env, summary: &AllocationSummary) {
    env.storage().persistent().set(&DataKey::LastRun, summary);
}

pub(crate) fn get_last_run(env: &Env) -> Option<AllocationSummary> {
    env.storage().persistent().get(&DataKey::LastRun)
}

/// Drop every pair and every run artifact. Configuration survives.
pub(crate) fn clear_pool(env: &Env) {
    for id in patient_ids(env).iter() {
        env.storage().persistent().remove(&DataKey::Patient(id));
    }
    for id in kidney_ids(env).iter() {
        env.storage().persistent().remove(&DataKey::Kidney(id));
    }
    env.storage().instance().remove(&DataKey::PatientIds);
    env.storage().instance().remove(&DataKey::KidneyIds);
    env.storage().persistent().remove(&DataKey::LastRun);
    clear_snapshots(env);
}
