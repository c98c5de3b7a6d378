// protocol.rs - Pool admission rules
// Validates registrations and imported snapshots against the closed HLA
// antigen universe and the co-pair bijection every run depends on.

use soroban_sdk::{Env, String, Vec};

use crate::{ContractError, HLAProfile, PatientInput, PoolState};

pub(crate) const MAX_PRA: u32 = 100;

/// Serologically defined HLA-A antigens accepted by the protocol.
pub(crate) fn locus_a(env: &Env) -> Vec<String> {
    let mut v = Vec::new(env);
    for label in [
        "A1", "A2", "A3", "A11", "A23", "A24", "A26", "A29", "A30", "A31", "A32", "A68",
    ] {
        v.push_back(String::from_str(env, label));
    }
    v
}

pub(crate) fn locus_b(env: &Env) -> Vec<String> {
    let mut v = Vec::new(env);
    for label in [
        "B7", "B8", "B13", "B15", "B27", "B35", "B40", "B44", "B51", "B57", "B60", "B62",
    ] {
        v.push_back(String::from_str(env, label));
    }
    v
}

pub(crate) fn locus_dr(env: &Env) -> Vec<String> {
    let mut v = Vec::new(env);
    for label in [
        "DR1", "DR3", "DR4", "DR7", "DR11", "DR13", "DR15", "DR17", "DR51", "DR52",
    ] {
        v.push_back(String::from_str(env, label));
    }
    v
}

/// Check a label against the full universe, any locus.
pub(crate) fn antigen_known(env: &Env, label: &String) -> bool {
    locus_a(env).contains(label) || locus_b(env).contains(label) || locus_dr(env).contains(label)
}

/// Every listed antigen must belong to its locus. Empty loci are fine:
/// hand-entered pools may skip tissue typing entirely.
pub(crate) fn validate_hla_profile(env: &Env, profile: &HLAProfile) -> Result<(), ContractError> {
    let a = locus_a(env);
    for label in profile.hla_a.iter() {
        if !a.contains(&label) {
            return Err(ContractError::UnknownAntigen);
        }
    }
    let b = locus_b(env);
    for label in profile.hla_b.iter() {
        if !b.contains(&label) {
            return Err(ContractError::UnknownAntigen);
        }
    }
    let dr = locus_dr(env);
    for label in profile.hla_dr.iter() {
        if !dr.contains(&label) {
            return Err(ContractError::UnknownAntigen);
        }
    }
    Ok(())
}

pub(crate) fn validate_patient_input(
    env: &Env,
    patient: &PatientInput,
) -> Result<(), ContractError> {
    if patient.pra > MAX_PRA {
        return Err(ContractError::InvalidPra);
    }
    validate_hla_profile(env, &patient.hla_profile)?;
    for label in patient.unacceptable_antigens.iter() {
        if !antigen_known(env, &label) {
            return Err(ContractError::UnknownAntigen);
        }
    }
    Ok(())
}

/// An imported snapshot must describe a clean bijection: unique ids on both
/// sides, and mutual co-pair links between every patient and its donor
/// kidney. Runs rely on these links without re-checking them.
pub(crate) fn validate_pool_state(env: &Env, state: &PoolState) -> Result<(), ContractError> {
    let mut patient_ids: Vec<u32> = Vec::new(env);
    for p in state.patients.iter() {
        if patient_ids.contains(p.patient_id) {
            return Err(ContractError::DuplicateId);
        }
        patient_ids.push_back(p.patient_id);
    }
    let mut kidney_ids: Vec<u32> = Vec::new(env);
    for k in state.kidneys.iter() {
        if kidney_ids.contains(k.kidney_id) {
            return Err(ContractError::DuplicateId);
        }
        kidney_ids.push_back(k.kidney_id);
    }

    for p in state.patients.iter() {
        let mut linked = false;
        for k in state.kidneys.iter() {
            if k.kidney_id == p.donor_kidney_id {
                if k.donor_patient_id != p.patient_id {
                    return Err(ContractError::MissingCoPair);
                }
                linked = true;
                break;
            }
        }
        if !linked {
            return Err(ContractError::MissingCoPair);
        }
        if p.pra > MAX_PRA {
            return Err(ContractError::InvalidPra);
        }
        validate_hla_profile(env, &p.hla_profile)?;
        for label in p.unacceptable_antigens.iter() {
            if !antigen_known(env, &label) {
                return Err(ContractError::UnknownAntigen);
            }
        }
    }

    for k in state.kidneys.iter() {
        let mut linked = false;
        for p in state.patients.iter() {
            if p.patient_id == k.donor_patient_id {
                if p.donor_kidney_id != k.kidney_id {
                    return Err(ContractError::MissingCoPair);
                }
                linked = true;
                break;
            }
        }
        if !linked {
            return Err(ContractError::MissingCoPair);
        }
        validate_hla_profile(env, &k.hla_profile)?;
    }

    Ok(())
}
