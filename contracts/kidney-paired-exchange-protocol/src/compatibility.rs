// compatibility.rs - Medical screening and preference ranking
// Blood group rules, virtual crossmatch against unacceptable antigens, and
// a graft-survival penalty used to order every acceptable kidney.

use soroban_sdk::{Env, Vec};

use crate::storage::Pool;
use crate::{BloodType, DonorKidney, HLAProfile, PatientProfile, PreferenceTarget};

// Natural logs of the proportional-hazards coefficients, in micro-log
// units. The pair (1.06, 1.12) applies below patient age 60, (1.05, 1.10)
// from 60 up; the first of each pair weighs an HLA mismatch, the second a
// year of donor age.
const MISMATCH_WEIGHT_UNDER_60: u64 = 58_269; // ln 1.06
const AGE_WEIGHT_UNDER_60: u64 = 113_329; // ln 1.12
const MISMATCH_WEIGHT_60_PLUS: u64 = 48_790; // ln 1.05
const AGE_WEIGHT_60_PLUS: u64 = 95_310; // ln 1.10

/// ABO compatibility: O donates to all, AB receives from all, otherwise
/// the groups must match.
pub fn is_blood_compatible(kidney: &BloodType, patient: &BloodType) -> bool {
    match (kidney, patient) {
        (BloodType::O, _) => true,
        (_, BloodType::AB) => true,
        (k, p) => k == p,
    }
}

/// Virtual crossmatch: negative (acceptable) when no donor antigen, at any
/// locus, appears among the patient's unacceptable antigens.
pub fn is_crossmatch_negative(patient: &PatientProfile, kidney: &DonorKidney) -> bool {
    for locus in [
        &kidney.hla_profile.hla_a,
        &kidney.hla_profile.hla_b,
        &kidney.hla_profile.hla_dr,
    ] {
        for antigen in locus.iter() {
            if patient.unacceptable_antigens.contains(&antigen) {
                return false;
            }
        }
    }
    true
}

/// Count donor antigens absent from the patient's antigens at the same
/// locus, summed over A, B and DR.
pub fn hla_mismatch(patient: &HLAProfile, donor: &HLAProfile) -> u32 {
    let mut mismatches = 0u32;
    for (donor_locus, patient_locus) in [
        (&donor.hla_a, &patient.hla_a),
        (&donor.hla_b, &patient.hla_b),
        (&donor.hla_dr, &patient.hla_dr),
    ] {
        for antigen in donor_locus.iter() {
            if !patient_locus.contains(&antigen) {
                mismatches += 1;
            }
        }
    }
    mismatches
}

/// Survival penalty in micro-log units; lower is better. Carries the
/// real-valued preference ln(a)·mismatches + ln(b)·donor_age/10 in fixed
/// point, with the decade divisor folded into the mismatch term.
pub fn survival_penalty(patient_age: u32, mismatches: u32, donor_age: u32) -> u64 {
    let (mismatch_weight, age_weight) = if patient_age < 60 {
        (MISMATCH_WEIGHT_UNDER_60, AGE_WEIGHT_UNDER_60)
    } else {
        (MISMATCH_WEIGHT_60_PLUS, AGE_WEIGHT_60_PLUS)
    };
    10 * mismatch_weight * mismatches as u64 + age_weight * donor_age as u64
}

/// Rank every kidney that clears the blood rule and the crossmatch,
/// best survival penalty first, ties to the lower kidney id. Appends the
/// waitlist when the patient is willing to take a deceased-donor offer.
pub(crate) fn build_preferences(
    env: &Env,
    pool: &Pool,
    patient: &PatientProfile,
) -> Vec<PreferenceTarget> {
    let mut candidates: Vec<(u64, u32)> = Vec::new(env);
    for kidney_id in pool.kidney_ids.iter() {
        let kidney = pool.kidneys.get(kidney_id).unwrap();
        if !is_blood_compatible(&kidney.blood_type, &patient.blood_type) {
            continue;
        }
        if !is_crossmatch_negative(patient, &kidney) {
            continue;
        }
        let mismatches = hla_mismatch(&patient.hla_profile, &kidney.hla_profile);
        let penalty = survival_penalty(patient.age, mismatches, kidney.age);
        candidates.push_back((penalty, kidney_id));
    }

    sort_candidates(&mut candidates);

    let mut preferences = Vec::new(env);
    for (_, kidney_id) in candidates.iter() {
        preferences.push_back(PreferenceTarget::Kidney(kidney_id));
    }
    if patient.wants_waitlist {
        preferences.push_back(PreferenceTarget::Waitlist);
    }
    preferences
}

// Bubble sort on (penalty, kidney id); pools stay small enough that this
// beats pulling in anything fancier.
fn sort_candidates(candidates: &mut Vec<(u64, u32)>) {
    let len = candidates.len();
    if len <= 1 {
        return;
    }
    for i in 0..len {
        for j in 0..(len - i - 1) {
            let current = candidates.get_unchecked(j);
            let next = candidates.get_unchecked(j + 1);
            if current.0 > next.0 || (current.0 == next.0 && current.1 > next.1) {
                candidates.set(j, next);
                candidates.set(j + 1, current);
            }
        }
    }
}
