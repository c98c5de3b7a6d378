// selection.rs - Chain selection rules
// Seven policies for picking one w-chain out of the round's candidates,
// each paired with a retention behavior applied by the round executor.

use soroban_sdk::{Env, Vec};

use crate::graph::{patient_len, patients_of};
use crate::storage::Pool;
use crate::{BloodType, ChainRule, Node};

const LENGTH_SCORE: u32 = 10;
const TYPE_O_SCORE: u32 = 5;
const HIGH_PRA_SCORE: u32 = 10;
const HIGH_PRA_THRESHOLD: u32 = 80;

/// Apply a selection rule to the candidate chains. Chains longer than
/// `max_chain_len` patients are never considered. Returns `None` when the
/// filter leaves nothing, or when a priority rule finds no chain touching
/// any priority patient.
pub(crate) fn select_chain(
    env: &Env,
    pool: &Pool,
    chains: &Vec<Vec<Node>>,
    rule: ChainRule,
    priority: &Vec<u32>,
    max_chain_len: u32,
) -> Option<Vec<Node>> {
    let mut filtered: Vec<Vec<Node>> = Vec::new(env);
    for chain in chains.iter() {
        if patient_len(&chain) <= max_chain_len {
            filtered.push_back(chain);
        }
    }
    if filtered.is_empty() {
        return None;
    }

    if rule == ChainRule::BestValue {
        return best_value(env, pool, &filtered);
    }

    sort_chains(&mut filtered);

    match rule {
        ChainRule::MinimumLength => {
            let mut shortest = u32::MAX;
            for chain in filtered.iter() {
                let len = patient_len(&chain);
                if len < shortest {
                    shortest = len;
                }
            }
            for chain in filtered.iter() {
                if patient_len(&chain) == shortest {
                    return Some(chain);
                }
            }
            None
        }
        ChainRule::MaximumLength | ChainRule::MaximumLengthKeep => filtered.get(0),
        ChainRule::Priority | ChainRule::PriorityKeep | ChainRule::HybridODonor => {
            for patient_id in priority.iter() {
                for chain in filtered.iter() {
                    if patients_of(env, &chain).contains(patient_id) {
                        return Some(chain);
                    }
                }
            }
            None
        }
        ChainRule::BestValue => None,
    }
}

/// Whether a rule retains the selected chain's participants as active
/// bridge donors. Rule f decides per chain: an O-type donor at the head is
/// too valuable to park, so the chain is finalized and the donor freed for
/// the waitlist.
pub(crate) fn retains_chain(pool: &Pool, rule: &ChainRule, chain: &Vec<Node>) -> bool {
    match rule {
        ChainRule::MaximumLengthKeep | ChainRule::PriorityKeep | ChainRule::BestValue => true,
        ChainRule::HybridODonor => {
            let head = head_patient(chain);
            let patient = pool.patients.get(head).unwrap();
            let donor = pool.kidneys.get(patient.donor_kidney_id).unwrap();
            donor.blood_type != BloodType::O
        }
        _ => false,
    }
}

pub(crate) fn head_patient(chain: &Vec<Node>) -> u32 {
    match chain.get(0) {
        Some(Node::Patient(patient_id)) => patient_id,
        _ => panic!("chain does not start with a patient"),
    }
}

// Score: 10 per patient, +5 per type-O patient, +10 per patient with PRA of
// 80 or more. First maximum in discovery order wins.
fn best_value(_env: &Env, pool: &Pool, chains: &Vec<Vec<Node>>) -> Option<Vec<Node>> {
    let mut best: Option<Vec<Node>> = None;
    let mut best_score = 0u32;
    for chain in chains.iter() {
        let mut score = patient_len(&chain) * LENGTH_SCORE;
        for node in chain.iter() {
            if let Node::Patient(patient_id) = node {
                let patient = pool.patients.get(patient_id).unwrap();
                if patient.blood_type == BloodType::O {
                    score += TYPE_O_SCORE;
                }
                if patient.pra >= HIGH_PRA_THRESHOLD {
                    score += HIGH_PRA_SCORE;
                }
            }
        }
        if best.is_none() || score > best_score {
            best = Some(chain.clone());
            best_score = score;
        }
    }
    best
}

// Longest chain first; equal lengths order by the head patient's id as it
// renders off-chain ("p10" sorts before "p2").
fn sort_chains(chains: &mut Vec<Vec<Node>>) {
    let len = chains.len();
    if len <= 1 {
        return;
    }
    for i in 0..len {
        for j in 0..(len - i - 1) {
            let current = chains.get_unchecked(j);
            let next = chains.get_unchecked(j + 1);
            let current_len = patient_len(&current);
            let next_len = patient_len(&next);
            let swap = if current_len != next_len {
                current_len < next_len
            } else {
                decimal_lex_less(head_patient(&next), head_patient(&current))
            };
            if swap {
                chains.set(j, next);
                chains.set(j + 1, current);
            }
        }
    }
}

// Compare two ids by the lexicographic order of their decimal digits.
fn decimal_lex_less(a: u32, b: u32) -> bool {
    if a == b {
        return false;
    }
    let (da, la) = digits(a);
    let (db, lb) = digits(b);
    let shared = if la < lb { la } else { lb };
    for i in 0..shared {
        if da[i] != db[i] {
            return da[i] < db[i];
        }
    }
    la < lb
}

fn digits(mut value: u32) -> ([u8; 10], usize) {
    let mut reversed = [0u8; 10];
    let mut len = 0;
    loop {
        reversed[len] = (value % 10) as u8;
        value /= 10;
        len += 1;
        if value == 0 {
            break;
        }
    }
    let mut ordered = [0u8; 10];
    for i in 0..len {
        ordered[i] = reversed[len - 1 - i];
    }
    (ordered, len)
}
