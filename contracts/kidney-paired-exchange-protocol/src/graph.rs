// graph.rs - Pointer graph construction and traversal
// The round state machine sees the pool as a one-hop pointer map: every
// active patient points at its best still-available option, every available
// kidney points back at its paired patient.

use soroban_sdk::{Env, Map, Vec};

use crate::storage::Pool;
use crate::{Node, PreferenceTarget};

/// Build the pointer map for one round. A patient with no surviving
/// preference gets no outbound edge and can only be pulled in by others.
pub(crate) fn build_pointers(
    env: &Env,
    pool: &Pool,
    active_patients: &Vec<u32>,
    available_kidneys: &Vec<u32>,
) -> Map<Node, Node> {
    let mut pointers = Map::new(env);

    for patient_id in active_patients.iter() {
        let patient = pool.patients.get(patient_id).unwrap();
        for target in patient.preferences.iter() {
            match target {
                PreferenceTarget::Kidney(kidney_id) => {
                    if available_kidneys.contains(kidney_id) {
                        pointers.set(Node::Patient(patient_id), Node::Kidney(kidney_id));
                        break;
                    }
                }
                PreferenceTarget::Waitlist => {
                    pointers.set(Node::Patient(patient_id), Node::Waitlist);
                    break;
                }
            }
        }
    }

    for kidney_id in available_kidneys.iter() {
        let kidney = pool.kidneys.get(kidney_id).unwrap();
        pointers.set(Node::Kidney(kidney_id), Node::Patient(kidney.donor_patient_id));
    }

    pointers
}

/// Walk the pointer map from every start patient, in ascending id order,
/// and classify what each walk runs into: the waitlist (a w-chain), a
/// kept-chain tail (a w-chain to be unraveled by the caller), a node
/// already on the path (a cycle), or a dead end (dropped).
///
/// Cycles are deduplicated greedily in discovery order; a cycle sharing any
/// node with an already accepted one is rejected, so the returned cycles
/// are node-disjoint.
pub(crate) fn find_cycles_and_chains(
    env: &Env,
    pointers: &Map<Node, Node>,
    start_patients: &Vec<u32>,
    kept_tails: &Vec<u32>,
) -> (Vec<Vec<Node>>, Vec<Vec<Node>>) {
    let mut raw_cycles: Vec<Vec<Node>> = Vec::new(env);
    let mut chains: Vec<Vec<Node>> = Vec::new(env);
    let mut visited: Vec<Node> = Vec::new(env);

    for patient_id in start_patients.iter() {
        let start = Node::Patient(patient_id);
        if visited.contains(&start) {
            continue;
        }

        let mut path: Vec<Node> = Vec::new(env);
        let mut curr = start;
        loop {
            if path.contains(&curr) || is_kept_tail(&curr, kept_tails) {
                break;
            }
            match pointers.get(curr.clone()) {
                Some(next) => {
                    path.push_back(curr);
                    curr = next;
                }
                None => break,
            }
        }

        if curr == Node::Waitlist {
            let mut chain = path.clone();
            chain.push_back(Node::Waitlist);
            chains.push_back(chain);
        } else if is_kept_tail(&curr, kept_tails) {
            let mut chain = path.clone();
            chain.push_back(curr);
            chains.push_back(chain);
        } else if let Some(at) = path.first_index_of(&curr) {
            raw_cycles.push_back(path.slice(at..));
        }

        for node in path.iter() {
            visited.push_back(node);
        }
    }

    let mut cycles: Vec<Vec<Node>> = Vec::new(env);
    let mut claimed: Vec<Node> = Vec::new(env);
    for cycle in raw_cycles.iter() {
        let mut overlaps = false;
        for node in cycle.iter() {
            if claimed.contains(&node) {
                overlaps = true;
                break;
            }
        }
        if !overlaps {
            for node in cycle.iter() {
                claimed.push_back(node);
            }
            cycles.push_back(cycle);
        }
    }

    (cycles, chains)
}

fn is_kept_tail(node: &Node, kept_tails: &Vec<u32>) -> bool {
    match node {
        Node::Patient(patient_id) => kept_tails.contains(*patient_id),
        _ => false,
    }
}

/// Patient nodes in a chain or cycle; kidneys and the waitlist don't count
/// toward length caps.
pub(crate) fn patient_len(nodes: &Vec<Node>) -> u32 {
    let mut count = 0u32;
    for node in nodes.iter() {
        if matches!(node, Node::Patient(_)) {
            count += 1;
        }
    }
    count
}

/// Patient ids of a chain or cycle, in node order.
pub(crate) fn patients_of(env: &Env, nodes: &Vec<Node>) -> Vec<u32> {
    let mut patients = Vec::new(env);
    for node in nodes.iter() {
        if let Node::Patient(patient_id) = node {
            patients.push_back(patient_id);
        }
    }
    patients
}
