// engine.rs - TTCC round executor
// Drives the allocation to a fixed point: cycles execute as long as any
// exist, then one w-chain per round is selected, recorded and either
// finalized or kept as a live bridge for later rounds.

use soroban_sdk::{Env, Map, Vec};

use crate::storage::{self, Pool};
use crate::{events, graph, selection};
use crate::{Assignment, ChainRule, GraphSnapshot, Node, SnapshotStage};

/// Mutable per-run state. The pool itself is never touched by a run; the
/// caller persists `assignments` once the loop has finished.
struct RunState {
    active: Vec<u32>,
    assignments: Map<u32, Assignment>,
    kept_tails: Vec<u32>,
}

impl RunState {
    fn new(env: &Env, pool: &Pool) -> Self {
        let mut assignments = Map::new(env);
        for patient_id in pool.patient_ids.iter() {
            assignments.set(patient_id, Assignment::Unset);
        }
        RunState {
            active: pool.patient_ids.clone(),
            assignments,
            kept_tails: Vec::new(env),
        }
    }

    fn deactivate(&mut self, patient_id: u32) {
        if let Some(at) = self.active.first_index_of(patient_id) {
            self.active.remove(at);
        }
    }

    fn is_assigned_kidney(&self, kidney_id: u32) -> bool {
        for (_, assignment) in self.assignments.iter() {
            if assignment == Assignment::Kidney(kidney_id) {
                return true;
            }
        }
        false
    }
}

pub(crate) struct RunOutcome {
    pub assignments: Map<u32, Assignment>,
    pub rounds: u32,
}

pub(crate) fn run(
    env: &Env,
    pool: &Pool,
    rule: ChainRule,
    max_cycle_len: u32,
    max_chain_len: u32,
) -> RunOutcome {
    let mut state = RunState::new(env, pool);
    let priority = pool.patient_ids.clone();

    let initial_pointers = graph::build_pointers(env, pool, &pool.patient_ids, &pool.kidney_ids);
    storage::set_snapshot(
        env,
        SnapshotStage::Initial,
        &GraphSnapshot {
            pointers: initial_pointers,
            active: pool.patient_ids.clone(),
        },
    );

    let mut round = 1u32;
    let mut rounds_completed = 0u32;
    let mut post_cycles_captured = false;

    loop {
        if state.active.is_empty() {
            break;
        }

        let available = available_kidneys(env, pool, &state);
        let pointers = graph::build_pointers(env, pool, &state.active, &available);
        let no_tails = Vec::new(env);
        let (cycles, _) = graph::find_cycles_and_chains(env, &pointers, &state.active, &no_tails);

        let mut executable: Vec<Vec<Node>> = Vec::new(env);
        for cycle in cycles.iter() {
            if cycle.len() / 2 <= max_cycle_len {
                executable.push_back(cycle);
            }
        }
        if !executable.is_empty() {
            for cycle in executable.iter() {
                execute_cycle(env, &mut state, &cycle, round);
            }
            round += 1;
            rounds_completed += 1;
            continue;
        }

        if !post_cycles_captured {
            storage::set_snapshot(
                env,
                SnapshotStage::PostCycles,
                &GraphSnapshot {
                    pointers: pointers.clone(),
                    active: state.active.clone(),
                },
            );
            post_cycles_captured = true;
        }

        // Kept-chain members are reachable as targets but never start a
        // walk; a walk running into one stops there for later unraveling.
        let mut chain_starts: Vec<u32> = Vec::new(env);
        for patient_id in state.active.iter() {
            if !state.kept_tails.contains(patient_id) {
                chain_starts.push_back(patient_id);
            }
        }
        let chain_pointers = graph::build_pointers(env, pool, &chain_starts, &available);
        let (_, raw_chains) =
            graph::find_cycles_and_chains(env, &chain_pointers, &chain_starts, &state.kept_tails);
        if raw_chains.is_empty() {
            break;
        }

        let mut chains: Vec<Vec<Node>> = Vec::new(env);
        for chain in raw_chains.iter() {
            chains.push_back(expand_chain(env, pool, &state, &chain));
        }

        let selected = match selection::select_chain(
            env,
            pool,
            &chains,
            rule.clone(),
            &priority,
            max_chain_len,
        ) {
            Some(chain) => chain,
            None => break,
        };

        record_chain(&mut state, &selected);

        let chain_patients = graph::patients_of(env, &selected);
        let mut keep = selection::retains_chain(pool, &rule, &selected);
        // Final transaction: keeping a chain that exhausts the active set
        // would leave a tail no future round could ever absorb.
        if exhausts_active(&state, &chain_patients) {
            keep = false;
        }

        if keep {
            for patient_id in chain_patients.iter() {
                if !state.kept_tails.contains(patient_id) {
                    state.kept_tails.push_back(patient_id);
                }
            }
        } else {
            for patient_id in chain_patients.iter() {
                state.deactivate(patient_id);
            }
        }
        events::emit_chain_processed(
            env,
            round,
            selection::head_patient(&selected),
            chain_patients,
            keep,
        );

        round += 1;
        rounds_completed += 1;
    }

    capture_final_snapshot(env, pool, &state);

    for patient_id in pool.patient_ids.iter() {
        if state.assignments.get(patient_id).unwrap() == Assignment::Unset {
            state.assignments.set(patient_id, Assignment::NoExchange);
        }
    }

    RunOutcome {
        assignments: state.assignments,
        rounds: rounds_completed,
    }
}

/// A kidney stays available while its paired patient is active and nobody
/// has been assigned it in an earlier round.
fn available_kidneys(env: &Env, pool: &Pool, state: &RunState) -> Vec<u32> {
    let mut available = Vec::new(env);
    for kidney_id in pool.kidney_ids.iter() {
        let kidney = pool.kidneys.get(kidney_id).unwrap();
        if state.active.contains(kidney.donor_patient_id) && !state.is_assigned_kidney(kidney_id) {
            available.push_back(kidney_id);
        }
    }
    available
}

/// Every patient in the cycle receives the kidney that follows it and
/// leaves the pool. This may capture a kept-chain participant, superseding
/// its tentative assignment; the kept chain re-anchors on whatever
/// assignments remain when it is later unraveled.
fn execute_cycle(env: &Env, state: &mut RunState, cycle: &Vec<Node>, round: u32) {
    let len = cycle.len();
    for i in 0..len {
        if let Node::Patient(patient_id) = cycle.get_unchecked(i) {
            match cycle.get_unchecked((i + 1) % len) {
                Node::Kidney(kidney_id) => {
                    state.assignments.set(patient_id, Assignment::Kidney(kidney_id));
                    state.deactivate(patient_id);
                }
                _ => panic!("cycle does not alternate patients and kidneys"),
            }
        }
    }
    events::emit_cycle_executed(env, round, graph::patients_of(env, cycle));
}

/// Record tentative assignments along a selected chain: each patient takes
/// the node after it, the last patient takes the waitlist.
fn record_chain(state: &mut RunState, chain: &Vec<Node>) {
    let len = chain.len();
    for i in 0..(len - 1) {
        if let Node::Patient(patient_id) = chain.get_unchecked(i) {
            match chain.get_unchecked(i + 1) {
                Node::Kidney(kidney_id) => {
                    state.assignments.set(patient_id, Assignment::Kidney(kidney_id));
                }
                Node::Waitlist => {
                    state.assignments.set(patient_id, Assignment::Waitlist);
                }
                Node::Patient(_) => panic!("chain does not alternate patients and kidneys"),
            }
        }
    }
}

/// Splice the forward path of a kept chain onto a walk that stopped at its
/// tail, yielding the chain as it would execute today. Walks the recorded
/// assignments: patient, assigned kidney, that kidney's paired patient,
/// and so on until the waitlist or an unset assignment.
fn expand_chain(env: &Env, pool: &Pool, state: &RunState, chain: &Vec<Node>) -> Vec<Node> {
    let tail = match chain.last() {
        Some(Node::Patient(patient_id)) if state.kept_tails.contains(patient_id) => patient_id,
        _ => return chain.clone(),
    };

    let mut expanded = chain.slice(..chain.len() - 1);
    expanded.push_back(Node::Patient(tail));

    let mut curr = tail;
    let mut steps = 0u32;
    loop {
        match state.assignments.get(curr).unwrap() {
            Assignment::Kidney(kidney_id) => {
                let kidney = pool.kidneys.get(kidney_id).unwrap();
                expanded.push_back(Node::Kidney(kidney_id));
                expanded.push_back(Node::Patient(kidney.donor_patient_id));
                curr = kidney.donor_patient_id;
            }
            Assignment::Waitlist => {
                expanded.push_back(Node::Waitlist);
                break;
            }
            _ => break,
        }
        steps += 1;
        if steps > pool.patient_ids.len() {
            panic!("kept chain does not terminate");
        }
    }

    expanded
}

fn exhausts_active(state: &RunState, chain_patients: &Vec<u32>) -> bool {
    for patient_id in state.active.iter() {
        if !chain_patients.contains(patient_id) {
            return false;
        }
    }
    true
}

/// Snapshot the endgame before leftovers are finalized: patients still
/// without an assignment, the kidneys their pairs still hold, and the
/// pointers between them.
fn capture_final_snapshot(env: &Env, pool: &Pool, state: &RunState) {
    let mut unmatched: Vec<u32> = Vec::new(env);
    for patient_id in pool.patient_ids.iter() {
        if state.assignments.get(patient_id).unwrap() == Assignment::Unset {
            unmatched.push_back(patient_id);
        }
    }
    let mut held_kidneys: Vec<u32> = Vec::new(env);
    for kidney_id in pool.kidney_ids.iter() {
        let kidney = pool.kidneys.get(kidney_id).unwrap();
        if unmatched.contains(kidney.donor_patient_id) {
            held_kidneys.push_back(kidney_id);
        }
    }
    let pointers = graph::build_pointers(env, pool, &unmatched, &held_kidneys);
    storage::set_snapshot(
        env,
        SnapshotStage::Final,
        &GraphSnapshot {
            pointers,
            active: unmatched,
        },
    );
}
