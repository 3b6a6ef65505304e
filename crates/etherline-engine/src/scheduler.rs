//! Timeline scheduler: builds the speed-ordered queue from the player's and
//! every enemy unit's submitted cards, detects crossed pairs between them,
//! steps the resolution cursor across the merged queue, and supports
//! inserting transient ghost entries and rewinding to a prior snapshot.

use etherline_data::get_card;
use etherline_types::{Actor, CardUid, RuntimeCardInstance, TimelineEntry};
use tracing::debug;

/// Builds a speed-ordered queue merging every actor's submitted cards onto
/// one shared timeline. Each actor accrues its own cumulative speed cost
/// independently — the player's slot 3 and an enemy unit's slot 3 are the
/// *same* timeline position, which is exactly what lets two opposite-actor
/// cards land in the same slot and cross. Within a slot, ghosts sort first,
/// then by actor (`Actor`'s `Ord`, so the player sorts before any enemy
/// unit), then by submission order — a stable sort preserves the rest.
pub fn build_queue(sides: &[(Actor, &[RuntimeCardInstance])]) -> Vec<TimelineEntry> {
    let mut entries: Vec<(u32, TimelineEntry)> = Vec::new();
    let mut order = 0u32;
    for (actor, cards) in sides {
        let mut running_slot = 0u32;
        for card in *cards {
            let cost = get_card(&card.def_id).map(|def| def.base_speed_cost).unwrap_or(1);
            let slot = running_slot;
            running_slot += cost;
            entries.push((
                order,
                TimelineEntry {
                    uid: card.uid,
                    def_id: card.def_id.clone(),
                    actor: *actor,
                    slot,
                    resolved: false,
                    crossed_with: None,
                    is_ghost: card.flags.is_ghost || card.flags.is_fleche_preview,
                },
            ));
            order += 1;
        }
    }
    entries.sort_by_key(|(order, entry)| (entry.slot, !entry.is_ghost, entry.actor, *order));
    let mut queue: Vec<TimelineEntry> = entries.into_iter().map(|(_, e)| e).collect();
    mark_crossed_pairs(&mut queue);
    debug!(len = queue.len(), "timeline queue built");
    queue
}

/// Scans `queue` for same-slot, opposite-actor, non-ghost pairs and records
/// each half's partner uid in `crossed_with`. When more than two non-ghost
/// entries share a slot (a multi-unit encounter whose units both land on the
/// player's slot), only the first player entry and the first opposing entry
/// at that slot are paired — a slot can host at most one crossed pair,
/// matching the "crosses at most once" framing of a crossed pair's bonus.
fn mark_crossed_pairs(queue: &mut [TimelineEntry]) {
    let mut slot_start = 0;
    while slot_start < queue.len() {
        let slot = queue[slot_start].slot;
        let slot_end = queue[slot_start..].iter().position(|e| e.slot != slot).map(|o| slot_start + o).unwrap_or(queue.len());

        let player_idx = queue[slot_start..slot_end].iter().position(|e| !e.is_ghost && e.actor.is_player());
        let enemy_idx = queue[slot_start..slot_end].iter().position(|e| !e.is_ghost && !e.actor.is_player());
        if let (Some(p), Some(e)) = (player_idx, enemy_idx) {
            let p_uid = queue[slot_start + p].uid;
            let e_uid = queue[slot_start + e].uid;
            queue[slot_start + p].crossed_with = Some(e_uid);
            queue[slot_start + e].crossed_with = Some(p_uid);
        }
        slot_start = slot_end;
    }
}

/// Inserts a ghost-preview entry ahead of the card it previews, without
/// shifting any other entry's `slot` — ghost copies are read, resolved, and
/// discarded, never persisted as part of the ordinary timeline. Re-stabilizes
/// the slot's suffix so the ghost-first tiebreak holds against any existing
/// entry already occupying `at_slot`.
pub fn insert_ghost(queue: &mut Vec<TimelineEntry>, ghost: RuntimeCardInstance, actor: Actor, at_slot: u32) {
    let entry = TimelineEntry {
        uid: ghost.uid,
        def_id: ghost.def_id,
        actor,
        slot: at_slot,
        resolved: false,
        crossed_with: None,
        is_ghost: true,
    };
    let pos = queue.partition_point(|e| e.slot < at_slot);
    queue.insert(pos, entry);
}

/// Advances the resolution cursor to the next unresolved entry and marks it
/// resolved, returning that entry's uid. Returns `None` once the queue is
/// exhausted.
pub fn step_once(queue: &mut [TimelineEntry], q_index: &mut usize) -> Option<CardUid> {
    if *q_index >= queue.len() {
        return None;
    }
    let entry = &mut queue[*q_index];
    entry.resolved = true;
    let uid = entry.uid;
    *q_index += 1;
    debug!(uid = uid.0, "crossed timeline entry");
    Some(uid)
}

/// Whether the scheduler has crossed every entry in the queue.
pub fn is_exhausted(queue: &[TimelineEntry], q_index: usize) -> bool {
    q_index >= queue.len()
}

/// Marks every entry up to and including `through_slot` as resolved without
/// advancing `q_index` past entries the cursor hasn't actually reached —
/// used when a rewind restores a mid-resolution snapshot and the caller
/// needs queue state consistent with the restored cursor.
pub fn mark_resolved_through(queue: &mut [TimelineEntry], through_slot: u32) {
    for entry in queue.iter_mut() {
        if entry.slot <= through_slot {
            entry.resolved = true;
        }
    }
}

/// Safety-net recovery path: if `queue` is found empty while `fixed_order`
/// still holds entries, rebuild `queue` from `fixed_order` and reset
/// `q_index` to 0. This should never happen in ordinary play — a mutation
/// that clears `queue` mid-resolution is itself a bug — but the engine keeps
/// running rather than stalling. Returns whether a recovery actually
/// happened, so the caller can decide whether to log it.
pub fn recover_if_needed(queue: &mut Vec<TimelineEntry>, q_index: &mut usize, fixed_order: &[TimelineEntry]) -> bool {
    if !queue.is_empty() || fixed_order.is_empty() || *q_index >= fixed_order.len() {
        return false;
    }
    *queue = fixed_order.to_vec();
    *q_index = 0;
    debug!(len = queue.len(), "queue recovered from fixed_order");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherline_types::{CardId, CardRuntimeFlags, CardUidGen, EnemyUnitId};

    fn instance(id: &str, gen: &mut CardUidGen) -> RuntimeCardInstance {
        RuntimeCardInstance { def_id: CardId::from(id), uid: gen.next(), flags: CardRuntimeFlags::default(), level: 0 }
    }

    #[test]
    fn build_queue_orders_by_cumulative_speed_cost() {
        let mut gen = CardUidGen::default();
        // guard (cost 1), strike (cost 2)
        let cards = vec![instance("guard", &mut gen), instance("strike", &mut gen)];
        let queue = build_queue(&[(Actor::Player, &cards)]);
        assert_eq!(queue[0].def_id, CardId::from("guard"));
        assert_eq!(queue[0].slot, 0);
        assert_eq!(queue[1].slot, 1);
    }

    #[test]
    fn step_once_advances_cursor_and_marks_resolved() {
        let mut gen = CardUidGen::default();
        let cards = vec![instance("strike", &mut gen)];
        let mut queue = build_queue(&[(Actor::Player, &cards)]);
        let mut q_index = 0;
        let uid = step_once(&mut queue, &mut q_index);
        assert!(uid.is_some());
        assert!(queue[0].resolved);
        assert_eq!(q_index, 1);
        assert!(step_once(&mut queue, &mut q_index).is_none());
    }

    #[test]
    fn is_exhausted_reflects_cursor_position() {
        let mut gen = CardUidGen::default();
        let cards = vec![instance("strike", &mut gen)];
        let queue = build_queue(&[(Actor::Player, &cards)]);
        assert!(!is_exhausted(&queue, 0));
        assert!(is_exhausted(&queue, 1));
    }

    #[test]
    fn insert_ghost_does_not_shift_existing_slots() {
        let mut gen = CardUidGen::default();
        let cards = vec![instance("strike", &mut gen)];
        let mut queue = build_queue(&[(Actor::Player, &cards)]);
        let original_slot = queue[0].slot;
        let ghost = instance("echo", &mut gen);
        insert_ghost(&mut queue, ghost, Actor::Player, 0);
        assert_eq!(queue.iter().find(|e| e.def_id == CardId::from("strike")).unwrap().slot, original_slot);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn player_and_enemy_cards_in_the_same_slot_cross() {
        let mut gen = CardUidGen::default();
        // Both cost 2 on their own side, so both land in slot 0.
        let player_cards = vec![instance("strike", &mut gen)];
        let enemy_cards = vec![instance("strike", &mut gen)];
        let queue = build_queue(&[(Actor::Player, &player_cards), (Actor::Enemy { unit: EnemyUnitId(0) }, &enemy_cards)]);
        let player_entry = queue.iter().find(|e| e.actor.is_player()).unwrap();
        let enemy_entry = queue.iter().find(|e| !e.actor.is_player()).unwrap();
        assert_eq!(player_entry.crossed_with, Some(enemy_entry.uid));
        assert_eq!(enemy_entry.crossed_with, Some(player_entry.uid));
    }

    #[test]
    fn cards_in_different_slots_do_not_cross() {
        let mut gen = CardUidGen::default();
        let player_cards = vec![instance("guard", &mut gen)]; // slot 0, cost 1
        // First enemy card occupies slot 0 (crosses the guard); the second
        // lands at slot 1, where the player has nothing queued.
        let enemy_cards = vec![instance("guard", &mut gen), instance("strike", &mut gen)];
        let queue = build_queue(&[(Actor::Player, &player_cards), (Actor::Enemy { unit: EnemyUnitId(0) }, &enemy_cards)]);
        let slot_one_enemy = queue.iter().find(|e| e.slot == 1 && !e.actor.is_player()).unwrap();
        assert_eq!(slot_one_enemy.crossed_with, None);
    }

    fn is_sorted_by_key(queue: &[TimelineEntry]) -> bool {
        queue.windows(2).all(|w| (w[0].slot, !w[0].is_ghost, w[0].actor) <= (w[1].slot, !w[1].is_ghost, w[1].actor))
    }

    proptest::proptest! {
        #[test]
        fn build_queue_is_sorted_for_any_mix_of_player_and_enemy_cards(
            player_names in proptest::collection::vec(proptest::sample::select(vec!["guard", "strike", "echo"]), 0..6),
            enemy_names in proptest::collection::vec(proptest::sample::select(vec!["guard", "strike", "echo"]), 0..6),
        ) {
            let mut gen = CardUidGen::default();
            let player_cards: Vec<RuntimeCardInstance> = player_names.iter().map(|n| instance(n, &mut gen)).collect();
            let enemy_cards: Vec<RuntimeCardInstance> = enemy_names.iter().map(|n| instance(n, &mut gen)).collect();
            let queue = build_queue(&[
                (Actor::Player, &player_cards),
                (Actor::Enemy { unit: EnemyUnitId(0) }, &enemy_cards),
            ]);
            proptest::prop_assert!(is_sorted_by_key(&queue));
        }

        #[test]
        fn insert_ghost_preserves_sortedness(
            player_names in proptest::collection::vec(proptest::sample::select(vec!["guard", "strike", "echo"]), 0..6),
            at_slot in 0u32..4,
        ) {
            let mut gen = CardUidGen::default();
            let player_cards: Vec<RuntimeCardInstance> = player_names.iter().map(|n| instance(n, &mut gen)).collect();
            let mut queue = build_queue(&[(Actor::Player, &player_cards)]);
            let ghost = instance("echo", &mut gen);
            insert_ghost(&mut queue, ghost, Actor::Player, at_slot);
            proptest::prop_assert!(queue.windows(2).all(|w| w[0].slot <= w[1].slot));
        }
    }
}
