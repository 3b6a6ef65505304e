//! Built-in token catalog.
//!
//! Token ids and families mirror spec.md §4.1 exactly: an `offense`/`dull`
//! style opposite pair per attack/defense axis, `_plus` variants of each
//! that outrank their base when both are present, and a handful of
//! special-predicate tokens (`burn`/`poison`/`regen`/`counter`/`immune`/
//! `revive`) that `token_engine`'s `process_*`/`check_*`/`consume_*` helpers
//! key off by id rather than by category.

use std::sync::OnceLock;

use etherline_types::{TokenCategory, TokenDef, TokenDuration, TokenId};

fn def(
    id: &str,
    name: &str,
    category: TokenCategory,
    duration: TokenDuration,
    max_stacks: Option<u32>,
    opposite: Option<&str>,
    description: &str,
) -> TokenDef {
    TokenDef {
        id: TokenId::from(id),
        name: name.into(),
        category,
        duration,
        max_stacks,
        opposite_id: opposite.map(TokenId::from),
        description: description.into(),
    }
}

fn built_in() -> Vec<TokenDef> {
    use TokenCategory::{Negative, Positive};
    use TokenDuration::{Permanent, Turn, Usage};
    vec![
        // Attack axis: offense/offense_plus (permanent) vs. dull/dull_plus
        // (turn) and dullness/dullness_plus (permanent) — see
        // `token_engine::attack_modifiers`.
        def("offense", "Offense", Positive, Permanent, Some(99), Some("dull"), "Permanently raises outgoing attack multiplier."),
        def("offense_plus", "Offense+", Positive, Permanent, Some(99), Some("dullness"), "A stronger, permanent attack multiplier boost."),
        def("attack_up", "Attack Up", Positive, Turn, Some(99), None, "Raises outgoing attack multiplier for the turn."),
        def("attack_up_plus", "Attack Up+", Positive, Turn, Some(99), None, "A stronger attack multiplier boost for the turn."),
        def("dull", "Dull", Negative, Turn, Some(99), Some("offense"), "Reduces outgoing attack multiplier for the turn."),
        def("dull_plus", "Dull+", Negative, Turn, Some(99), None, "A harsher attack multiplier reduction for the turn."),
        def("dullness", "Dullness", Negative, Permanent, Some(99), Some("offense_plus"), "Permanently reduces outgoing attack multiplier."),
        def("dullness_plus", "Dullness+", Negative, Permanent, Some(99), None, "A harsher, permanent attack multiplier reduction."),

        // Flat attack-damage contributors.
        def("strength", "Strength", Positive, Permanent, None, Some("weak"), "Adds flat bonus damage per stack."),
        def("weak", "Weak", Negative, Turn, Some(99), Some("strength"), "Legacy flat damage debuff, cancels with strength."),
        def("sharpened_blade", "Sharpened Blade", Positive, Turn, Some(99), None, "Adds flat bonus damage per stack, for the turn."),
        def("crit_boost", "Crit Boost", Positive, Turn, Some(20), None, "Raises critical hit chance by 5% per stack."),
        def("armor_piercing", "Armor Piercing", Positive, Turn, Some(1), None, "This attack ignores the defender's block."),
        def("absorb", "Absorb", Positive, Turn, Some(1), None, "Converts half of this attack's dealt damage into healing."),
        def("fragmentation", "Fragmentation", Positive, Usage, Some(1), None, "Adds a flat +6 bonus to this attack's damage."),
        def("true_strike", "True Strike", Positive, Usage, Some(1), None, "This attack fully ignores the defender's dodge chance."),

        // Defense axis: guard/defense_up (positive) vs. shaken/exposed (negative).
        def("guard", "Guard", Positive, Permanent, Some(99), Some("shaken"), "Permanently raises block granted by skills."),
        def("defense_up", "Defense Up", Positive, Turn, Some(99), None, "Raises block granted by skills for the turn."),
        def("shaken", "Shaken", Negative, Turn, Some(99), Some("guard"), "Reduces block granted by skills for the turn."),
        def("exposed", "Exposed", Negative, Permanent, Some(99), None, "Permanently reduces block granted by skills."),

        // Dodge family — `dodge_chance` is the max of whichever is active.
        def("blur", "Blur", Positive, Turn, Some(1), None, "50% chance to dodge incoming attacks this turn."),
        def("blur_plus", "Blur+", Positive, Turn, Some(1), None, "75% chance to dodge incoming attacks this turn."),
        def("dodge", "Dodge", Positive, Usage, Some(1), None, "50% chance to dodge the next incoming attack."),
        def("dodge_plus", "Dodge+", Positive, Usage, Some(1), None, "75% chance to dodge the next incoming attack."),
        def("evasion", "Evasion", Positive, Permanent, Some(1), None, "Permanent 75% chance to dodge incoming attacks."),

        // Damage-taken multiplier family.
        def("vulnerable", "Vulnerable", Negative, Turn, Some(99), None, "Increases damage taken by 50% per stack, for the turn."),
        def("vulnerable_plus", "Vulnerable+", Negative, Turn, Some(99), None, "Increases damage taken by 100% per stack, for the turn."),
        def("pain", "Pain", Negative, Permanent, Some(99), None, "Permanently increases damage taken by 50% per stack."),
        def("pain_plus", "Pain+", Negative, Permanent, Some(99), None, "Permanently increases damage taken by 100% per stack."),

        // Special predicates, keyed by id rather than category.
        def("burn", "Burn", Negative, Permanent, None, None, "Deals fire damage at end of turn, then decays by one stack."),
        def("poison", "Poison", Negative, Permanent, None, None, "Deals void damage at end of turn, then decays by one stack."),
        def("regen", "Regenerate", Positive, Permanent, None, None, "Restores HP at end of turn, then decays by one stack."),
        def("counter", "Counter", Positive, Usage, Some(1), None, "The next hit taken is reflected back at its source in full."),
        def("reflect", "Reflect", Positive, Permanent, Some(99), None, "Reflects half of incoming damage per stack back at its source."),
        def("immune", "Immune", Positive, Turn, Some(1), None, "Negates all incoming damage this turn."),
        def("revive", "Revive", Positive, Usage, Some(1), None, "Prevents the next lethal hit from reducing hp below 1."),
    ]
}

fn catalog() -> &'static [TokenDef] {
    static CATALOG: OnceLock<Vec<TokenDef>> = OnceLock::new();
    CATALOG.get_or_init(built_in)
}

pub fn get_token(id: &TokenId) -> Option<&'static TokenDef> {
    catalog().iter().find(|t| &t.id == id)
}

pub fn all_tokens() -> &'static [TokenDef] {
    catalog()
}
