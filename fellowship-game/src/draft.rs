//! Between-segment drafts: offering three rewards and applying the pick.
use serde::{Deserialize, Serialize};

use crate::aggregate::compute_stats;
use crate::catalog::{Catalog, GearKind, GearTemplate, MemberTemplate, TacticKind, TacticTemplate};
use crate::constants::{RANK_ONE_LAST_SEGMENT, RANK_TWO_LAST_SEGMENT};
use crate::error::{FellowshipError, FellowshipResult};
use crate::rng::DeterministicRng;
use crate::state::{GearInstance, MemberInstance, RunState, TacticInstance};
use crate::stats::Stat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    Member,
    Gear,
    Tactic,
}

/// Reward carried by an option. Gear and tactics carry their resolved
/// magnitude so applying them needs no catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftPayload {
    Member(MemberTemplate),
    Gear { template: GearTemplate, value: i32 },
    Tactic { template: TacticTemplate, value: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOption {
    pub description: String,
    pub payload: DraftPayload,
}

impl DraftOption {
    #[must_use]
    pub const fn kind(&self) -> DraftKind {
        match self.payload {
            DraftPayload::Member(_) => DraftKind::Member,
            DraftPayload::Gear { .. } => DraftKind::Gear,
            DraftPayload::Tactic { .. } => DraftKind::Tactic,
        }
    }
}

/// Member rank offered after the given segment index.
#[must_use]
pub const fn member_rank_for_segment(segment_index: u32) -> u8 {
    if segment_index <= RANK_ONE_LAST_SEGMENT {
        1
    } else if segment_index <= RANK_TWO_LAST_SEGMENT {
        2
    } else {
        3
    }
}

fn stat_list(stats: &[Stat]) -> String {
    stats
        .iter()
        .map(|stat| stat.label())
        .collect::<Vec<_>>()
        .join("/")
}

fn describe_member(state: &RunState, template: &MemberTemplate) -> String {
    let focus = stat_list(&template.primary_stats);
    if state.has_free_slot() {
        format!("Recruit {} (rank {}, {focus})", template.name, template.rank)
    } else {
        format!("Train a {focus} companion (slots full)")
    }
}

fn describe_gear(template: &GearTemplate, value: i32) -> String {
    match (template.kind, template.stat) {
        (GearKind::ExtraSlot, _) => format!("{}: +1 member slot", template.name),
        (GearKind::Heal, _) => format!("{}: restore {value} HP", template.name),
        (GearKind::AutoSuccess, Some(stat)) => {
            format!("{}: guaranteed {} check", template.name, stat.label())
        }
        (GearKind::AutoSuccess, None) => format!("{}: guaranteed check", template.name),
    }
}

fn describe_tactic(template: &TacticTemplate, value: i32) -> String {
    let stat = template.stat.map_or("", Stat::label);
    match template.kind {
        TacticKind::PermanentBoost => format!("{}: +{value} {stat} permanently", template.name),
        TacticKind::NextSegmentBoost => {
            format!("{}: +{value}% {stat} next segment", template.name)
        }
        TacticKind::SkipEvent => format!("{}: skip the next event", template.name),
    }
}

/// Offer one member, one gear and one tactic, in that order.
///
/// Draws: one pick from the rank-gated member pool, one from all gear, one
/// from the leader's tactic pool plus the generic tactics.
///
/// # Errors
///
/// Returns [`FellowshipError::EmptyInput`] when any candidate pool is empty.
pub fn get_draft_options(
    state: &RunState,
    catalog: &Catalog,
    rng: &mut DeterministicRng,
) -> FellowshipResult<[DraftOption; 3]> {
    let rank = member_rank_for_segment(state.segment_index);
    let members = catalog.members_of_rank(rank);
    let member = (*rng.pick(&members, &format!("rank {rank} member templates"))?).clone();

    let gear = rng.pick(&catalog.gear, "gear templates")?.clone();
    let gear_value = catalog.gear_value(&gear);

    let tactics = catalog.tactics_for_leader(&state.leader);
    let tactic = (*rng.pick(&tactics, "tactic templates")?).clone();
    let tactic_value = catalog.tactic_value(&tactic);

    log::debug!(
        "draft after segment {}: {} / {} / {}",
        state.segment_index.saturating_sub(1),
        member.id,
        gear.id,
        tactic.id
    );
    Ok([
        DraftOption {
            description: describe_member(state, &member),
            payload: DraftPayload::Member(member),
        },
        DraftOption {
            description: describe_gear(&gear, gear_value),
            payload: DraftPayload::Gear {
                template: gear,
                value: gear_value,
            },
        },
        DraftOption {
            description: describe_tactic(&tactic, tactic_value),
            payload: DraftPayload::Tactic {
                template: tactic,
                value: tactic_value,
            },
        },
    ])
}

/// Apply the option at 1-based `choice`; `0` or an index past the end skips
/// the draft and returns the state unchanged.
///
/// # Errors
///
/// Returns [`FellowshipError::EmptyInput`] when an upgrade or boost needs a
/// target and none exists, or [`FellowshipError::InvalidCatalog`] when a
/// payload lacks the stat its kind requires.
pub fn apply_draft_choice(
    state: &RunState,
    choice: usize,
    options: &[DraftOption],
    rng: &mut DeterministicRng,
) -> FellowshipResult<RunState> {
    let Some(option) = choice.checked_sub(1).and_then(|index| options.get(index)) else {
        log::debug!("draft skipped (choice {choice})");
        return Ok(state.clone());
    };

    let mut next = state.clone();
    let line = match &option.payload {
        DraftPayload::Member(template) => apply_member(&mut next, template, rng)?,
        DraftPayload::Gear { template, value } => apply_gear(&mut next, template, *value)?,
        DraftPayload::Tactic { template, value } => {
            apply_tactic(&mut next, template, *value, rng)?
        }
    };
    next.record(line);
    next.stats = compute_stats(&next, None);
    Ok(next)
}

/// Pick uniformly among members matching `prefer`, or among all members.
fn pick_member_index(
    members: &[MemberInstance],
    prefer: impl Fn(&MemberInstance) -> bool,
    rng: &mut DeterministicRng,
    what: &str,
) -> FellowshipResult<usize> {
    let matching: Vec<usize> = (0..members.len())
        .filter(|index| prefer(&members[*index]))
        .collect();
    let candidates = if matching.is_empty() {
        (0..members.len()).collect()
    } else {
        matching
    };
    rng.pick(&candidates, what).copied()
}

fn apply_member(
    state: &mut RunState,
    template: &MemberTemplate,
    rng: &mut DeterministicRng,
) -> FellowshipResult<String> {
    if state.has_free_slot() {
        let id = state.recruit(template);
        return Ok(format!("{} ({id}) joins the fellowship.", template.name));
    }
    let index = pick_member_index(
        &state.members,
        |member| template.shares_primary(&member.primary_stats),
        rng,
        "members to upgrade",
    )?;
    let member = &mut state.members[index];
    member.level += 1;
    Ok(format!(
        "{} trains with the newcomer and reaches level {}.",
        member.name, member.level
    ))
}

fn apply_gear(state: &mut RunState, template: &GearTemplate, value: i32) -> FellowshipResult<String> {
    match template.kind {
        GearKind::ExtraSlot => {
            state.member_slots += 1;
            Ok(format!(
                "{} grants room for another companion ({} slots).",
                template.name, state.member_slots
            ))
        }
        GearKind::Heal => {
            let before = state.hp;
            state.hp = state.hp.saturating_add(value).min(state.max_hp);
            Ok(format!(
                "{} restores {} HP ({}/{}).",
                template.name,
                state.hp - before,
                state.hp,
                state.max_hp
            ))
        }
        GearKind::AutoSuccess => {
            let stat = template.stat.ok_or_else(|| {
                FellowshipError::InvalidCatalog(format!(
                    "auto-success gear '{}' names no stat",
                    template.id
                ))
            })?;
            let id = state.next_item_id('g');
            state.gear.push(GearInstance {
                id,
                template_id: template.id.clone(),
                name: template.name.clone(),
                kind: GearKind::AutoSuccess,
                stat,
                value,
                used: false,
            });
            Ok(format!(
                "{} is packed for the next {} check.",
                template.name,
                stat.label()
            ))
        }
    }
}

fn tactic_stat(template: &TacticTemplate) -> FellowshipResult<Stat> {
    template.stat.ok_or_else(|| {
        FellowshipError::InvalidCatalog(format!("boost tactic '{}' names no stat", template.id))
    })
}

fn apply_tactic(
    state: &mut RunState,
    template: &TacticTemplate,
    value: i32,
    rng: &mut DeterministicRng,
) -> FellowshipResult<String> {
    match template.kind {
        TacticKind::PermanentBoost => {
            let stat = tactic_stat(template)?;
            if state.members.is_empty() {
                state.leader.base_stats[stat] += value;
                return Ok(format!(
                    "{} hones {} personally: +{value} {}.",
                    template.name,
                    state.leader.name,
                    stat.label()
                ));
            }
            let index = pick_member_index(
                &state.members,
                |member| member.is_primary(stat),
                rng,
                "members to boost",
            )?;
            let member = &state.members[index];
            let amount = if member.is_primary(stat) {
                value
            } else {
                value.div_euclid(2)
            };
            let (member_id, member_name) = (member.id.clone(), member.name.clone());
            state.permanent_boosts.add(&member_id, stat, amount);
            Ok(format!(
                "{}: {member_name} gains +{amount} {} permanently.",
                template.name,
                stat.label()
            ))
        }
        TacticKind::NextSegmentBoost => {
            let stat = tactic_stat(template)?;
            let id = state.next_item_id('t');
            state.tactics.push(TacticInstance {
                id,
                template_id: template.id.clone(),
                name: template.name.clone(),
                kind: TacticKind::NextSegmentBoost,
                stat,
                value,
                expires_after_segment: state.segment_index,
                used: false,
            });
            Ok(format!(
                "{} readied: +{value}% {} for segment {}.",
                template.name,
                stat.label(),
                state.segment_index
            ))
        }
        TacticKind::SkipEvent => {
            state.skip_next_event = true;
            Ok(format!("{} readied: the next event will be bypassed.", template.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::rng::Seed;
    use crate::state::create_run;
    use crate::stats::Stats;

    fn one_member_state(slots: u32) -> RunState {
        let catalog = fixtures::catalog();
        let leader = catalog.leader("bard").unwrap().clone();
        let mut state = RunState::blank(leader, 60, slots, Seed::Number(4));
        state.recruit(&fixtures::member("fighter", &[Stat::Combat], 1));
        state.stats = compute_stats(&state, None);
        state
    }

    fn member_option(template: MemberTemplate) -> DraftOption {
        DraftOption {
            description: String::new(),
            payload: DraftPayload::Member(template),
        }
    }

    fn gear_option(kind: GearKind, stat: Option<Stat>, value: i32) -> DraftOption {
        DraftOption {
            description: String::new(),
            payload: DraftPayload::Gear {
                template: fixtures::gear("g", kind, stat),
                value,
            },
        }
    }

    fn tactic_option(kind: TacticKind, stat: Option<Stat>, value: i32) -> DraftOption {
        DraftOption {
            description: String::new(),
            payload: DraftPayload::Tactic {
                template: fixtures::tactic("t", kind, stat),
                value,
            },
        }
    }

    #[test]
    fn options_are_member_gear_tactic() {
        let catalog = fixtures::catalog();
        let (state, mut rng) = create_run(&catalog, "warden", "draft").unwrap();
        for _ in 0..20 {
            let options = get_draft_options(&state, &catalog, &mut rng).unwrap();
            let kinds: Vec<_> = options.iter().map(DraftOption::kind).collect();
            assert_eq!(kinds, vec![DraftKind::Member, DraftKind::Gear, DraftKind::Tactic]);
            match &options[0].payload {
                DraftPayload::Member(template) => assert_eq!(template.rank, 1),
                other => panic!("unexpected payload {other:?}"),
            }
        }
    }

    #[test]
    fn member_rank_tiers() {
        assert_eq!(member_rank_for_segment(1), 1);
        assert_eq!(member_rank_for_segment(3), 1);
        assert_eq!(member_rank_for_segment(4), 2);
        assert_eq!(member_rank_for_segment(6), 2);
        assert_eq!(member_rank_for_segment(7), 3);
        assert_eq!(member_rank_for_segment(11), 3);
    }

    #[test]
    fn empty_rank_pool_is_an_error() {
        let mut catalog = fixtures::catalog();
        catalog.members.retain(|m| m.rank != 3);
        let (mut state, mut rng) = create_run(&catalog, "warden", 3_i64).unwrap();
        state.segment_index = 8;
        let err = get_draft_options(&state, &catalog, &mut rng).unwrap_err();
        assert!(matches!(err, FellowshipError::EmptyInput { .. }));
    }

    #[test]
    fn zero_or_out_of_range_choice_is_a_noop() {
        let state = one_member_state(2);
        let options = [member_option(fixtures::member("x", &[Stat::Social], 1))];
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let before = rng.clone();
        assert_eq!(apply_draft_choice(&state, 0, &options, &mut rng).unwrap(), state);
        assert_eq!(apply_draft_choice(&state, 2, &options, &mut rng).unwrap(), state);
        assert_eq!(rng, before);
    }

    #[test]
    fn member_recruits_when_slots_free() {
        let state = one_member_state(2);
        let options = [member_option(fixtures::member("sage", &[Stat::Social], 1))];
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let next = apply_draft_choice(&state, 1, &options, &mut rng).unwrap();
        assert_eq!(next.members.len(), 2);
        assert_eq!(next.members[1].id, "m2");
        assert_eq!(next.members[1].level, 1);
        assert_eq!(next.stats.social, state.stats.social + 3);
    }

    #[test]
    fn full_slots_upgrade_instead_of_recruiting() {
        let state = one_member_state(1);
        assert_eq!(state.members[0].id, "m1");
        let options = [member_option(fixtures::member("brute", &[Stat::Combat], 1))];
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let next = apply_draft_choice(&state, 1, &options, &mut rng).unwrap();
        assert_eq!(next.members.len(), 1);
        assert_eq!(next.members[0].level, 2);
        assert_eq!(next.stats.combat, state.stats.combat + 2);
    }

    #[test]
    fn upgrade_prefers_matching_primary_stats() {
        let mut state = one_member_state(2);
        state.recruit(&fixtures::member("sage", &[Stat::Social], 1));
        let options = [member_option(fixtures::member("orator", &[Stat::Social], 2))];
        for seed in 0..10 {
            let mut rng = DeterministicRng::new(&Seed::Number(seed));
            let next = apply_draft_choice(&state, 1, &options, &mut rng).unwrap();
            assert_eq!(next.members[0].level, 1);
            assert_eq!(next.members[1].level, 2);
        }
    }

    #[test]
    fn gear_effects() {
        let mut state = one_member_state(1);
        state.hp = 50;
        let mut rng = DeterministicRng::new(&Seed::Number(1));

        let options = [
            gear_option(GearKind::ExtraSlot, None, 1),
            gear_option(GearKind::Heal, None, 25),
            gear_option(GearKind::AutoSuccess, Some(Stat::Chaos), 10),
        ];
        let slot = apply_draft_choice(&state, 1, &options, &mut rng).unwrap();
        assert_eq!(slot.member_slots, 2);
        assert!(slot.gear.is_empty());

        let healed = apply_draft_choice(&state, 2, &options, &mut rng).unwrap();
        assert_eq!(healed.hp, 60);
        assert!(healed.gear.is_empty());

        let packed = apply_draft_choice(&state, 3, &options, &mut rng).unwrap();
        assert_eq!(packed.gear.len(), 1);
        assert_eq!(packed.gear[0].stat, Stat::Chaos);
        assert_eq!(packed.gear[0].value, 10);
        assert!(!packed.gear[0].used);
    }

    #[test]
    fn permanent_boost_full_on_primary_half_on_secondary() {
        let state = one_member_state(1);
        let mut rng = DeterministicRng::new(&Seed::Number(1));

        let primary = [tactic_option(TacticKind::PermanentBoost, Some(Stat::Combat), 6)];
        let next = apply_draft_choice(&state, 1, &primary, &mut rng).unwrap();
        assert_eq!(next.permanent_boosts.get("m1", Stat::Combat), 6);
        assert_eq!(next.stats.combat, state.stats.combat + 6);

        let secondary = [tactic_option(TacticKind::PermanentBoost, Some(Stat::Chaos), 7)];
        let next = apply_draft_choice(&next, 1, &secondary, &mut rng).unwrap();
        assert_eq!(next.permanent_boosts.get("m1", Stat::Chaos), 3);
        assert_eq!(next.stats.chaos, state.stats.chaos + 3);
    }

    #[test]
    fn permanent_boost_without_members_lands_on_leader() {
        let catalog = fixtures::catalog();
        let leader = catalog.leader("bard").unwrap().clone();
        let state = RunState::blank(leader, 60, 2, Seed::Number(1));
        let options = [tactic_option(TacticKind::PermanentBoost, Some(Stat::Survival), 4)];
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let before = rng.clone();
        let next = apply_draft_choice(&state, 1, &options, &mut rng).unwrap();
        assert_eq!(next.leader.base_stats, Stats::new(1, 5, 6, 3));
        assert_eq!(next.stats, Stats::new(1, 5, 6, 3));
        assert!(next.permanent_boosts.is_empty());
        assert_eq!(rng, before);
    }

    #[test]
    fn next_segment_boost_and_skip() {
        let mut state = one_member_state(1);
        state.segment_index = 4;
        let options = [
            tactic_option(TacticKind::NextSegmentBoost, Some(Stat::Social), 30),
            tactic_option(TacticKind::SkipEvent, None, 0),
        ];
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let boosted = apply_draft_choice(&state, 1, &options, &mut rng).unwrap();
        assert_eq!(boosted.tactics.len(), 1);
        assert_eq!(boosted.tactics[0].expires_after_segment, 4);
        assert!(!boosted.tactics[0].used);
        assert_eq!(boosted.stats, state.stats);

        let skipping = apply_draft_choice(&state, 2, &options, &mut rng).unwrap();
        assert!(skipping.skip_next_event);
        let again = apply_draft_choice(&skipping, 2, &options, &mut rng).unwrap();
        assert!(again.skip_next_event);
    }

    #[test]
    fn upgrade_with_no_members_and_no_slots_is_empty_input() {
        let catalog = fixtures::catalog();
        let leader = catalog.leader("bard").unwrap().clone();
        let state = RunState::blank(leader, 60, 0, Seed::Number(1));
        let options = [member_option(fixtures::member("x", &[Stat::Combat], 1))];
        let mut rng = DeterministicRng::new(&Seed::Number(1));
        let err = apply_draft_choice(&state, 1, &options, &mut rng).unwrap_err();
        assert!(matches!(err, FellowshipError::EmptyInput { .. }));
    }
}
