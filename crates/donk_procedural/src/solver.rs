//! # Navigability Solver
//!
//! Decides the navigation type of every slot of a new ring so that each exit
//! of the previous ring stays reachable.
//!
//! ## Algorithm
//!
//! 1. **Remap** the previous exits onto the new slot count. Equal counts map
//!    one to one; a ratio of exactly 3 scales indices. Any other ratio is a
//!    geometry discontinuity: the whole ring gets one open type and exits
//!    are not tracked across it.
//! 2. **Baseline**: every slot draws `Impassable` four times out of five,
//!    otherwise `Passable` (or `Tunnel` when passable tiles are not allowed).
//! 3. **Repair**: each exit, in list order, that cannot already reach an
//!    open slot carves one out, optionally through a swervible slot.
//!
//! The repair is greedy and order-dependent: earlier exits claim slots first,
//! which now and then opens more slots than strictly needed. Later level
//! pacing depends on exactly this bias.
//!
//! Slot indices wrap around the ring.

use std::collections::{BTreeMap, HashSet, VecDeque};

use donk_core::SeededRng;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::nav::NavType;

/// Baseline weight of an impassable slot against one open slot.
const IMPASSABLE_WEIGHT: u32 = 4;

/// A navigable slot at the far edge of a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exit {
    /// Slot index.
    pub index: usize,
    /// Slots the ship may swerve left before entering the next ring.
    pub left: u8,
    /// Slots the ship may swerve right before entering the next ring.
    pub right: u8,
}

impl Exit {
    /// Creates an exit.
    #[inline]
    #[must_use]
    pub const fn new(index: usize, left: u8, right: u8) -> Self {
        Self { index, left, right }
    }
}

/// Which slot types the solver may place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveFlags {
    /// Swervible slots may be created.
    pub allow_swervible: bool,
    /// Passable slots may be created.
    pub allow_passable: bool,
    /// Tunnel slots may be created.
    pub allow_tunnel: bool,
}

impl SolveFlags {
    /// Creates a flag set.
    #[inline]
    #[must_use]
    pub const fn new(allow_swervible: bool, allow_passable: bool, allow_tunnel: bool) -> Self {
        Self {
            allow_swervible,
            allow_passable,
            allow_tunnel,
        }
    }

    /// Trench and transition rings: tunnels only.
    pub const TUNNELS_ONLY: Self = Self::new(false, false, true);

    /// Wall sections: plain passable gaps only.
    pub const WALL: Self = Self::new(false, true, false);
}

/// Result of mapping previous exits onto a new slot count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitRemap {
    /// Exits expressed in the new ring's slot indices.
    Preserved(Vec<Exit>),
    /// Slot counts are unrelated; exits cannot be carried over.
    Discontinuous,
}

/// Wraps a possibly negative slot offset into `[0, count)`.
#[inline]
#[must_use]
pub fn wrap(index: isize, count: usize) -> usize {
    index.rem_euclid(count as isize) as usize
}

/// Maps exits of a ring with `old_slots` slots onto `new_slots` slots.
///
/// - Equal counts: unchanged.
/// - Three times as many new slots: exit `i` becomes `3i`.
/// - A third as many: exit `i` becomes `i / 3`; an exit in the left third
///   of the merged slot gains one left swerve, one in the right third gains
///   one right swerve. Exits that land on the same slot merge, keeping the
///   larger budgets.
#[must_use]
pub fn remap_exits(old_slots: usize, new_slots: usize, exits: &[Exit]) -> ExitRemap {
    if old_slots == new_slots {
        return ExitRemap::Preserved(exits.to_vec());
    }

    if new_slots == old_slots * 3 {
        return ExitRemap::Preserved(
            exits
                .iter()
                .map(|e| Exit::new(e.index * 3, e.left, e.right))
                .collect(),
        );
    }

    if old_slots == new_slots * 3 {
        let mut merged: BTreeMap<usize, Exit> = BTreeMap::new();
        for e in exits {
            let index = e.index / 3;
            let (left, right) = match e.index % 3 {
                0 => (e.left.saturating_add(1), e.right),
                2 => (e.left, e.right.saturating_add(1)),
                _ => (e.left, e.right),
            };
            merged
                .entry(index)
                .and_modify(|m| {
                    m.left = m.left.max(left);
                    m.right = m.right.max(right);
                })
                .or_insert_with(|| Exit::new(index, left, right));
        }
        return ExitRemap::Preserved(merged.into_values().collect());
    }

    ExitRemap::Discontinuous
}

/// Computes slot types for a new ring.
///
/// # Arguments
///
/// * `rng` - The run's random stream
/// * `slot_count` - Slots in the new ring
/// * `previous_slots` - Slots in the previous ring
/// * `previous_exits` - Exits of the previous ring, in its slot indices
/// * `flags` - Which types may be placed
///
/// # Returns
///
/// One navigation type per slot.
pub fn solve(
    rng: &mut SeededRng,
    slot_count: usize,
    previous_slots: usize,
    previous_exits: &[Exit],
    flags: SolveFlags,
) -> Vec<NavType> {
    if slot_count == 0 {
        debug_assert!(slot_count > 0, "solver asked for a zero-slot ring");
        error!("Solver asked for a zero-slot ring, emitting one passable slot");
        return vec![NavType::Passable];
    }

    let exits = match remap_exits(previous_slots.max(1), slot_count, previous_exits) {
        ExitRemap::Preserved(exits) => exits,
        ExitRemap::Discontinuous => return degraded_fill(rng, slot_count, flags),
    };

    let open = if flags.allow_passable {
        NavType::Passable
    } else {
        NavType::Tunnel
    };
    let baseline = [(NavType::Impassable, IMPASSABLE_WEIGHT), (open, 1)];
    let mut types: Vec<NavType> = (0..slot_count)
        .map(|_| rng.choose_weighted(&baseline).unwrap_or(NavType::Impassable))
        .collect();

    for exit in &exits {
        repair_exit(rng, &mut types, exit, flags);
    }

    types
}

/// One open type for the whole ring, used across geometry discontinuities.
fn degraded_fill(rng: &mut SeededRng, slot_count: usize, flags: SolveFlags) -> Vec<NavType> {
    let fill = if flags.allow_tunnel && flags.allow_passable {
        rng.choose_weighted(&[(NavType::Passable, 2), (NavType::Tunnel, 1)])
            .unwrap_or(NavType::Passable)
    } else if flags.allow_tunnel {
        NavType::Tunnel
    } else {
        NavType::Passable
    };
    vec![fill; slot_count]
}

/// Slot type at a wrapped index.
#[inline]
fn slot(types: &[NavType], index: isize) -> NavType {
    types[wrap(index, types.len())]
}

/// Makes one exit reachable, if it is not already.
fn repair_exit(rng: &mut SeededRng, types: &mut [NavType], exit: &Exit, flags: SolveFlags) {
    let n = types.len();
    let i = exit.index as isize;
    let at = |types: &[NavType], offset: isize| slot(types, i + offset);
    let (left, right) = (exit.left, exit.right);

    if at(&*types, 0).is_passable() {
        return;
    }

    let sw_here = at(&*types, 0) == NavType::Swervible;

    let already_reachable = ((sw_here || left > 0) && at(&*types, -1).is_open())
        || ((sw_here || right > 0) && at(&*types, 1).is_open())
        || (left > 0 && at(&*types, -1) == NavType::Tunnel)
        || (right > 0 && at(&*types, 1) == NavType::Tunnel)
        || (left >= 2 && at(&*types, -2).is_open())
        || (right >= 2 && at(&*types, 2).is_open())
        || (left > 0 && sw_here && at(&*types, -1) == NavType::Swervible && at(&*types, -2).is_open())
        || (right > 0 && sw_here && at(&*types, 1) == NavType::Swervible && at(&*types, 2).is_open());
    if already_reachable {
        return;
    }

    let may_open = flags.allow_swervible || flags.allow_passable;
    let mut choices: Vec<isize> = Vec::with_capacity(4);
    if may_open || left > 0 {
        choices.push(-1);
    }
    if may_open || right > 0 {
        choices.push(1);
    }
    if left > 0 && may_open {
        choices.push(-2);
    }
    if right > 0 && may_open {
        choices.push(2);
    }
    let choice = rng.choose_copied(&choices).unwrap_or(0);
    let target = wrap(i + choice, n);

    if (choice < 0 && left == 0) || (choice > 0 && right == 0) {
        // No budget that way: the ship has to swerve through slot i itself.
        if flags.allow_swervible && !at(&*types, 0).is_open() {
            types[wrap(i, n)] = NavType::Swervible;
            types[target] = NavType::Passable;
        } else {
            if at(&*types, 0) != NavType::Empty {
                types[wrap(i, n)] = NavType::Passable;
            }
            return;
        }
    } else {
        types[target] = if flags.allow_tunnel {
            NavType::Tunnel
        } else if flags.allow_passable {
            NavType::Passable
        } else {
            NavType::Empty
        };
    }

    if choice.abs() == 2 {
        let middle = wrap(i + choice / 2, n);
        if middle != target {
            debug_assert!(types[middle] != NavType::Tunnel, "cannot swerve through a tunnel");
            if types[middle] == NavType::Tunnel {
                error!(slot = middle, "Swerve path crosses a tunnel, leaving it open");
            } else {
                types[middle] = NavType::Swervible;
            }
        }
    }
}

/// Whether an exit of the previous ring can reach an open slot of `types`.
///
/// The ship starts at `exit.index`. Each step sideways spends one unit of
/// the swerve budget in that direction; without budget it may still step
/// sideways out of a swervible slot. Tunnels cannot be swerved out of.
/// The exit is reachable if any slot the ship can get to is passable.
#[must_use]
pub fn is_reachable(types: &[NavType], exit: &Exit) -> bool {
    let n = types.len();
    if n == 0 {
        return false;
    }

    let start = (exit.index % n, exit.left, exit.right);
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some((slot, left, right)) = queue.pop_front() {
        let here = types[slot];
        if here.is_passable() {
            return true;
        }

        for step in [-1isize, 1] {
            let budget = if step < 0 { left } else { right };
            let next_budgets = if budget > 0 {
                if step < 0 {
                    (left - 1, right)
                } else {
                    (left, right - 1)
                }
            } else if here == NavType::Swervible {
                (left, right)
            } else {
                continue;
            };
            let state = (wrap(slot as isize + step, n), next_budgets.0, next_budgets.1);
            if seen.insert(state) {
                queue.push_back(state);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use donk_core::RunSeed;
    use crate::nav::NavType::{Empty, Impassable, Passable, Swervible, Tunnel};

    const ALL_FLAGS: SolveFlags = SolveFlags::new(true, true, true);

    #[test]
    fn test_remap_equal_and_widening() {
        let exits = [Exit::new(2, 1, 0), Exit::new(5, 0, 2)];
        assert_eq!(remap_exits(8, 8, &exits), ExitRemap::Preserved(exits.to_vec()));
        assert_eq!(
            remap_exits(8, 24, &exits),
            ExitRemap::Preserved(vec![Exit::new(6, 1, 0), Exit::new(15, 0, 2)])
        );
    }

    #[test]
    fn test_remap_narrowing_rebudgets() {
        let exits = [Exit::new(3, 0, 0), Exit::new(4, 0, 0), Exit::new(5, 0, 0), Exit::new(9, 1, 1)];
        assert_eq!(
            remap_exits(12, 4, &exits),
            ExitRemap::Preserved(vec![Exit::new(1, 1, 1), Exit::new(3, 2, 1)])
        );
    }

    #[test]
    fn test_remap_discontinuous() {
        assert_eq!(remap_exits(20, 7, &[Exit::new(0, 1, 1)]), ExitRemap::Discontinuous);
        assert_eq!(remap_exits(20, 40, &[]), ExitRemap::Discontinuous);
    }

    #[test]
    fn test_degraded_fill_is_uniform() {
        let mut rng = SeededRng::new(RunSeed::new(3));
        let types = solve(&mut rng, 7, 20, &[Exit::new(4, 2, 2)], ALL_FLAGS);
        assert_eq!(types.len(), 7);
        assert!(types.iter().all(|t| *t == types[0] && t.is_passable()));

        let types = solve(&mut rng, 7, 20, &[], SolveFlags::TUNNELS_ONLY);
        assert!(types.iter().all(|t| *t == Tunnel));

        let types = solve(&mut rng, 7, 20, &[], SolveFlags::WALL);
        assert!(types.iter().all(|t| *t == Passable));
    }

    #[test]
    fn test_every_exit_reachable() {
        let flag_sets = [
            ALL_FLAGS,
            SolveFlags::new(true, true, false),
            SolveFlags::WALL,
            SolveFlags::TUNNELS_ONLY,
        ];

        for seed in 0..200u64 {
            let mut rng = SeededRng::new(RunSeed::new(seed));
            let count = 1 + rng.range(0..24);
            let mut exits = Vec::new();
            for i in 0..count {
                if rng.next_f32() < 0.3 {
                    let (left, right) = (rng.range(0..3) as u8, rng.range(0..3) as u8);
                    exits.push(Exit::new(i, left, right));
                }
            }

            for flags in flag_sets {
                let types = solve(&mut rng, count, count, &exits, flags);
                assert_eq!(types.len(), count);
                for exit in &exits {
                    assert!(
                        is_reachable(&types, exit),
                        "seed {seed}: {exit:?} unreachable in {types:?} with {flags:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_reachable_after_narrowing() {
        for seed in 0..100u64 {
            let mut rng = SeededRng::new(RunSeed::new(seed));
            let exits: Vec<Exit> = (0..30).filter(|i| i % 4 == 0).map(|i| Exit::new(i, 2, 2)).collect();
            let types = solve(&mut rng, 10, 30, &exits, SolveFlags::TUNNELS_ONLY);

            let ExitRemap::Preserved(remapped) = remap_exits(30, 10, &exits) else {
                panic!("30 -> 10 must remap");
            };
            for exit in &remapped {
                assert!(is_reachable(&types, exit), "seed {seed}: {exit:?} in {types:?}");
            }
        }
    }

    #[test]
    fn test_solver_determinism() {
        let exits = [Exit::new(1, 1, 1), Exit::new(6, 0, 2)];
        let a = solve(&mut SeededRng::new(RunSeed::new(77)), 12, 12, &exits, ALL_FLAGS);
        let b = solve(&mut SeededRng::new(RunSeed::new(77)), 12, 12, &exits, ALL_FLAGS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reachability_rules() {
        // Budget moves ignore what they pass over
        assert!(is_reachable(&[Passable, Impassable, Impassable], &Exit::new(2, 0, 1)));
        assert!(!is_reachable(&[Passable, Impassable, Impassable, Impassable], &Exit::new(2, 0, 0)));
        // A swervible slot lets the ship slide sideways for free
        assert!(is_reachable(&[Impassable, Swervible, Empty, Impassable], &Exit::new(1, 0, 0)));
        assert!(is_reachable(
            &[Impassable, Empty, Swervible, Swervible, Impassable],
            &Exit::new(3, 1, 0)
        ));
        // Budget does not carry through an impassable slot without swervible help
        assert!(!is_reachable(&[Impassable, Impassable, Impassable, Passable, Impassable, Impassable], &Exit::new(0, 0, 2)));
        assert!(is_reachable(&[Tunnel], &Exit::new(0, 0, 0)));
        assert!(!is_reachable(&[], &Exit::new(0, 1, 1)));
    }

    #[test]
    fn test_zero_slot_ring_degrades() {
        // Debug builds assert on this contract violation.
        if cfg!(debug_assertions) {
            return;
        }
        let mut rng = SeededRng::new(RunSeed::new(1));
        assert_eq!(solve(&mut rng, 0, 4, &[], ALL_FLAGS), vec![Passable]);
    }
}
