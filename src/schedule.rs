use crate::model::{Agent, Day};
use rand::prelude::*;

/// Whether agents meet on `day`.
///
/// With weekends enabled, days whose one-based index is a multiple of 6 or 7
/// are skipped. Day 0 is always a contact day.
pub fn is_contact_day(day: Day, weekend_enabled: bool) -> bool {
    if !weekend_enabled || day == 0 {
        return true;
    }
    (day + 1) % 6 != 0 && (day + 1) % 7 != 0
}

/// Run every ordered encounter of `day` and return the number of new infections.
///
/// Agents are updated in place, so an agent infected earlier in the day is
/// already visible to later pairs.
pub fn run_day<R: Rng + ?Sized>(
    agt_vec: &mut [Agent],
    day: Day,
    weekend_enabled: bool,
    rng: &mut R,
) -> usize {
    if !is_contact_day(day, weekend_enabled) {
        return 0;
    }

    let n_agt = agt_vec.len();
    let mut n_new = 0;
    for i_agt in 0..n_agt {
        for i_peer in 0..n_agt {
            // Self-encounters never transmit.
            if i_agt == i_peer {
                continue;
            }
            let (agt, peer) = pair_mut(agt_vec, i_agt, i_peer);
            n_new += agt.encounter(peer, day, rng);
        }
    }
    n_new
}

fn pair_mut(agt_vec: &mut [Agent], i_agt: usize, i_peer: usize) -> (&mut Agent, &Agent) {
    if i_agt < i_peer {
        let (head, tail) = agt_vec.split_at_mut(i_peer);
        (&mut head[i_agt], &tail[0])
    } else {
        let (head, tail) = agt_vec.split_at_mut(i_agt);
        (&mut tail[0], &head[i_peer])
    }
}
