//! Support ticket generation.

pub use sim_core::{STANDARD_EXPIRY_TICKS, VIP_EXPIRY_TICKS};
use sim_core::{IssueType, RandomSource, SupportTicket, TicketId};

/// Hosts with fewer subscribers never receive tickets.
pub const MIN_USERS_FOR_TICKETS: u64 = 5;
const VIP_PROBABILITY: f64 = 0.1;

/// Per-tick probability that a ticket is opened.
pub fn ticket_probability(overselling_ratio: f64, ddos_severity: f64) -> f64 {
    let mut p = 0.005;
    if overselling_ratio > 1.2 {
        p += 0.01;
    }
    if overselling_ratio > 1.5 {
        p += 0.02;
    }
    if ddos_severity > 0.0 {
        p += 0.05;
    }
    p
}

/// Issue types a new ticket may carry; grows with service degradation.
pub fn issue_pool(overselling_ratio: f64, ddos_severity: f64) -> Vec<IssueType> {
    let mut pool = vec![IssueType::Question];
    if overselling_ratio > 1.2 {
        pool.push(IssueType::Slow);
    }
    if ddos_severity > 0.0 || overselling_ratio > 2.0 {
        pool.push(IssueType::Down);
        pool.push(IssueType::Refund);
    }
    if ddos_severity > 0.0 {
        pool.push(IssueType::Attack);
    }
    pool
}

/// Possibly open one ticket.
pub fn generate_ticket<R: RandomSource + ?Sized>(
    id: TicketId,
    day: u32,
    total_users: u64,
    overselling_ratio: f64,
    ddos_severity: f64,
    rng: &mut R,
) -> Option<SupportTicket> {
    if total_users < MIN_USERS_FOR_TICKETS {
        return None;
    }
    if !rng.chance(ticket_probability(overselling_ratio, ddos_severity)) {
        return None;
    }
    let pool = issue_pool(overselling_ratio, ddos_severity);
    let issue_type = pool[rng.index(pool.len())];
    let is_vip = rng.chance(VIP_PROBABILITY);
    let number = rng.int_inclusive(0, 999);
    let difficulty = rng.int_inclusive(1, 3) as u8;
    Some(SupportTicket {
        id,
        user_id: format!("{}{number}", if is_vip { "VIP_" } else { "User_" }),
        is_vip,
        issue_type,
        created_on_day: day,
        expires_in_ticks: if is_vip {
            VIP_EXPIRY_TICKS
        } else {
            STANDARD_EXPIRY_TICKS
        },
        difficulty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::ScriptedRng;

    #[test]
    fn small_hosts_are_left_alone() {
        let mut rng = ScriptedRng::constant(0.0);
        assert!(generate_ticket(TicketId(1), 3, 4, 9.0, 3.0, &mut rng).is_none());
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn probability_stacks() {
        assert!((ticket_probability(1.0, 0.0) - 0.005).abs() < 1e-12);
        assert!((ticket_probability(1.3, 0.0) - 0.015).abs() < 1e-12);
        assert!((ticket_probability(1.6, 0.5) - 0.085).abs() < 1e-12);
    }

    #[test]
    fn pool_grows_with_severity() {
        assert_eq!(issue_pool(1.0, 0.0), vec![IssueType::Question]);
        assert_eq!(issue_pool(2.5, 0.0).len(), 4);
        assert_eq!(issue_pool(0.5, 1.0).len(), 4);
        assert_eq!(issue_pool(2.5, 1.0).len(), 5);
    }

    #[test]
    fn vip_ticket_fields() {
        // trigger, issue index, vip, user number, difficulty
        let mut rng = ScriptedRng::new(vec![0.0, 0.99, 0.05, 0.4215, 0.5]);
        let t = generate_ticket(TicketId(9), 12, 50, 0.5, 1.0, &mut rng).unwrap();
        assert_eq!(t.issue_type, IssueType::Attack);
        assert!(t.is_vip);
        assert_eq!(t.user_id, "VIP_421");
        assert_eq!(t.expires_in_ticks, VIP_EXPIRY_TICKS);
        assert_eq!(t.difficulty, 2);
        assert_eq!(t.created_on_day, 12);
    }

    #[test]
    fn standard_ticket_expires_later() {
        let mut rng = ScriptedRng::new(vec![0.0, 0.0, 0.9, 0.0, 0.0]);
        let t = generate_ticket(TicketId(2), 1, 5, 1.0, 0.0, &mut rng).unwrap();
        assert_eq!(t.issue_type, IssueType::Question);
        assert_eq!(t.user_id, "User_0");
        assert_eq!(t.expires_in_ticks, STANDARD_EXPIRY_TICKS);
        assert_eq!(t.difficulty, 1);
    }
}
