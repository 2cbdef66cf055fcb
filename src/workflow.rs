//! Order workflow rules: the status state machine, order id generation and
//! delivery-time parsing. Everything here is pure so the transition rules can
//! be exercised without a database; the route handlers own the persistence.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Format accepted for the requested delivery time, e.g. "Aug 23 2026 18:30:00".
pub const DELIVERY_TIME_FORMAT: &str = "%b %d %Y %H:%M:%S";

/// Order lifecycle states. PLACED → APPROVED → READY are manager-driven,
/// READY → PICKED → DELIVERED are agent-driven, REJECTED is a terminal
/// side-branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Placed,
    Approved,
    Ready,
    Picked,
    Delivered,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Placed,
        Status::Approved,
        Status::Ready,
        Status::Picked,
        Status::Delivered,
        Status::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Placed => "PLACED",
            Status::Approved => "APPROVED",
            Status::Ready => "READY",
            Status::Picked => "PICKED",
            Status::Delivered => "DELIVERED",
            Status::Rejected => "REJECTED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Placed => "Placed",
            Status::Approved => "Approved",
            Status::Ready => "Ready",
            Status::Picked => "Picked",
            Status::Delivered => "Delivered",
            Status::Rejected => "Rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.as_str() == raw)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manager-initiated edges. Rejection is accepted from any prior state; the
/// upstream product rule only ever exercises it from PLACED and APPROVED.
pub fn manager_transition_allowed(from: Status, to: Status) -> bool {
    matches!(
        (from, to),
        (Status::Placed, Status::Approved) | (Status::Approved, Status::Ready) | (_, Status::Rejected)
    )
}

/// Agent-initiated edges. Pickup requires a READY order; delivery requires a
/// PICKED order that was claimed by the acting agent. Any target outside
/// {PICKED, DELIVERED} is denied.
pub fn agent_transition_allowed(
    current: Status,
    target: Status,
    assigned_agent: Option<i32>,
    acting_agent: i32,
) -> bool {
    match target {
        Status::Picked => current == Status::Ready,
        Status::Delivered => current == Status::Picked && assigned_agent == Some(acting_agent),
        _ => false,
    }
}

/// Line price frozen onto an order item at creation time.
pub fn line_price(unit_price: f32, quantity: i32) -> f32 {
    unit_price * quantity as f32
}

/// Order totals from (line price, quantity) pairs. Keeps the stored totals
/// equal to the sums over the order's items by construction.
pub fn order_totals(lines: &[(f32, i32)]) -> (f32, i32) {
    lines.iter().fold((0.0, 0), |(price, quantity), (p, q)| {
        (price + p, quantity + q)
    })
}

#[derive(Serialize, ToSchema)]
pub struct StatusOption {
    pub value: &'static str,
    pub text: &'static str,
}

/// Dropdown options for the manager UI: the statuses a manager can set an
/// order to. Presentation metadata, not transition logic.
pub fn manager_status_dropdown() -> Vec<StatusOption> {
    Status::ALL
        .iter()
        .filter(|s| !matches!(s, Status::Placed | Status::Picked | Status::Delivered))
        .map(|s| StatusOption {
            value: s.as_str(),
            text: s.label(),
        })
        .collect()
}

/// Human-readable order identifier: ORDER<YYYY><MM><DD><seq3>. The sequence
/// is the global order count plus one, zero-padded to three digits (it keeps
/// growing past 999). Callers must compute the count inside the creation
/// transaction so concurrent placements are serialized by the insert.
pub fn order_uid(date: NaiveDate, seq: i64) -> String {
    format!("ORDER{}{:03}", date.format("%Y%m%d"), seq)
}

pub fn parse_delivery_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DELIVERY_TIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_can_advance_one_stage_at_a_time() {
        assert!(manager_transition_allowed(Status::Placed, Status::Approved));
        assert!(manager_transition_allowed(Status::Approved, Status::Ready));
        // Skipping APPROVED is not allowed.
        assert!(!manager_transition_allowed(Status::Placed, Status::Ready));
        assert!(!manager_transition_allowed(Status::Approved, Status::Approved));
        assert!(!manager_transition_allowed(Status::Ready, Status::Picked));
        assert!(!manager_transition_allowed(Status::Delivered, Status::Approved));
    }

    #[test]
    fn rejection_is_allowed_from_any_state() {
        for from in Status::ALL {
            assert!(manager_transition_allowed(from, Status::Rejected));
        }
    }

    #[test]
    fn agent_can_pick_ready_orders_only() {
        assert!(agent_transition_allowed(Status::Ready, Status::Picked, None, 1));
        assert!(!agent_transition_allowed(Status::Placed, Status::Picked, None, 1));
        assert!(!agent_transition_allowed(Status::Approved, Status::Picked, None, 1));
        assert!(!agent_transition_allowed(Status::Picked, Status::Picked, Some(1), 1));
    }

    #[test]
    fn only_the_claiming_agent_may_deliver() {
        assert!(agent_transition_allowed(Status::Picked, Status::Delivered, Some(1), 1));
        // A different agent is refused even though the order is PICKED.
        assert!(!agent_transition_allowed(Status::Picked, Status::Delivered, Some(1), 2));
        // An unassigned order cannot be delivered.
        assert!(!agent_transition_allowed(Status::Picked, Status::Delivered, None, 1));
        assert!(!agent_transition_allowed(Status::Ready, Status::Delivered, Some(1), 1));
    }

    #[test]
    fn agent_targets_outside_picked_and_delivered_are_denied() {
        for target in [Status::Placed, Status::Approved, Status::Ready, Status::Rejected] {
            assert!(!agent_transition_allowed(Status::Ready, target, None, 1));
        }
    }

    #[test]
    fn dropdown_excludes_placed_picked_and_delivered() {
        let values: Vec<&str> = manager_status_dropdown()
            .iter()
            .map(|opt| opt.value)
            .collect();
        assert_eq!(values, vec!["APPROVED", "READY", "REJECTED"]);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in Status::ALL {
            assert_eq!(Status::parse(status.as_str()), Some(status));
        }
        assert_eq!(Status::parse("SHIPPED"), None);
        assert_eq!(Status::parse("placed"), None);
    }

    #[test]
    fn order_totals_are_the_sums_over_the_lines() {
        // 2x a 10.00 food and 1x a 20.00 food.
        let lines = [
            (line_price(10.0, 2), 2),
            (line_price(20.0, 1), 1),
        ];
        assert_eq!(lines[0].0, 20.0);
        let (total_price, total_quantity) = order_totals(&lines);
        assert_eq!(total_price, 40.0);
        assert_eq!(total_quantity, 3);

        let sum_price: f32 = lines.iter().map(|(p, _)| p).sum();
        let sum_quantity: i32 = lines.iter().map(|(_, q)| q).sum();
        assert_eq!(total_price, sum_price);
        assert_eq!(total_quantity, sum_quantity);
    }

    #[test]
    fn order_totals_of_no_lines_are_zero() {
        assert_eq!(order_totals(&[]), (0.0, 0));
    }

    #[test]
    fn order_uid_encodes_date_and_padded_sequence() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(order_uid(date, 7), "ORDER20260823007");
        assert_eq!(order_uid(date, 123), "ORDER20260823123");
        // The padding widens rather than truncates.
        assert_eq!(order_uid(date, 1234), "ORDER202608231234");
    }

    #[test]
    fn delivery_time_parses_the_fixed_format_only() {
        let parsed = parse_delivery_time("Aug 23 2026 18:30:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-23T18:30:00+00:00");
        assert!(parse_delivery_time("2026-08-23 18:30").is_none());
        assert!(parse_delivery_time("").is_none());
    }
}
