//! Attaches role time constraints fetched in bulk to their owning roles.
//!
//! Constraints are read with a single query and joined in memory, in two
//! passes: group by owning role, then attach per role. Both passes are pure.

use crate::models::{Oid, Role, TimeConstraint};
use std::collections::HashMap;

/// Groups constraints by owning role, keeping source order within each role.
pub fn group_time_constraints(
    constraints: Vec<TimeConstraint>,
) -> HashMap<Oid, Vec<TimeConstraint>> {
    let mut by_role: HashMap<Oid, Vec<TimeConstraint>> = HashMap::new();
    for constraint in constraints {
        by_role.entry(constraint.oid).or_default().push(constraint);
    }
    by_role
}

/// Gives every role its constraints. Roles without any get an empty list.
pub fn attach_time_constraints(
    roles: &mut [Role],
    mut by_role: HashMap<Oid, Vec<TimeConstraint>>,
) {
    for role in roles.iter_mut() {
        role.time_constraints = by_role.remove(&role.oid).unwrap_or_default();
    }

    if !by_role.is_empty() {
        tracing::debug!(
            "Ignoring time constraints for {} roles not present in pg_authid",
            by_role.len()
        );
    }
}
