//! Reconciliation of the period list on manifest refresh.

use std::collections::HashSet;

use crate::{
    error::{ManifestError, ManifestResult},
    period::SharedPeriod,
};

/// Make `old` match `new` positionally, updating in place the periods of `old` whose id is found
/// in `new`.
///
/// Periods of `old` without a counterpart are dropped, periods of `new` without a counterpart are
/// inserted as they are. The whole plan is checked before anything is touched, so on error `old`
/// and every period it references are left unchanged.
pub fn update_periods(old: &mut Vec<SharedPeriod>, new: Vec<SharedPeriod>) -> ManifestResult<()> {
    let plan = plan_update(old, &new)?;

    let mut updated = 0;
    let periods = new
        .into_iter()
        .zip(plan)
        .map(|(new_period, matched)| match matched {
            Some(index) => {
                let old_period = old[index].clone();
                if !old_period.ptr_eq(&new_period) {
                    old_period.update_in_place(new_period.into_period());
                }
                updated += 1;
                old_period
            }
            None => new_period,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        updated,
        added = periods.len() - updated,
        removed = old.len() - updated,
        "Periods reconciled"
    );
    *old = periods;
    Ok(())
}

/// Replace every period of `old` by the ones of `new`, without keeping any handle.
pub fn replace_periods(old: &mut Vec<SharedPeriod>, new: Vec<SharedPeriod>) {
    tracing::debug!(removed = old.len(), added = new.len(), "Periods replaced");
    *old = new;
}

/// For every period of `new`, the index of the period of `old` it updates.
fn plan_update(old: &[SharedPeriod], new: &[SharedPeriod]) -> ManifestResult<Vec<Option<usize>>> {
    let new_periods: Vec<(String, f64)> = new.iter().map(|p| (p.id(), p.start())).collect();
    let old_ids: Vec<String> = old.iter().map(SharedPeriod::id).collect();

    for pair in new_periods.windows(2) {
        let ((previous, previous_start), (next, next_start)) = (&pair[0], &pair[1]);
        if next_start < previous_start {
            return Err(ManifestError::UnorderedPeriods {
                previous: previous.clone(),
                previous_start: *previous_start,
                next: next.clone(),
                next_start: *next_start,
            });
        }
    }

    let mut seen = HashSet::with_capacity(new_periods.len());
    for (id, _) in &new_periods {
        if !seen.insert(id.as_str()) {
            return Err(ManifestError::DuplicatePeriodId(id.clone()));
        }
    }

    let mut next_candidate = 0;
    let mut plan = Vec::with_capacity(new_periods.len());
    for (id, _) in &new_periods {
        let matched = old_ids[next_candidate..]
            .iter()
            .position(|old_id| old_id == id)
            .map(|offset| next_candidate + offset);
        match matched {
            Some(index) => {
                next_candidate = index + 1;
                plan.push(Some(index));
            }
            None if old_ids[..next_candidate].contains(id) => {
                return Err(ManifestError::PeriodOrderMismatch(id.clone()));
            }
            None => plan.push(None),
        }
    }
    Ok(plan)
}
