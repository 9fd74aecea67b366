//! Date-keyed joins.

use std::cmp::Ordering;

use eventcar_primitives::Date;

use crate::UtilsError;

/// Check that `rows` are keyed by strictly ascending dates.
///
/// # Errors
/// Returns `UtilsError::DuplicateDate` or `UtilsError::Unsorted` at the first violation.
pub fn ensure_ascending<T>(rows: &[T], date_of: impl Fn(&T) -> Date) -> Result<(), UtilsError> {
    for (i, w) in rows.windows(2).enumerate() {
        let (prev, next) = (date_of(&w[0]), date_of(&w[1]));
        match prev.cmp(&next) {
            Ordering::Less => {}
            Ordering::Equal => return Err(UtilsError::DuplicateDate(next)),
            Ordering::Greater => return Err(UtilsError::Unsorted { position: i + 1, date: next }),
        }
    }
    Ok(())
}

/// Left join `rows` onto the `axis` dates.
///
/// Every axis date appears exactly once in the output; rows whose date is not
/// on the axis are dropped.
///
/// # Errors
/// Returns `UtilsError` if `axis` or `rows` are not strictly ascending.
pub fn left_join_dates<'a, T>(
    axis: &[Date],
    rows: &'a [T],
    date_of: impl Fn(&T) -> Date,
) -> Result<Vec<(Date, Option<&'a T>)>, UtilsError> {
    ensure_ascending(axis, |d| *d)?;
    ensure_ascending(rows, &date_of)?;

    let mut out = Vec::with_capacity(axis.len());
    let mut j = 0;
    for &day in axis {
        while j < rows.len() && date_of(&rows[j]) < day {
            j += 1;
        }
        let hit = rows.get(j).filter(|r| date_of(r) == day);
        out.push((day, hit));
    }
    Ok(out)
}

/// Inner join two date-keyed sequences on exact date equality.
///
/// # Errors
/// Returns `UtilsError` if either side is not strictly ascending.
pub fn inner_join_dates<'a, 'b, A, B>(
    left: &'a [A],
    left_date: impl Fn(&A) -> Date,
    right: &'b [B],
    right_date: impl Fn(&B) -> Date,
) -> Result<Vec<(&'a A, &'b B)>, UtilsError> {
    ensure_ascending(left, &left_date)?;
    ensure_ascending(right, &right_date)?;

    let mut out = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        match left_date(&left[i]).cmp(&right_date(&right[j])) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push((&left[i], &right[j]));
                i += 1;
                j += 1;
            }
        }
    }
    Ok(out)
}
