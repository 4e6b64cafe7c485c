//! Recurrence rules for recurring transaction templates.
//!
//! A recurring transaction is a single stored row; the dates it falls on are
//! computed on demand with the predicates below. Nothing here touches the
//! database or the wall clock: the candidate date is always an argument, so
//! callers that need a list of occurrences iterate candidate days and query
//! [`occurs_on`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Monthly,
    Yearly,
    Custom,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::InvalidRecurrence(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

/// Recurrence template fields of a transaction.
///
/// The transaction's own date is the anchor and is passed separately to the
/// predicates, so a `Recurrence` value stays valid when the transaction date
/// is edited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    /// Day of month (1-31). Required for `Monthly`, unused otherwise.
    pub day_of_month: Option<u32>,
    /// Interval in days. Required for `Custom`, unused otherwise.
    pub every_days: Option<u32>,
    /// Last date (inclusive) on which the template still occurs. `None`
    /// recurs indefinitely.
    pub until: Option<NaiveDate>,
}

impl Recurrence {
    pub fn monthly(day_of_month: u32) -> Self {
        Self {
            frequency: Frequency::Monthly,
            day_of_month: Some(day_of_month),
            every_days: None,
            until: None,
        }
    }

    pub fn yearly() -> Self {
        Self {
            frequency: Frequency::Yearly,
            day_of_month: None,
            every_days: None,
            until: None,
        }
    }

    pub fn every_days(every_days: u32) -> Self {
        Self {
            frequency: Frequency::Custom,
            day_of_month: None,
            every_days: Some(every_days),
            until: None,
        }
    }

    #[must_use]
    pub fn until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    pub fn validate(&self) -> ResultEngine<()> {
        match self.frequency {
            Frequency::Monthly => {
                let day = self.day_of_month.ok_or_else(|| {
                    EngineError::InvalidRecurrence("monthly requires day_of_month".to_string())
                })?;
                if !(1..=31).contains(&day) {
                    return Err(EngineError::InvalidRecurrence(
                        "day_of_month must be within 1-31".to_string(),
                    ));
                }
            }
            Frequency::Yearly => {}
            Frequency::Custom => {
                let every = self.every_days.ok_or_else(|| {
                    EngineError::InvalidRecurrence("custom requires every_days".to_string())
                })?;
                if every == 0 {
                    return Err(EngineError::InvalidRecurrence(
                        "every_days must be > 0".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Returns whether the template occurs on `on`, given the transaction date
/// `anchor`.
///
/// A day-of-month that does not exist in a month is skipped, never rolled
/// over: a monthly rule on the 31st does not fire in April. The same rule
/// resolves the yearly leap-day question: a template anchored on Feb 29 only
/// fires in leap years.
pub fn occurs_on(recurrence: &Recurrence, anchor: NaiveDate, on: NaiveDate) -> bool {
    if on < anchor {
        return false;
    }
    if let Some(until) = recurrence.until
        && on > until
    {
        return false;
    }

    match recurrence.frequency {
        Frequency::Monthly => recurrence.day_of_month == Some(on.day()),
        Frequency::Yearly => on.month() == anchor.month() && on.day() == anchor.day(),
        Frequency::Custom => {
            let every = match recurrence.every_days {
                Some(every) if every > 0 => i64::from(every),
                _ => return false,
            };
            (on - anchor).num_days() % every == 0
        }
    }
}

/// Exact number of occurrences in `[from, to]`, counted day by day.
pub fn occurrence_count(
    recurrence: &Recurrence,
    anchor: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
) -> u32 {
    days(from, to)
        .filter(|day| occurs_on(recurrence, anchor, *day))
        .count() as u32
}

/// Exact occurrence dates in `[from, to]`, for calendar display.
pub fn occurrences_in_range(
    recurrence: &Recurrence,
    anchor: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<NaiveDate> {
    days(from, to)
        .filter(|day| occurs_on(recurrence, anchor, *day))
        .collect()
}

/// Coarse estimate of how many times a custom-interval template fires in a
/// period of `days_in_period` days.
///
/// This is the days-in-period ÷ interval approximation used for aggregate
/// projections. It can disagree with the exact day-level predicate by one
/// occurrence at period boundaries, so it must never replace [`occurs_on`]
/// for calendar display.
pub fn approx_occurrences_in_period(every_days: u32, days_in_period: u32) -> f64 {
    if every_days == 0 {
        return 0.0;
    }
    f64::from(days_in_period) / f64::from(every_days)
}

fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |day| *day <= to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_on_the_31st_skips_short_months() {
        let recurrence = Recurrence::monthly(31);
        let anchor = date(2025, 1, 31);

        assert!(occurs_on(&recurrence, anchor, date(2025, 3, 31)));
        assert!(occurs_on(&recurrence, anchor, date(2025, 5, 31)));
        // April has 30 days: no occurrence on any April day.
        for day in days(date(2025, 4, 1), date(2025, 4, 30)) {
            assert!(!occurs_on(&recurrence, anchor, day));
        }
    }

    #[test]
    fn monthly_respects_anchor_and_end_bounds() {
        let recurrence = Recurrence::monthly(15).until(date(2025, 6, 15));
        let anchor = date(2025, 3, 15);

        assert!(!occurs_on(&recurrence, anchor, date(2025, 2, 15)));
        assert!(occurs_on(&recurrence, anchor, date(2025, 3, 15)));
        assert!(occurs_on(&recurrence, anchor, date(2025, 6, 15)));
        assert!(!occurs_on(&recurrence, anchor, date(2025, 7, 15)));
    }

    #[test]
    fn yearly_matches_anchor_month_and_day() {
        let recurrence = Recurrence::yearly();
        let anchor = date(2023, 11, 5);

        assert!(occurs_on(&recurrence, anchor, date(2024, 11, 5)));
        assert!(!occurs_on(&recurrence, anchor, date(2024, 11, 6)));
        assert!(!occurs_on(&recurrence, anchor, date(2024, 12, 5)));
    }

    #[test]
    fn yearly_leap_day_skips_non_leap_years() {
        let recurrence = Recurrence::yearly();
        let anchor = date(2024, 2, 29);

        assert_eq!(occurrence_count(&recurrence, anchor, date(2025, 1, 1), date(2025, 12, 31)), 0);
        assert!(occurs_on(&recurrence, anchor, date(2028, 2, 29)));
    }

    #[test]
    fn custom_every_seven_days() {
        let recurrence = Recurrence::every_days(7);
        let anchor = date(2025, 1, 1);

        assert!(occurs_on(&recurrence, anchor, date(2025, 1, 15)));
        assert!(!occurs_on(&recurrence, anchor, date(2025, 1, 16)));
        assert!(!occurs_on(&recurrence, anchor, date(2024, 12, 25)));
    }

    #[test]
    fn occurrence_count_counts_exact_days() {
        let recurrence = Recurrence::every_days(7);
        let anchor = date(2025, 1, 1);

        // Jan 1, 8, 15, 22, 29.
        assert_eq!(
            occurrence_count(&recurrence, anchor, date(2025, 1, 1), date(2025, 1, 31)),
            5
        );
        assert_eq!(
            occurrences_in_range(&recurrence, anchor, date(2025, 1, 1), date(2025, 1, 14)),
            vec![date(2025, 1, 1), date(2025, 1, 8)]
        );
    }

    #[test]
    fn coarse_estimate_disagrees_with_exact_count_at_boundaries() {
        let recurrence = Recurrence::every_days(7);
        let anchor = date(2025, 1, 1);

        // 31 days / 7 ≈ 4.43, but January holds 5 exact occurrences: the two
        // code paths are intentionally distinct.
        let coarse = approx_occurrences_in_period(7, 31);
        let exact = occurrence_count(&recurrence, anchor, date(2025, 1, 1), date(2025, 1, 31));
        assert!((coarse - 31.0 / 7.0).abs() < f64::EPSILON);
        assert_eq!(exact, 5);
        assert!(coarse < f64::from(exact));
    }

    #[test]
    fn validate_rejects_inconsistent_fields() {
        assert!(Recurrence::monthly(31).validate().is_ok());
        assert!(Recurrence::monthly(0).validate().is_err());
        assert!(Recurrence::monthly(32).validate().is_err());
        assert!(Recurrence::every_days(0).validate().is_err());
        assert!(Recurrence::yearly().validate().is_ok());

        let missing_day = Recurrence {
            frequency: Frequency::Monthly,
            day_of_month: None,
            every_days: None,
            until: None,
        };
        assert!(missing_day.validate().is_err());
    }
}
