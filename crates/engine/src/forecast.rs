//! Balance forecasting.
//!
//! Projects a day-by-day balance series for a set of accounts, blending
//! recurring templates (via the recurrence predicates), known one-time future
//! transactions, and an estimated baseline for everyday non-recurring
//! spending. The projection is a derived view: it never writes back to the
//! store, and the reference date is always an argument.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Transaction, TransactionKind, recurrence};

#[derive(Clone, Debug)]
pub struct ForecastOptions {
    pub horizon_days: u32,
    /// Blend in the estimated non-recurring expense baseline on days where
    /// no known transaction produces an expense.
    pub include_estimate: bool,
    /// Restrict the baseline to these categories (case-sensitive match on
    /// the stored category).
    pub estimate_categories: Option<Vec<String>>,
    /// Emit only every Nth point; the balance still accumulates every day.
    pub sample_every: u32,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            include_estimate: true,
            estimate_categories: None,
            sample_every: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub balance_minor: i64,
    pub income_minor: i64,
    pub expense_minor: i64,
}

/// Projects the balance of `account_ids` from `starting_balance_minor` over
/// `options.horizon_days` days after `today`.
///
/// `transactions` must contain the transaction history of the account set:
/// past rows feed the estimate baseline, recurring templates and future-dated
/// one-time rows feed the per-day projection.
pub fn project(
    account_ids: &HashSet<Uuid>,
    starting_balance_minor: i64,
    transactions: &[Transaction],
    today: NaiveDate,
    options: &ForecastOptions,
) -> Vec<ForecastPoint> {
    let sample_every = options.sample_every.max(1);
    let baseline = if options.include_estimate {
        monthly_expense_baseline(transactions, today, options.estimate_categories.as_deref())
    } else {
        0.0
    };

    let mut balance = starting_balance_minor;
    let mut points = Vec::with_capacity((options.horizon_days / sample_every) as usize + 1);

    for offset in 1..=options.horizon_days {
        let Some(day) = today.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };

        let mut income_minor = 0i64;
        let mut expense_minor = 0i64;
        for tx in transactions {
            let applies = match &tx.recurrence {
                Some(template) => recurrence::occurs_on(template, tx.occurred_on, day),
                None => tx.occurred_on == day,
            };
            if !applies {
                continue;
            }
            let net = signed_effect(tx, account_ids);
            if net >= 0 {
                income_minor += net;
            } else {
                expense_minor += -net;
            }
        }

        if expense_minor == 0 && options.include_estimate {
            expense_minor += daily_estimate(baseline, day);
        }

        balance += income_minor - expense_minor;
        if offset % sample_every == 0 || offset == options.horizon_days {
            points.push(ForecastPoint {
                date: day,
                balance_minor: balance,
                income_minor,
                expense_minor,
            });
        }
    }

    points
}

/// Net signed effect of one transaction on the account set.
///
/// A transfer with both ends inside the set nets to zero; with one end
/// inside it behaves like an income or an expense for the set.
fn signed_effect(tx: &Transaction, account_ids: &HashSet<Uuid>) -> i64 {
    match tx.kind {
        TransactionKind::Income => {
            if account_ids.contains(&tx.account_id) {
                tx.amount_minor
            } else {
                0
            }
        }
        TransactionKind::Expense => {
            if account_ids.contains(&tx.account_id) {
                -tx.amount_minor
            } else {
                0
            }
        }
        TransactionKind::Transfer => {
            let mut net = 0;
            if account_ids.contains(&tx.account_id) {
                net -= tx.amount_minor;
            }
            if let Some(dest) = tx.dest_account_id
                && account_ids.contains(&dest)
            {
                net += tx.amount_minor;
            }
            net
        }
    }
}

/// Trailing 3-month average of non-recurring expenses, in minor units per
/// month.
fn monthly_expense_baseline(
    transactions: &[Transaction],
    today: NaiveDate,
    categories: Option<&[String]>,
) -> f64 {
    let Some(window_start) = today.checked_sub_days(Days::new(90)) else {
        return 0.0;
    };

    let total: i64 = transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense && tx.recurrence.is_none())
        .filter(|tx| tx.occurred_on >= window_start && tx.occurred_on < today)
        .filter(|tx| match categories {
            Some(allowed) => tx
                .category
                .as_deref()
                .is_some_and(|category| allowed.iter().any(|c| c == category)),
            None => true,
        })
        .map(|tx| tx.amount_minor)
        .sum();

    total as f64 / 3.0
}

/// Estimated spend for one day, front-loaded across the month.
///
/// Spending clusters early in the month (rent, bills, groceries stock-up),
/// so the baseline is weighted 1.5x on days 1-10, 1.0x on 11-20 and 0.5x
/// afterwards, normalized so a full month sums to the monthly baseline.
fn daily_estimate(monthly_baseline: f64, day: NaiveDate) -> i64 {
    if monthly_baseline <= 0.0 {
        return 0;
    }
    let total_weight: f64 = (1..=days_in_month(day)).map(day_weight).sum();
    if total_weight <= 0.0 {
        return 0;
    }
    (monthly_baseline * day_weight(day.day()) / total_weight).round() as i64
}

fn day_weight(day: u32) -> f64 {
    match day {
        1..=10 => 1.5,
        11..=20 => 1.0,
        _ => 0.5,
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|first| first.pred_opt())
        .map_or(30, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Recurrence;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(account: Uuid, amount: i64, on: NaiveDate) -> Transaction {
        Transaction::new(
            "alice".to_string(),
            account,
            None,
            TransactionKind::Expense,
            amount,
            None,
            None,
            on,
            None,
        )
        .unwrap()
    }

    fn no_estimate(horizon_days: u32) -> ForecastOptions {
        ForecastOptions {
            horizon_days,
            include_estimate: false,
            estimate_categories: None,
            sample_every: 1,
        }
    }

    #[test]
    fn monthly_recurring_expense_drops_once() {
        let account = Uuid::new_v4();
        let accounts: HashSet<Uuid> = [account].into();
        let mut template = expense(account, 5000, date(2025, 1, 15));
        template.recurrence = Some(Recurrence::monthly(15));

        let today = date(2025, 3, 1);
        let points = project(&accounts, 100_000, &[template], today, &no_estimate(30));

        assert_eq!(points.len(), 30);
        for point in &points {
            if point.date < date(2025, 3, 15) {
                assert_eq!(point.balance_minor, 100_000);
            } else {
                assert_eq!(point.balance_minor, 95_000);
            }
        }
    }

    #[test]
    fn one_time_future_transaction_applies_on_its_day() {
        let account = Uuid::new_v4();
        let accounts: HashSet<Uuid> = [account].into();
        let future = expense(account, 2_500, date(2025, 3, 10));

        let points = project(&accounts, 10_000, &[future], date(2025, 3, 1), &no_estimate(15));
        let on_day = points.iter().find(|p| p.date == date(2025, 3, 10)).unwrap();
        assert_eq!(on_day.expense_minor, 2_500);
        assert_eq!(points.last().unwrap().balance_minor, 7_500);
    }

    #[test]
    fn transfer_nets_to_zero_across_the_set_but_not_for_one_account() {
        let checking = Uuid::new_v4();
        let savings = Uuid::new_v4();
        let transfer = Transaction::new(
            "alice".to_string(),
            checking,
            Some(savings),
            TransactionKind::Transfer,
            4_000,
            None,
            None,
            date(2025, 3, 5),
            None,
        )
        .unwrap();

        let both: HashSet<Uuid> = [checking, savings].into();
        let points = project(&both, 50_000, std::slice::from_ref(&transfer), date(2025, 3, 1), &no_estimate(10));
        assert_eq!(points.last().unwrap().balance_minor, 50_000);

        let only_checking: HashSet<Uuid> = [checking].into();
        let points = project(&only_checking, 50_000, &[transfer], date(2025, 3, 1), &no_estimate(10));
        assert_eq!(points.last().unwrap().balance_minor, 46_000);
    }

    #[test]
    fn downsampling_keeps_daily_accumulation() {
        let account = Uuid::new_v4();
        let accounts: HashSet<Uuid> = [account].into();
        let mut template = expense(account, 100, date(2025, 1, 1));
        template.recurrence = Some(Recurrence::every_days(1));

        let dense = project(&accounts, 10_000, std::slice::from_ref(&template), date(2025, 3, 1), &no_estimate(30));
        let sparse = project(
            &accounts,
            10_000,
            &[template],
            date(2025, 3, 1),
            &ForecastOptions {
                horizon_days: 30,
                include_estimate: false,
                estimate_categories: None,
                sample_every: 7,
            },
        );

        assert!(sparse.len() < dense.len());
        assert_eq!(
            sparse.last().unwrap().balance_minor,
            dense.last().unwrap().balance_minor
        );
        // The horizon's final day is always emitted.
        assert_eq!(sparse.last().unwrap().date, dense.last().unwrap().date);
    }

    #[test]
    fn estimate_fills_quiet_days_front_loaded() {
        let account = Uuid::new_v4();
        let accounts: HashSet<Uuid> = [account].into();
        // 89 days of one-off spending at 3_000 minor units each.
        let history: Vec<Transaction> = (0..89)
            .map(|n| expense(account, 3_000, date(2025, 1, 1) + Days::new(n)))
            .collect();

        // Projects over exactly April (30 days).
        let today = date(2025, 3, 31);
        let options = ForecastOptions {
            horizon_days: 30,
            include_estimate: true,
            estimate_categories: None,
            sample_every: 1,
        };
        let points = project(&accounts, 500_000, &history, today, &options);

        // Every projected day carries an estimated expense.
        assert!(points.iter().all(|p| p.expense_minor > 0));
        // Early-month days are weighted heavier than late-month days.
        let early = points.iter().find(|p| p.date.day() == 5).unwrap();
        let late = points.iter().find(|p| p.date.day() == 25).unwrap();
        assert!(early.expense_minor > late.expense_minor);
        // A full month of estimates adds up to the monthly baseline, modulo
        // per-day rounding.
        let total: i64 = points.iter().map(|p| p.expense_minor).sum();
        let baseline = 89.0 * 3_000.0 / 3.0;
        assert!((total as f64 - baseline).abs() < 100.0);
    }

    #[test]
    fn estimate_skips_days_with_known_expenses() {
        let account = Uuid::new_v4();
        let accounts: HashSet<Uuid> = [account].into();
        let mut transactions: Vec<Transaction> = (0..90)
            .map(|n| expense(account, 3_000, date(2025, 1, 1) + Days::new(n)))
            .collect();
        let mut rent = expense(account, 80_000, date(2025, 1, 2));
        rent.recurrence = Some(Recurrence::monthly(2));
        transactions.push(rent);

        let points = project(
            &accounts,
            500_000,
            &transactions,
            date(2025, 4, 1),
            &ForecastOptions {
                horizon_days: 10,
                include_estimate: true,
                estimate_categories: None,
                sample_every: 1,
            },
        );

        let rent_day = points.iter().find(|p| p.date == date(2025, 4, 2)).unwrap();
        assert_eq!(rent_day.expense_minor, 80_000);
    }
}
