use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Loan-relative month ordinals keyed by `(loan_id, asof_month)`.
///
/// A loan's earliest observed month is ordinal 0, the next is 1, and so on,
/// independent of the order rows arrive in.
#[derive(Debug, Clone, Default)]
pub struct LoanMonthIndex {
    ordinals: BTreeMap<(u64, NaiveDate), usize>,
    loans: usize,
}

impl LoanMonthIndex {
    pub fn build<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = (u64, NaiveDate)>,
    {
        let mut months: BTreeMap<u64, Vec<NaiveDate>> = BTreeMap::new();
        for (loan_id, month) in keys {
            months.entry(loan_id).or_default().push(month);
        }
        let loans = months.len();
        let mut ordinals = BTreeMap::new();
        for (loan_id, mut ms) in months {
            ms.sort();
            ms.dedup();
            for (idx, m) in ms.into_iter().enumerate() {
                ordinals.insert((loan_id, m), idx);
            }
        }
        LoanMonthIndex { ordinals, loans }
    }

    pub fn month_idx(&self, loan_id: u64, asof_month: NaiveDate) -> Option<usize> {
        self.ordinals.get(&(loan_id, asof_month)).copied()
    }

    pub fn loans(&self) -> usize {
        self.loans
    }

    /// Distinct `(loan, month)` cells.
    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, 1).unwrap()
    }

    #[test]
    fn test_ordinals_ignore_arrival_order() {
        let idx = LoanMonthIndex::build(vec![(7, d(3)), (9, d(5)), (7, d(1)), (7, d(2))]);
        assert_eq!(idx.month_idx(7, d(1)), Some(0));
        assert_eq!(idx.month_idx(7, d(3)), Some(2));
        assert_eq!(idx.month_idx(9, d(5)), Some(0));
        assert_eq!(idx.month_idx(9, d(1)), None);
        assert_eq!(idx.loans(), 2);
        assert_eq!(idx.len(), 4);
    }
}
