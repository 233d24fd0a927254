use crate::error::{AnalyzerError, Result};
use crate::schema::{FsDiv, LineItem, NormalizedStatement, Period, StatementRow, StatementType};
use log::debug;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

// Tracks one (basis, account) group while scanning the raw items.
struct RowSlot {
    min_ordinal: i64,
    first_seen: usize,
    winner_ordinal: i64,
    row: StatementRow,
}

/// Converts raw line items into the canonical statement for `statement_type`.
///
/// Items of other statement types and items with an unrecognized basis are skipped.
/// Duplicate `(fs_div, account_name)` pairs collapse to the item with the highest ordinal
/// (the later item wins a tie) while the group keeps the lowest ordinal as its position.
/// Missing amounts become zero.
pub fn normalize(
    raw_items: &[LineItem],
    statement_type: StatementType,
) -> Result<NormalizedStatement> {
    let mut groups: BTreeMap<(FsDiv, String), RowSlot> = BTreeMap::new();
    let mut dropped_basis = 0usize;
    let mut merged = 0usize;

    for (idx, item) in raw_items.iter().enumerate() {
        if item.statement_type != statement_type {
            continue;
        }

        let Some(fs_div) = FsDiv::from_code(&item.fs_div) else {
            dropped_basis += 1;
            continue;
        };

        let row = StatementRow {
            account_name: item.account_name.clone(),
            fs_div,
            current: Period {
                amount: item.current_period_amount.unwrap_or(0),
            },
            previous: Period {
                amount: item.previous_period_amount.unwrap_or(0),
            },
        };

        match groups.entry((fs_div, item.account_name.clone())) {
            Entry::Occupied(mut occupied) => {
                merged += 1;
                let slot = occupied.get_mut();
                slot.min_ordinal = slot.min_ordinal.min(item.ordinal);
                if item.ordinal >= slot.winner_ordinal {
                    slot.winner_ordinal = item.ordinal;
                    slot.row = row;
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(RowSlot {
                    min_ordinal: item.ordinal,
                    first_seen: idx,
                    winner_ordinal: item.ordinal,
                    row,
                });
            }
        }
    }

    if groups.is_empty() {
        return Err(AnalyzerError::EmptyStatement { statement_type });
    }

    let mut slots: Vec<RowSlot> = groups.into_values().collect();
    slots.sort_by_key(|slot| (slot.min_ordinal, slot.first_seen));

    debug!(
        "Normalized {}: {} rows ({} duplicates merged, {} rows with unknown basis dropped)",
        statement_type,
        slots.len(),
        merged,
        dropped_basis
    );

    Ok(NormalizedStatement {
        statement_type,
        rows: slots.into_iter().map(|slot| slot.row).collect(),
    })
}

/// Normalizes both modelled statements from one mixed batch of line items.
pub fn normalize_pair(
    raw_items: &[LineItem],
) -> Result<(NormalizedStatement, NormalizedStatement)> {
    let balance_sheet = normalize(raw_items, StatementType::BalanceSheet)?;
    let income_statement = normalize(raw_items, StatementType::IncomeStatement)?;
    Ok((balance_sheet, income_statement))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bs(name: &str, fs_div: FsDiv, current: i64, previous: i64, ordinal: i64) -> LineItem {
        LineItem::new(
            name,
            fs_div,
            StatementType::BalanceSheet,
            Some(current),
            Some(previous),
            ordinal,
        )
    }

    #[test]
    fn test_unique_rows_pass_through_unchanged() {
        let items = vec![
            bs("유동자산", FsDiv::Consolidated, 500, 400, 1),
            bs("자산총계", FsDiv::Consolidated, 1_000_000, 800_000, 3),
            bs("비유동자산", FsDiv::Consolidated, 700, 600, 2),
            bs("자산총계", FsDiv::Separate, 900_000, 700_000, 3),
        ];

        let statement = normalize(&items, StatementType::BalanceSheet).unwrap();
        assert_eq!(statement.len(), 4);

        let names: Vec<_> = statement
            .rows_for(FsDiv::Consolidated)
            .map(|r| r.account_name.as_str())
            .collect();
        assert_eq!(names, vec!["유동자산", "비유동자산", "자산총계"]);

        for item in &items {
            let fs_div = FsDiv::from_code(&item.fs_div).unwrap();
            let row = statement.find(fs_div, &item.account_name).unwrap();
            assert_eq!(Some(row.current.amount), item.current_period_amount);
            assert_eq!(Some(row.previous.amount), item.previous_period_amount);
        }
    }

    #[test]
    fn test_empty_input_is_empty_statement() {
        let err = normalize(&[], StatementType::BalanceSheet).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::EmptyStatement {
                statement_type: StatementType::BalanceSheet
            }
        ));
    }

    #[test]
    fn test_duplicate_highest_ordinal_wins_keeps_lowest_position() {
        let items = vec![
            bs("자산총계", FsDiv::Consolidated, 1, 1, 5),
            bs("부채총계", FsDiv::Consolidated, 2, 2, 3),
            bs("자산총계", FsDiv::Consolidated, 9, 9, 7),
            bs("자산총계", FsDiv::Consolidated, 4, 4, 6),
        ];

        let statement = normalize(&items, StatementType::BalanceSheet).unwrap();
        assert_eq!(statement.len(), 2);
        assert_eq!(statement.rows[0].account_name, "부채총계");
        assert_eq!(statement.rows[1].account_name, "자산총계");
        assert_eq!(statement.rows[1].current.amount, 9);
    }

    #[test]
    fn test_duplicate_ordinal_tie_later_item_wins() {
        let items = vec![
            bs("자본총계", FsDiv::Consolidated, 10, 10, 4),
            bs("자본총계", FsDiv::Consolidated, 20, 20, 4),
        ];

        let statement = normalize(&items, StatementType::BalanceSheet).unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement.rows[0].current.amount, 20);
    }

    #[test]
    fn test_unknown_basis_dropped() {
        let mut odd = bs("자산총계", FsDiv::Consolidated, 1, 1, 1);
        odd.fs_div = "XFS".to_string();
        let items = vec![odd, bs("부채총계", FsDiv::Separate, 3, 2, 2)];

        let statement = normalize(&items, StatementType::BalanceSheet).unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement.rows[0].account_name, "부채총계");
    }

    #[test]
    fn test_only_unknown_basis_is_empty() {
        let mut odd = bs("자산총계", FsDiv::Consolidated, 1, 1, 1);
        odd.fs_div = String::new();
        assert!(normalize(&[odd], StatementType::BalanceSheet).is_err());
    }

    #[test]
    fn test_absent_amounts_zeroed_and_retained() {
        let items = vec![LineItem::new(
            "기타포괄손익",
            FsDiv::Consolidated,
            StatementType::IncomeStatement,
            None,
            None,
            1,
        )];

        let statement = normalize(&items, StatementType::IncomeStatement).unwrap();
        assert_eq!(statement.len(), 1);
        assert_eq!(statement.rows[0].current, Period { amount: 0 });
        assert_eq!(statement.rows[0].previous, Period { amount: 0 });
    }

    #[test]
    fn test_other_statement_type_ignored() {
        let items = vec![
            bs("자산총계", FsDiv::Consolidated, 1, 1, 1),
            LineItem::new(
                "매출액",
                FsDiv::Consolidated,
                StatementType::IncomeStatement,
                Some(100),
                Some(80),
                1,
            ),
        ];

        let (balance_sheet, income_statement) = normalize_pair(&items).unwrap();
        assert_eq!(balance_sheet.len(), 1);
        assert_eq!(income_statement.len(), 1);
        assert_eq!(income_statement.rows[0].account_name, "매출액");
    }

    #[test]
    fn test_negative_amounts_preserved() {
        let items = vec![LineItem::new(
            "당기순이익",
            FsDiv::Consolidated,
            StatementType::IncomeStatement,
            Some(-250),
            Some(100),
            1,
        )];
        let statement = normalize(&items, StatementType::IncomeStatement).unwrap();
        assert_eq!(statement.rows[0].current.amount, -250);
    }
}
