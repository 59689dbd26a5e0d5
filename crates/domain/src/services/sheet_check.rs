//! Header-label validation, run before any row is processed.

use crate::models::{LabelMismatch, SheetGrid, ValidationRule};

/// Check every configured label assertion against the worksheet.
///
/// Comparison is exact string equality after trimming only; case and
/// interior whitespace are significant. A non-required rule whose actual
/// cell is empty is satisfied. An empty rule list always passes.
pub fn validate_sheet(
    sheet: &SheetGrid,
    rules: &[ValidationRule],
) -> Result<(), Vec<LabelMismatch>> {
    let mut errors = Vec::new();

    for rule in rules {
        let cell_ref = rule.cell_ref.trim();
        let actual = sheet.cell_at(cell_ref);

        if !rule.is_required && actual.trim().is_empty() {
            continue;
        }

        if actual.trim() != rule.expected_label.trim() {
            errors.push(LabelMismatch {
                cell: cell_ref.to_string(),
                expected: rule.expected_label.clone(),
                actual: actual.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> SheetGrid {
        SheetGrid::new(
            "Sheet1".into(),
            vec![vec!["주문번호".into(), "수취인명".into(), "".into()]],
        )
    }

    fn rule(cell: &str, expected: &str, required: bool) -> ValidationRule {
        ValidationRule {
            id: 1,
            channel_id: 1,
            cell_ref: cell.into(),
            expected_label: expected.into(),
            is_required: required,
        }
    }

    #[test]
    fn test_empty_rule_list_passes() {
        assert!(validate_sheet(&sheet(), &[]).is_ok());
    }

    #[test]
    fn test_matching_labels_pass() {
        let rules = vec![rule("A1", "주문번호", true), rule("B1", "수취인명", true)];
        assert!(validate_sheet(&sheet(), &rules).is_ok());
    }

    #[test]
    fn test_mismatch_is_itemized() {
        let rules = vec![rule("A1", "상품명", true), rule("B1", "수취인명", true)];
        let errors = validate_sheet(&sheet(), &rules).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].cell, "A1");
        assert_eq!(errors[0].expected, "상품명");
        assert_eq!(errors[0].actual, "주문번호");
    }

    #[test]
    fn test_non_required_empty_cell_is_satisfied() {
        let rules = vec![rule("C1", "메모", false)];
        assert!(validate_sheet(&sheet(), &rules).is_ok());
    }

    #[test]
    fn test_required_empty_cell_fails() {
        let rules = vec![rule("C1", "메모", true)];
        let errors = validate_sheet(&sheet(), &rules).unwrap_err();
        assert_eq!(errors[0].actual, "");
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let s = SheetGrid::new("s".into(), vec![vec!["Order No".into()]]);
        let errors = validate_sheet(&s, &[rule("A1", "order no", true)]).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_comparison_trims_both_sides() {
        let s = SheetGrid::new("s".into(), vec![vec!["주문번호".into()]]);
        assert!(validate_sheet(&s, &[rule("A1", " 주문번호 ", true)]).is_ok());
    }
}
