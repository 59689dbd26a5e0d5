//! Field-mapping engine: extracts one field value from one raw row.
//!
//! Selectors never fail; anything unresolved yields the empty string so a
//! misconfigured rule degrades to a missing field instead of aborting an
//! upload.
//!
//! The `expr` selector is a restricted template, evaluated by ordered
//! single-pass regex rewrites (`TRIM`, `DIGITS`, `COALESCE`, `SPLIT`) over
//! the `${A}`-substituted text. It is not a parser; nested calls are not
//! guaranteed correct.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex, RegexBuilder};

use crate::models::{FieldMappingRule, RawRow, SelectorKind};

lazy_static! {
    static ref CELL_SUBST_RE: Regex = Regex::new(r"\$\{([A-Za-z]{1,3})\}").unwrap();
    static ref TRIM_RE: Regex = Regex::new(r"TRIM\((.*?)\)").unwrap();
    static ref DIGITS_RE: Regex = Regex::new(r"DIGITS\((.*?)\)").unwrap();
    static ref COALESCE_RE: Regex = Regex::new(r"COALESCE\((.*?),(.*?)\)").unwrap();
    static ref SPLIT_RE: Regex = Regex::new(r#"SPLIT\((.*?),(.*?),(.*?)\)"#).unwrap();
}

/// Apply one rule to one row.
pub fn apply(row: &RawRow, rule: &FieldMappingRule) -> String {
    match rule.selector_kind {
        // header_text selectors are resolved to columns when the rule is
        // configured, so both kinds read a column here.
        SelectorKind::ColRef | SelectorKind::HeaderText => {
            row.cell(&rule.selector_value).to_string()
        }
        SelectorKind::Regex => apply_regex(row, &rule.selector_value),
        SelectorKind::Expr => apply_expr(row, &rule.selector_value),
    }
}

/// Apply every rule in order; later rules overwrite earlier ones on the same
/// field key.
pub fn apply_all(row: &RawRow, rules: &[FieldMappingRule]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for rule in rules {
        out.insert(rule.field_key.clone(), apply(row, rule));
    }
    out
}

fn apply_regex(row: &RawRow, pattern: &str) -> String {
    let haystack = row.joined();

    let mut pattern = pattern.to_string();
    let mut case_insensitive = false;
    if pattern.contains("(?i)") {
        case_insensitive = true;
        pattern = pattern.replace("(?i)", "");
    }

    let re = match RegexBuilder::new(&pattern)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(re) => re,
        Err(_) => return String::new(),
    };

    match re.captures(&haystack) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

fn apply_expr(row: &RawRow, expr: &str) -> String {
    // 1) substitute ${A} cell references
    let mut s = CELL_SUBST_RE
        .replace_all(expr, |caps: &Captures| row.cell(&caps[1]).to_string())
        .into_owned();

    // 2) ordered rewrites
    s = TRIM_RE
        .replace_all(&s, |caps: &Captures| strip_quotes(&caps[1]).trim().to_string())
        .into_owned();

    s = DIGITS_RE
        .replace_all(&s, |caps: &Captures| {
            strip_quotes(&caps[1])
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect::<String>()
        })
        .into_owned();

    s = COALESCE_RE
        .replace_all(&s, |caps: &Captures| {
            let a = strip_quotes(&caps[1]).trim().to_string();
            if a.is_empty() {
                strip_quotes(&caps[2]).trim().to_string()
            } else {
                a
            }
        })
        .into_owned();

    s = SPLIT_RE
        .replace_all(&s, |caps: &Captures| {
            let text = strip_quotes(&caps[1]).to_string();
            let delim = strip_quotes(&caps[2]).to_string();
            let idx: usize = match caps[3].trim().parse() {
                Ok(i) => i,
                Err(_) => return String::new(),
            };
            if delim.is_empty() {
                return String::new();
            }
            text.split(&delim)
                .nth(idx)
                .map(str::to_string)
                .unwrap_or_default()
        })
        .into_owned();

    // 3) stray backtick markers are display noise
    s = s.replace('`', "");

    s.trim().to_string()
}

fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
    {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowMeta;
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        let cells: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow::new(
            cells,
            RowMeta {
                sheet: "Sheet1".into(),
                row: 3,
                channel_code: "gmarket".into(),
            },
        )
    }

    fn rule(kind: SelectorKind, value: &str) -> FieldMappingRule {
        FieldMappingRule {
            id: 1,
            channel_id: 1,
            field_key: "channel_order_no".into(),
            selector_kind: kind,
            selector_value: value.into(),
            options: None,
        }
    }

    #[test]
    fn test_col_ref_lookup() {
        let r = row(&[("A", "ORD-1"), ("B", "kim")]);
        assert_eq!(apply(&r, &rule(SelectorKind::ColRef, "A")), "ORD-1");
        assert_eq!(apply(&r, &rule(SelectorKind::ColRef, " b ")), "kim");
    }

    #[test]
    fn test_col_ref_missing_column_is_empty() {
        let r = row(&[("A", "ORD-1")]);
        assert_eq!(apply(&r, &rule(SelectorKind::ColRef, "Z")), "");
    }

    #[test]
    fn test_header_text_behaves_as_col_ref() {
        let r = row(&[("C", "옵션명")]);
        assert_eq!(apply(&r, &rule(SelectorKind::HeaderText, "C")), "옵션명");
    }

    #[test]
    fn test_regex_capture_group_one() {
        let r = row(&[("A", "order no: ORD-77"), ("B", "extra")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Regex, r"ORD-(\d+)")),
            "77"
        );
    }

    #[test]
    fn test_regex_whole_match_when_no_group() {
        let r = row(&[("A", "tracking 5551234")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Regex, r"\d{7}")),
            "5551234"
        );
    }

    #[test]
    fn test_regex_case_insensitive_marker() {
        let r = row(&[("A", "Invoice INV-9")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Regex, r"(?i)inv-(\d+)")),
            "9"
        );
    }

    #[test]
    fn test_regex_invalid_pattern_is_empty() {
        let r = row(&[("A", "anything")]);
        assert_eq!(apply(&r, &rule(SelectorKind::Regex, r"([")), "");
    }

    #[test]
    fn test_regex_no_match_is_empty() {
        let r = row(&[("A", "abc")]);
        assert_eq!(apply(&r, &rule(SelectorKind::Regex, r"\d+")), "");
    }

    #[test]
    fn test_regex_joins_cells_in_column_order() {
        let r = row(&[("B", "tail"), ("A", "head")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Regex, r"head (\w+)")),
            "tail"
        );
    }

    #[test]
    fn test_expr_cell_substitution() {
        let r = row(&[("A", "X"), ("B", "Y")]);
        assert_eq!(apply(&r, &rule(SelectorKind::Expr, "${A}-${B}")), "X-Y");
    }

    #[test]
    fn test_expr_unknown_cell_substitutes_empty() {
        let r = row(&[("A", "X")]);
        assert_eq!(apply(&r, &rule(SelectorKind::Expr, "${A}${Z}")), "X");
    }

    #[test]
    fn test_expr_trim() {
        let r = row(&[("A", "  padded  ")]);
        // cells are pre-trimmed by the reader; TRIM still handles literals
        assert_eq!(
            apply(&r, &rule(SelectorKind::Expr, "TRIM('  hello ')")),
            "hello"
        );
    }

    #[test]
    fn test_expr_digits() {
        let r = row(&[("A", "010-1234-5678")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Expr, "DIGITS(${A})")),
            "01012345678"
        );
    }

    #[test]
    fn test_expr_coalesce_first_non_empty() {
        let r = row(&[("A", ""), ("B", "fallback")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Expr, "COALESCE(${A},${B})")),
            "fallback"
        );
        let r2 = row(&[("A", "primary"), ("B", "fallback")]);
        assert_eq!(
            apply(&r2, &rule(SelectorKind::Expr, "COALESCE(${A},${B})")),
            "primary"
        );
    }

    #[test]
    fn test_expr_split() {
        let r = row(&[("A", "2024-01-05")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Expr, r#"SPLIT(${A},"-",1)"#)),
            "01"
        );
    }

    #[test]
    fn test_expr_split_out_of_range_is_empty() {
        let r = row(&[("A", "a|b")]);
        assert_eq!(
            apply(&r, &rule(SelectorKind::Expr, r#"SPLIT(${A},"|",5)"#)),
            ""
        );
    }

    #[test]
    fn test_expr_backticks_stripped() {
        let r = row(&[("A", "v")]);
        assert_eq!(apply(&r, &rule(SelectorKind::Expr, "`${A}`")), "v");
    }

    #[test]
    fn test_apply_all_later_rule_overwrites() {
        let r = row(&[("A", "first"), ("B", "second")]);
        let rules = vec![
            FieldMappingRule {
                id: 1,
                channel_id: 1,
                field_key: "product_title".into(),
                selector_kind: SelectorKind::ColRef,
                selector_value: "A".into(),
                options: None,
            },
            FieldMappingRule {
                id: 2,
                channel_id: 1,
                field_key: "product_title".into(),
                selector_kind: SelectorKind::ColRef,
                selector_value: "B".into(),
                options: None,
            },
        ];
        let out = apply_all(&r, &rules);
        assert_eq!(out["product_title"], "second");
    }
}
