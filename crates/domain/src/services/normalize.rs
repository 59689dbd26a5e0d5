//! Tolerant normalization of dates, phones, addresses, quantities and
//! tracking numbers, plus the receiver→buyer fallback copy.
//!
//! Every transform is independent and skipped when its input is absent.
//! None of them ever fail the row; unparsable input degrades to a default
//! (`None` for dates, `1` for quantity, passthrough for phones).

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::StandardOrderRecord;

/// Spreadsheet day-serial epoch (serial 0).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Highest serial accepted as a date (9999-12-31).
const SERIAL_MAX: f64 = 2_958_465.0;

lazy_static! {
    static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref SENDER_NOTE_RE: Regex = Regex::new(
        r"(?i)[(\[{（]\s*(?:sender|발송인|보내는\s*(?:분|사람)?)\s*[:：][^)\]}）]*[)\]}）]\s*$"
    )
    .unwrap();
}

/// Datetime-bearing formats tried in order after the digit-run and serial
/// strategies.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %I:%M:%S %p",
    "%Y/%m/%d %I:%M %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only formats, completed to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Parse an order timestamp from inconsistent channel exports.
///
/// Strategy order: exact-length digit runs (`YYYYMMDDhhmmss`,
/// `YYYYMMDDhhmm`, `YYYYMMDD`), a numeric spreadsheet serial, the explicit
/// format list, then a loose cleanup-and-retry pass. First success wins;
/// total failure yields `None` (the commit step substitutes the processing
/// timestamp later).
pub fn datetime(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        match s.len() {
            14 => {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S") {
                    return Some(dt);
                }
            }
            12 => {
                // seconds forced to 00
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M") {
                    return Some(dt);
                }
            }
            8 => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                    return d.and_hms_opt(0, 0, 0);
                }
            }
            _ => {}
        }
    }

    if let Ok(serial) = s.parse::<f64>() {
        if (0.0..=SERIAL_MAX).contains(&serial) {
            return serial_to_datetime(serial);
        }
    }

    if let Some(dt) = try_formats(s) {
        return Some(dt);
    }

    // loose pass: collapse runs of whitespace, drop a trailing Z, retry
    let cleaned = WS_RE.replace_all(s, " ").trim_end_matches('Z').trim().to_string();
    if cleaned != s {
        if let Some(dt) = try_formats(&cleaned) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    None
}

/// Convert a spreadsheet day serial to a datetime with no timezone shift.
/// The fractional part is the time of day.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)?;

    let mut days = serial.floor() as i64;
    let mut secs = ((serial - serial.floor()) * 86_400.0).round() as i64;
    if secs >= 86_400 {
        days += 1;
        secs = 0;
    }
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(secs))
}

fn try_formats(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Strip a trailing bracketed sender annotation and collapse repeated
/// whitespace.
pub fn address(input: &str) -> String {
    let stripped = SENDER_NOTE_RE.replace(input.trim(), "");
    WS_RE.replace_all(stripped.trim(), " ").into_owned()
}

/// Normalize a Korean phone number.
///
/// Digits only, `82` country prefix folded back to `0`, then grouped:
/// `02` numbers as 02-XXX-XXXX / 02-XXXX-XXXX, 10 digits as 3-3-4,
/// 11 digits as 3-4-4. Unrecognized lengths pass through unchanged.
pub fn phone(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }

    if let Some(rest) = digits.strip_prefix("82") {
        digits = format!("0{rest}");
    }

    if digits.starts_with("02") {
        return match digits.len() {
            9 => format!("02-{}-{}", &digits[2..5], &digits[5..9]),
            10 => format!("02-{}-{}", &digits[2..6], &digits[6..10]),
            _ => raw.to_string(),
        };
    }

    match digits.len() {
        10 => format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..10]),
        11 => format!("{}-{}-{}", &digits[..3], &digits[3..7], &digits[7..11]),
        _ => raw.to_string(),
    }
}

/// Parse a quantity; non-positive or unparsable values become 1.
pub fn quantity(input: &str) -> i32 {
    let s = input.trim();
    let mut end = 0;
    let bytes = s.as_bytes();
    if !bytes.is_empty() && (bytes[0] == b'-' || bytes[0] == b'+') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    match s[..end].parse::<i64>() {
        Ok(v) if v > 0 => v.min(i32::MAX as i64) as i32,
        _ => 1,
    }
}

/// Trim a tracking number; blank becomes `None`.
pub fn tracking(input: &str) -> Option<String> {
    let t = input.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Normalize a listing/option title for comparison: non-breaking spaces to
/// plain spaces, whitespace collapsed, trimmed, lowercased.
pub fn title(input: &str) -> String {
    let replaced = input.replace('\u{00a0}', " ");
    WS_RE
        .replace_all(replaced.trim(), " ")
        .trim()
        .to_lowercase()
}

/// Copy receiver contact fields onto empty buyer fields.
pub fn apply_receiver_fallback(rec: &mut StandardOrderRecord) {
    fn fill(buyer: &mut String, receiver: &str) {
        if buyer.is_empty() && !receiver.is_empty() {
            *buyer = receiver.to_string();
        }
    }
    fill(&mut rec.buyer_name, &rec.receiver_name);
    fill(&mut rec.buyer_phone, &rec.receiver_phone);
    fill(&mut rec.buyer_postcode, &rec.receiver_postcode);
    fill(&mut rec.buyer_addr_full, &rec.receiver_addr_full);
    fill(&mut rec.buyer_addr1, &rec.receiver_addr1);
    fill(&mut rec.buyer_addr2, &rec.receiver_addr2);
}

/// Row-local cleanup applied after field mapping: addresses, the
/// receiver→buyer fallback, then phone formatting for both parties.
pub fn normalize_record(rec: &mut StandardOrderRecord) {
    for addr in [
        &mut rec.receiver_addr_full,
        &mut rec.receiver_addr1,
        &mut rec.receiver_addr2,
        &mut rec.buyer_addr_full,
        &mut rec.buyer_addr1,
        &mut rec.buyer_addr2,
    ] {
        if !addr.is_empty() {
            *addr = address(addr);
        }
    }

    apply_receiver_fallback(rec);

    if !rec.receiver_phone.is_empty() {
        rec.receiver_phone = phone(&rec.receiver_phone);
    }
    if !rec.buyer_phone.is_empty() {
        rec.buyer_phone = phone(&rec.buyer_phone);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_datetime_digit_run_14() {
        assert_eq!(datetime("20240105103000"), Some(dt("2024-01-05 10:30:00")));
    }

    #[test]
    fn test_datetime_digit_run_12_seconds_zeroed() {
        assert_eq!(datetime("202401051030"), Some(dt("2024-01-05 10:30:00")));
    }

    #[test]
    fn test_datetime_digit_run_8_midnight() {
        assert_eq!(datetime("20240105"), Some(dt("2024-01-05 00:00:00")));
    }

    #[test]
    fn test_datetime_idempotent() {
        let input = "2024-01-05 10:30:00";
        let parsed = datetime(input).unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), input);
    }

    #[test]
    fn test_datetime_serial_45000() {
        assert_eq!(datetime("45000"), Some(dt("2023-03-15 00:00:00")));
    }

    #[test]
    fn test_datetime_serial_fraction_is_time_of_day() {
        assert_eq!(datetime("45000.5"), Some(dt("2023-03-15 12:00:00")));
    }

    #[test]
    fn test_datetime_serial_out_of_range() {
        assert_eq!(datetime("2958466"), None);
        assert_eq!(serial_to_datetime(-1.0), None);
    }

    #[test]
    fn test_datetime_slash_and_dot_separators() {
        assert_eq!(datetime("2024/01/05 10:30"), Some(dt("2024-01-05 10:30:00")));
        assert_eq!(datetime("2024.01.05"), Some(dt("2024-01-05 00:00:00")));
    }

    #[test]
    fn test_datetime_twelve_hour_clock() {
        assert_eq!(
            datetime("2024-01-05 10:30 PM"),
            Some(dt("2024-01-05 22:30:00"))
        );
    }

    #[test]
    fn test_datetime_iso_t_separator() {
        assert_eq!(
            datetime("2024-01-05T10:30:00"),
            Some(dt("2024-01-05 10:30:00"))
        );
    }

    #[test]
    fn test_datetime_loose_extra_whitespace() {
        assert_eq!(
            datetime("2024-01-05   10:30:00"),
            Some(dt("2024-01-05 10:30:00"))
        );
    }

    #[test]
    fn test_datetime_failure_is_none() {
        assert_eq!(datetime(""), None);
        assert_eq!(datetime("배송중"), None);
        assert_eq!(datetime("99999999"), None);
    }

    #[test]
    fn test_address_strips_sender_note() {
        assert_eq!(
            address("서울시 강남구 테헤란로 1 (sender: 홍길동)"),
            "서울시 강남구 테헤란로 1"
        );
        assert_eq!(address("부산시 해운대구 [발송인: 김철수]"), "부산시 해운대구");
        assert_eq!(
            address("대전시 서구 둔산로 100 （보내는분： 이영희）"),
            "대전시 서구 둔산로 100"
        );
    }

    #[test]
    fn test_address_keeps_interior_parens() {
        assert_eq!(
            address("서울시 (역삼동) 123-4"),
            "서울시 (역삼동) 123-4"
        );
    }

    #[test]
    fn test_address_collapses_whitespace() {
        assert_eq!(address("서울시   강남구\t테헤란로"), "서울시 강남구 테헤란로");
    }

    #[test]
    fn test_phone_country_prefix() {
        assert_eq!(phone("821012345678"), "010-1234-5678");
    }

    #[test]
    fn test_phone_seoul_prefix() {
        assert_eq!(phone("0212345678"), "02-1234-5678");
        assert_eq!(phone("021234567"), "02-123-4567");
    }

    #[test]
    fn test_phone_mobile_groupings() {
        assert_eq!(phone("01012345678"), "010-1234-5678");
        assert_eq!(phone("0311234567"), "031-123-4567");
    }

    #[test]
    fn test_phone_unrecognized_length_passthrough() {
        assert_eq!(phone("12345"), "12345");
        assert_eq!(phone("021234"), "021234");
    }

    #[test]
    fn test_phone_strips_formatting_first() {
        assert_eq!(phone("010-1234-5678"), "010-1234-5678");
        assert_eq!(phone("+82 10 1234 5678"), "010-1234-5678");
    }

    #[test]
    fn test_phone_no_digits_is_empty() {
        assert_eq!(phone("없음"), "");
        assert_eq!(phone(""), "");
    }

    #[test]
    fn test_quantity_coercions() {
        assert_eq!(quantity("5"), 5);
        assert_eq!(quantity("-3"), 1);
        assert_eq!(quantity("0"), 1);
        assert_eq!(quantity("abc"), 1);
        assert_eq!(quantity(""), 1);
        assert_eq!(quantity("2개"), 2);
    }

    #[test]
    fn test_tracking_blank_is_none() {
        assert_eq!(tracking("  "), None);
        assert_eq!(tracking(""), None);
        assert_eq!(tracking(" 123456 "), Some("123456".to_string()));
    }

    #[test]
    fn test_title_normalization() {
        assert_eq!(title("  Blue\u{00a0}Shirt  XL "), "blue shirt xl");
        assert_eq!(title("상품명"), "상품명");
    }

    #[test]
    fn test_receiver_fallback_copies_empty_buyer_fields() {
        let mut rec = StandardOrderRecord {
            receiver_name: "김수취".into(),
            receiver_phone: "01011112222".into(),
            buyer_name: "박구매".into(),
            ..Default::default()
        };
        apply_receiver_fallback(&mut rec);
        assert_eq!(rec.buyer_name, "박구매");
        assert_eq!(rec.buyer_phone, "01011112222");
    }

    #[test]
    fn test_normalize_record_order_of_operations() {
        let mut rec = StandardOrderRecord {
            receiver_name: "김수취".into(),
            receiver_phone: "821012345678".into(),
            receiver_addr_full: "서울시  강남구 (sender: 판매자)".into(),
            ..Default::default()
        };
        normalize_record(&mut rec);
        // buyer got the cleaned address and the formatted phone
        assert_eq!(rec.buyer_addr_full, "서울시 강남구");
        assert_eq!(rec.receiver_phone, "010-1234-5678");
        assert_eq!(rec.buyer_phone, "010-1234-5678");
    }
}
