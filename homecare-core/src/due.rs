use chrono::{Duration, NaiveDate};

/// Số ngày tròn kể từ ngày nhập viện (âm nếu chưa tới).
pub fn days_since_admission(admission: NaiveDate, target: NaiveDate) -> i64 {
    target.signed_duration_since(admission).num_days()
}

/// Ngày nhập viện luôn đến hạn; sau đó mỗi `interval_days` ngày.
/// Trước ngày nhập viện hoặc chu kỳ 0 thì không bao giờ đến hạn.
pub fn is_due(admission: NaiveDate, interval_days: u32, target: NaiveDate) -> bool {
    if interval_days == 0 {
        return false;
    }
    let diff = days_since_admission(admission, target);
    if diff < 0 {
        return false;
    }
    diff == 0 || diff % i64::from(interval_days) == 0
}

/// Ngày đến hạn đầu tiên không sớm hơn `from`.
pub fn next_due_on_or_after(
    admission: NaiveDate,
    interval_days: u32,
    from: NaiveDate,
) -> Option<NaiveDate> {
    if interval_days == 0 {
        return None;
    }
    let diff = days_since_admission(admission, from);
    if diff <= 0 {
        return Some(admission);
    }
    let remainder = diff % i64::from(interval_days);
    if remainder == 0 {
        Some(from)
    } else {
        from.checked_add_signed(Duration::days(i64::from(interval_days) - remainder))
    }
}
