//! Indonesian date renderings. Both calendars are deterministic functions of
//! the same `NaiveDate`; a missing date renders as the empty string at the
//! call sites.

use chrono::{Datelike, NaiveDate};

const GREGORIAN_MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const HIJRI_MONTHS: [&str; 12] = [
    "Muharam",
    "Safar",
    "Rabiul Awal",
    "Rabiul Akhir",
    "Jumadil Awal",
    "Jumadil Akhir",
    "Rajab",
    "Syakban",
    "Ramadan",
    "Syawal",
    "Zulkaidah",
    "Zulhijah",
];

/// Long-form Indonesian Gregorian date, e.g. `17 Agustus 2024`.
pub fn format_date_id(date: NaiveDate) -> String {
    let month = GREGORIAN_MONTHS[date.month0() as usize];
    format!("{} {} {}", date.day(), month, date.year())
}

/// Tabular Islamic calendar date in Indonesian spelling, e.g.
/// `11 Safar 1446 H`. Uses the arithmetic (Kuwaiti) calendar, which tracks
/// the observational calendars to within a day.
pub fn format_hijri_date(date: NaiveDate) -> String {
    let (year, month, day) = gregorian_to_hijri(date);
    format!("{} {} {} H", day, HIJRI_MONTHS[(month - 1) as usize], year)
}

fn julian_day_number(date: NaiveDate) -> i64 {
    // num_days_from_ce is 1-based from 0001-01-01; 1721425 shifts onto the
    // astronomical Julian day count (2000-01-01 is JDN 2451545).
    i64::from(date.num_days_from_ce()) + 1_721_425
}

/// Convert a Gregorian date to (year, month, day) in the tabular Islamic
/// calendar. Epoch: JDN 1948440 is 1 Muharam 1 AH.
fn gregorian_to_hijri(date: NaiveDate) -> (i64, i64, i64) {
    let jd = julian_day_number(date);
    let mut l = jd - 1_948_440 + 10_632;
    let n = (l - 1) / 10_631;
    l = l - 10_631 * n + 354;
    let j = ((10_985 - l) / 5_316) * ((50 * l) / 17_719) + (l / 5_670) * ((43 * l) / 15_238);
    l = l - ((30 - j) / 15) * ((17_719 * j) / 50) - (j / 16) * ((15_238 * j) / 43) + 29;
    let month = (24 * l) / 709;
    let day = l - (709 * month) / 24;
    let year = 30 * n + j - 30;
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn gregorian_long_form() {
        assert_eq!(format_date_id(date(2024, 8, 17)), "17 Agustus 2024");
        assert_eq!(format_date_id(date(2001, 1, 1)), "1 Januari 2001");
    }

    #[test]
    fn hijri_epoch_anchor() {
        // JDN 1948440 is 1 Muharam 1 AH; that Julian day falls on
        // Gregorian 0622-07-19.
        assert_eq!(gregorian_to_hijri(date(622, 7, 19)), (1, 1, 1));
    }

    #[test]
    fn hijri_millennium_anchor() {
        assert_eq!(gregorian_to_hijri(date(2000, 1, 1)), (1420, 9, 24));
        assert_eq!(format_hijri_date(date(2000, 1, 1)), "24 Ramadan 1420 H");
    }

    #[test]
    fn hijri_is_monotonic_across_a_month() {
        let mut previous = gregorian_to_hijri(date(2024, 1, 1));
        for day in 2..=31 {
            let current = gregorian_to_hijri(date(2024, 1, day));
            assert!(current > previous);
            previous = current;
        }
    }
}
