//! Spoken time and date from the local clock.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};

const WEEKDAYS: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `지금은 오후 3시 5분입니다.` on a 12-hour clock.
pub fn time_sentence(now: &NaiveDateTime) -> String {
    let hour = now.hour();
    let period = if hour < 12 { "오전" } else { "오후" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("지금은 {} {}시 {}분입니다.", period, display_hour, now.minute())
}

/// `오늘은 2026년 10월 16일 금요일입니다.`
pub fn date_sentence(now: &NaiveDateTime) -> String {
    let weekday = WEEKDAYS[now.weekday().num_days_from_monday() as usize];
    format!("오늘은 {}년 {}월 {}일 {}요일입니다.", now.year(), now.month(), now.day(), weekday)
}
