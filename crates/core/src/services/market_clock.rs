//! Pure trading-session calendar functions. No state, no I/O.
//!
//! All wall-clock reasoning happens in the session's fixed reference
//! offset; results come back as UTC instants.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use crate::models::config::SessionConfig;

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A local wall-clock time on a given date in the session's offset,
/// as a UTC instant. Fixed offsets map local times uniquely.
pub(crate) fn at_local(cfg: &SessionConfig, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    use chrono::TimeZone;
    cfg.utc_offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .expect("fixed offset maps local time uniquely")
        .with_timezone(&Utc)
}

/// Monday through Friday in the reference zone.
pub fn is_trading_day(cfg: &SessionConfig, now: DateTime<Utc>) -> bool {
    is_weekday(now.with_timezone(&cfg.utc_offset).date_naive())
}

/// True while the session is open: trading day and `open <= t < close`.
pub fn is_within_session(cfg: &SessionConfig, now: DateTime<Utc>) -> bool {
    if !is_trading_day(cfg, now) {
        return false;
    }
    let t = now.with_timezone(&cfg.utc_offset).time();
    t >= cfg.open && t < cfg.close
}

/// The next scheduled valuation instant, strictly after `now`.
///
/// Rounds up to the next multiple of the snapshot interval past session
/// open. Landing at or after the close rolls over to the next trading
/// day's open, as does any `now` outside a session (evening, weekend).
pub fn next_snapshot_instant(cfg: &SessionConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    let mut date = now.with_timezone(&cfg.utc_offset).date_naive();
    loop {
        if is_weekday(date) {
            let open = at_local(cfg, date, cfg.open);
            let close = at_local(cfg, date, cfg.close);
            if now < open {
                return open;
            }
            if now < close {
                let step = cfg.snapshot_interval.num_seconds().max(1);
                let intervals = (now - open).num_seconds().div_euclid(step) + 1;
                let next = open + Duration::seconds(intervals * step);
                if next < close {
                    return next;
                }
            }
        }
        date = date.succ_opt().expect("date within calendar range");
    }
}

/// The most recent session-open instant at or before `now`.
/// Used to timestamp the synthetic previous-close seed snapshot.
pub fn last_session_open(cfg: &SessionConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    let mut date = now.with_timezone(&cfg.utc_offset).date_naive();
    loop {
        if is_weekday(date) {
            let open = at_local(cfg, date, cfg.open);
            if open <= now {
                return open;
            }
        }
        date = date.pred_opt().expect("date within calendar range");
    }
}
