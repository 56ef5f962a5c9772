//! Time filter.

use super::TimeFilter;
use crate::error::{FilterCause, FilterError, FilterKind};
use crate::event::Event;
use crate::time::TimeWindow;

pub(crate) fn filter_time(filter: Option<&TimeFilter>, event: &Event) -> Result<bool, FilterError> {
    let Some(filter) = filter else {
        return Ok(true);
    };
    let wrap = |cause: FilterCause| FilterError::single(FilterKind::Time, cause);
    let at = event
        .context
        .as_ref()
        .map(|c| c.time)
        .ok_or_else(|| wrap(FilterCause::MissingContext))?;
    let window = TimeWindow::resolve(&filter.start, &filter.stop, filter.timezone.as_deref(), at).map_err(wrap)?;
    Ok(window.contains(at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventContext;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> Event {
        let time: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 7, 15, h, m, s).unwrap();
        Event::new(EventContext::new("calendar", "calendar").with_time(time), "{}")
    }

    fn window(start: &str, stop: &str) -> TimeFilter {
        TimeFilter {
            start: start.to_string(),
            stop: stop.to_string(),
            timezone: None,
        }
    }

    #[test]
    fn test_no_filter_passes() {
        assert!(filter_time(None, &at(0, 0, 0)).unwrap());
    }

    #[test]
    fn test_start_before_stop() {
        let f = window("08:09:10", "16:17:18");
        let expected = [false, false, true, true, false, false];
        let times = [(0, 0, 0), (4, 5, 6), (8, 9, 10), (12, 13, 14), (16, 17, 18), (20, 21, 22)];
        for ((h, m, s), want) in times.into_iter().zip(expected) {
            assert_eq!(filter_time(Some(&f), &at(h, m, s)).unwrap(), want, "{h}:{m}:{s}");
        }
    }

    #[test]
    fn test_stop_before_start() {
        let f = window("16:17:18", "08:09:10");
        let expected = [true, true, false, false, true, true];
        let times = [(0, 0, 0), (4, 5, 6), (8, 9, 10), (12, 13, 14), (16, 17, 18), (20, 21, 22)];
        for ((h, m, s), want) in times.into_iter().zip(expected) {
            assert_eq!(filter_time(Some(&f), &at(h, m, s)).unwrap(), want, "{h}:{m}:{s}");
        }
    }

    #[test]
    fn test_invalid_timezone() {
        let mut f = window("09:00:00", "17:00:00");
        f.timezone = Some("Invalid/Timezone".to_string());
        let err = filter_time(Some(&f), &at(10, 0, 0)).unwrap_err();
        assert!(err.to_string().starts_with("time filter error (invalid timezone"));
    }

    #[test]
    fn test_missing_context() {
        let f = window("09:00:00", "17:00:00");
        let event = Event {
            context: None,
            data: None,
        };
        let err = filter_time(Some(&f), &event).unwrap_err();
        assert_eq!(err, FilterError::single(FilterKind::Time, FilterCause::MissingContext));
    }
}
