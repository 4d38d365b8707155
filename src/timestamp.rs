use dts::utils::timing::CLOCK_RATE;

pub fn time_str(sec: f64) -> String {
    let ms = sec * 1000f64;
    let hours = (ms / 3600000f64) as u64;
    let minutes = ((ms % 3600000f64) / 60000f64) as u64;
    let seconds = ((ms % 60000f64) / 1000f64) as u64;
    let milliseconds = (ms % 1000f64) as u64;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

/// Formats a 90 kHz presentation timestamp.
pub fn pts_str(pts: u64) -> String {
    time_str(pts as f64 / CLOCK_RATE as f64)
}

/// Formats a duration in milliseconds.
pub fn ms_str(ms: u64) -> String {
    time_str(ms as f64 / 1000f64)
}

#[test]
fn format_clock_values() {
    assert_eq!(ms_str(0), "00:00:00.000");
    assert_eq!(ms_str(3_723_456), "01:02:03.456");
    assert_eq!(pts_str(90_000 * 61), "00:01:01.000");
    assert_eq!(ms_str(360_000_000), "100:00:00.000");
}
