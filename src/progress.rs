use crate::tx::TransmissionState;

pub const PROGRESS_BAR_WIDTH: usize = 36;

/// Human readable size using 1024-based units, two decimals.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes:.2} bytes", bytes = bytes as f64);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.2} {}", UNITS[unit])
}

/// `[=====      ] 41.67%` for known totals, a byte count otherwise.
pub fn render(state: &TransmissionState, width: usize) -> String {
    let total = match state.total_bytes {
        Some(t) if t > 0 => t,
        _ => return format!("{} sent", format_size(state.bytes_transmitted)),
    };

    let fraction = (state.bytes_transmitted as f64 / total as f64).min(1.0);
    let filled = (fraction * width as f64) as usize;

    format!(
        "[{}{}] {:.2}%",
        "=".repeat(filled),
        " ".repeat(width - filled),
        fraction * 100.0
    )
}
