/// Size conversions for reports and console output.
///
/// All internal sizes are `u64` bytes. Floating point appears only at the
/// formatting boundary.

/// Bytes per MiB, the unit of the text report.
pub const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Convert a byte count to MiB.
#[inline]
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Render a byte count the way report lines show it: MiB, two decimals.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2}", bytes_to_mib(bytes))
}

/// Human-readable byte count with an adaptive unit, for log lines.
///
/// Binary units (KiB = 1024) labelled KB/MB/GB/TB to match the report.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else if b < GB {
        format!("{:.1} MB", b / MB)
    } else if b < TB {
        format!("{:.2} GB", b / GB)
    } else {
        format!("{:.2} TB", b / TB)
    }
}
