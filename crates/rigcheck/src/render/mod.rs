//! Report renderers: console summary, plain-text file, HTML file.

pub mod html;
pub mod terminal;
pub mod text;

use rigcheck_core::snapshot::LinkKind;

pub(crate) fn fmt_secs(ms: u64) -> String {
    format!("{:.1} s", ms as f64 / 1000.0)
}

pub(crate) fn fmt_mbps(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} MB/s", v),
        None => "n/a".to_string(),
    }
}

pub(crate) fn fmt_ms(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} ms", v),
        None => "n/a".to_string(),
    }
}

pub(crate) fn on_off(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "on",
        Some(false) => "off",
        None => "unknown",
    }
}

pub(crate) fn link_label(kind: Option<LinkKind>) -> &'static str {
    match kind {
        Some(LinkKind::Ethernet) => "ethernet",
        Some(LinkKind::Wifi) => "wifi",
        Some(LinkKind::Unknown) | None => "unknown",
    }
}
