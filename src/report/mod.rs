//! Human-readable forecast explanations.
//!
//! All user-facing string formatting stays in one place so the numeric
//! pipeline stays clean and output changes are localized.

use crate::domain::ForecastResult;

/// US Drought Monitor style label for the 0-4 severity scale.
pub fn severity_label(severity: u8) -> &'static str {
    match severity {
        0 => "no drought",
        1 => "mild drought",
        2 => "severe drought",
        3 => "extreme drought",
        _ => "exceptional drought",
    }
}

/// One-paragraph explanation of a forecast for display upstream.
pub fn format_explanation(result: &ForecastResult) -> String {
    let current = result.predicted_price - result.price_change;

    let (direction, reason) = if result.price_change_pct > 2.0 {
        ("increase", "worsening water scarcity")
    } else if result.price_change_pct < -2.0 {
        ("decrease", "improving water conditions")
    } else {
        ("remain stable", "steady drought conditions")
    };

    format!(
        "The NQH2O water index is forecasted to {direction} from ${current:.2} to ${:.2} \
         ({:+.1}%). This forecast is based on {} conditions and has a confidence level of \
         {:.0}%. The prediction reflects {reason} in California's water markets.",
        result.predicted_price,
        result.price_change_pct,
        severity_label(result.drought_severity),
        result.confidence * 100.0,
    )
}
