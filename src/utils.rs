// src/utils.rs

/// Normalize a free-text facet (location or job type) for comparisons
pub fn normalize_facet(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Treat blank facet values as absent
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize the job type written by employer forms
pub fn normalize_job_type(job_type: Option<&str>) -> String {
    match job_type.map(normalize_facet).as_deref() {
        Some("full-time") | Some("fulltime") | Some("toàn thời gian") => "full-time".to_string(),
        Some("part-time") | Some("parttime") | Some("bán thời gian") => "part-time".to_string(),
        Some("daily") | Some("theo ngày") | Some("thời vụ") => "daily".to_string(),
        Some("hourly") | Some("theo giờ") => "hourly".to_string(),
        Some(other) if !other.is_empty() => other.to_string(),
        _ => "other".to_string(),
    }
}

/// Human readable distance: metres below one kilometre, one decimal above
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() {
        return "--".to_string();
    }
    let metres = (km * 1000.0).round();
    if metres < 1000.0 {
        format!("{} m", metres as i64)
    } else {
        format!("{:.1} km", km)
    }
}

/// Human readable travel time in Vietnamese
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--".to_string();
    }
    let minutes = (seconds / 60.0).round() as u64;
    if minutes < 1 {
        return "< 1 phút".to_string();
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{} phút", m),
        (h, 0) => format!("{} giờ", h),
        (h, m) => format!("{} giờ {} phút", h, m),
    }
}
