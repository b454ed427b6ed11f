//! Device descriptors from request headers

use axum::http::{header, HeaderMap};
use upload::DeviceInfo;

const UNKNOWN: &str = "unknown";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build the coarse device description attached to an upload
pub fn device_info(headers: &HeaderMap) -> DeviceInfo {
    let user_agent = header_str(headers, header::USER_AGENT.as_str()).unwrap_or(UNKNOWN);

    // Client hints send the platform quoted: "Android"
    let platform = header_str(headers, "sec-ch-ua-platform")
        .map(|p| p.trim_matches('"'))
        .filter(|p| !p.is_empty())
        .unwrap_or(UNKNOWN);

    // First language tag, without its quality weight
    let language = header_str(headers, header::ACCEPT_LANGUAGE.as_str())
        .and_then(|l| l.split(',').next())
        .and_then(|l| l.split(';').next())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(UNKNOWN);

    DeviceInfo::new(user_agent, platform, language)
}
