//! Build identification.

/// Release version, overridable at build time with `MICROSERVICE_VERSION`.
pub const VERSION: &str = match option_env!("MICROSERVICE_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

pub const COMMIT: &str = match option_env!("MICROSERVICE_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

pub const BUILD_DATE: &str = match option_env!("MICROSERVICE_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Text printed by `microservice version` and `microservice --version`.
pub fn report() -> String {
    format!("microservice version {VERSION}\n  commit: {COMMIT}\n  built:  {BUILD_DATE}\n")
}
