use url::Url;

const INVALID_SCHEME: &str = "endpoint scheme must be https:// or http://";
const MISSING_HOST: &str = "endpoint must include a host";

/// Clap value parser for `--endpoint`.
pub fn check_scheme(endpoint: &str) -> Result<String, String> {
    let parsed = Url::parse(endpoint).map_err(|e| e.to_string())?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(INVALID_SCHEME.to_string());
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(MISSING_HOST.to_string());
    }

    Ok(endpoint.to_string())
}
