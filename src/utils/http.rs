/// Joins `base` and a relative endpoint path without doubling slashes.
pub(crate) fn join_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
