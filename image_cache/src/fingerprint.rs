/// Cache key for one encode request.
///
/// The three inputs are joined with `$` with the flag spelled `True`/`False`
/// so existing cache directories keep their keys, then hashed with MD5 into
/// 32 uppercase hex characters. The source is used verbatim, so two
/// URLs that differ only in casing or trailing whitespace get different keys.
pub fn fingerprint(source: &str, resize: bool, width: u16) -> String {
    let flag = if resize { "True" } else { "False" };
    let cache_string = format!("{source}${flag}${width}");

    format!("{:X}", md5::compute(cache_string.as_bytes()))
}
