use url::Url;

use crate::error::ManifestResult;

pub(crate) fn is_absolute_url(s: &str) -> bool {
    s.starts_with("http://")
        || s.starts_with("https://")
        || s.starts_with("file://")
        || s.starts_with("ftp://")
}

pub(crate) fn merge_baseurls(current: &Url, new: &str) -> ManifestResult<Url> {
    if is_absolute_url(new) {
        return Ok(Url::parse(new)?);
    }

    // The query of the base URL is kept unless the relative path brings its own.
    let mut merged = current.join(new)?;
    if merged.query().is_none() {
        merged.set_query(current.query());
    }
    Ok(merged)
}

/// Join a resolved segment path with every base URL of a representation.
///
/// Without base URLs the path is returned as-is. Base URLs that fail to parse are skipped.
pub(crate) fn resolve_media_urls(base_urls: &[String], path: &str) -> Vec<String> {
    if base_urls.is_empty() || is_absolute_url(path) {
        return vec![path.to_string()];
    }

    base_urls
        .iter()
        .filter_map(|base| {
            let merged = Url::parse(base)
                .map_err(Into::into)
                .and_then(|base| merge_baseurls(&base, path));
            match merged {
                Ok(url) => Some(url.to_string()),
                Err(error) => {
                    tracing::warn!(%base, path, %error, "Failed to join segment url with base url");
                    None
                }
            }
        })
        .collect()
}
