use url::Url;

/// Canonical form of a URL, used as the dedup key for the whole run.
///
/// The `url` crate already lower-cases scheme and host, strips default ports
/// and resolves `.`/`..` segments on parse. On top of that the fragment is
/// removed, and the trailing slash is dropped when the path is otherwise
/// empty, so `https://Example.com/#top` and `https://example.com` collapse
/// to the same key.
pub fn canonicalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    let mut out = url.to_string();
    if url.path() == "/" && url.query().is_none() && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Canonicalize a string URL; `None` when it does not parse as absolute.
pub fn canonicalize_str(raw: &str) -> Option<String> {
    Url::parse(raw).ok().map(|u| canonicalize(&u))
}

/// Whether `url` belongs to the crawled site: same host as the seed, or a
/// subdomain of it.
pub fn same_site(url: &Url, site_host: &str) -> bool {
    match url.host_str() {
        Some(host) => host == site_host || host.ends_with(&format!(".{}", site_host)),
        None => false,
    }
}
