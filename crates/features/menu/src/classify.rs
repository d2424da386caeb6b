//! Pure page classifier: which URLs get the menu affordance.

use url::Url;

/// Why a page qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Issue,
    WorkItem,
    MergeRequest,
    /// Any other page on a GitLab-hosted origin.
    GitlabOrigin,
}

/// Classifies `url`. `extra_hosts` are self-managed instances to treat as GitLab-hosted.
#[must_use]
pub fn classify(url: &str, extra_hosts: &[String]) -> Option<PageKind> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    if let Some(kind) = resource_kind(&parsed) {
        return Some(kind);
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    is_gitlab_host(&host, extra_hosts).then_some(PageKind::GitlabOrigin)
}

#[must_use]
pub fn is_qualifying(url: &str, extra_hosts: &[String]) -> bool {
    classify(url, extra_hosts).is_some()
}

/// `gitlab.com`, its subdomains, `gitlab.*` instances and the configured hosts.
#[must_use]
pub fn is_gitlab_host(host: &str, extra_hosts: &[String]) -> bool {
    host == "gitlab.com"
        || host.ends_with(".gitlab.com")
        || host.starts_with("gitlab.")
        || extra_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
}

/// `.../issues/<n>`, `.../work_items/<n>`, `.../merge_requests/<n>`, with or without
/// the `/-/` separator.
fn resource_kind(url: &Url) -> Option<PageKind> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments.windows(2).find_map(|pair| {
        let [name, id] = pair else { return None };
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match *name {
            "issues" => Some(PageKind::Issue),
            "work_items" => Some(PageKind::WorkItem),
            "merge_requests" => Some(PageKind::MergeRequest),
            _ => None,
        }
    })
}
