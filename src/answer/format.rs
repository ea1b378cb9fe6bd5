use std::fmt::Write;

/// How citation hosts found in the answer body are turned into `[n]` markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CitationMode {
    /// Replace the first plain-text occurrence of each citation's host.
    #[default]
    Domain,
    /// Only replace a host where it stands as a whole token, so
    /// `example.com` does not match inside `myexample.com` or `example.com.au`.
    Strict,
}

impl CitationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domain" => Some(Self::Domain),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Host part of a citation URL: the text between the second and third `/`.
///
/// Returns `None` for strings without a `scheme://` shaped prefix or with an
/// empty host.
pub fn citation_host(url: &str) -> Option<&str> {
    let host = url.split('/').nth(2)?;
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

fn is_host_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-'
}

/// Byte offset of the first whole-token occurrence of `host` in `text`.
fn find_token(text: &str, host: &str) -> Option<usize> {
    text.match_indices(host).map(|(i, _)| i).find(|&i| {
        let before = text[..i].chars().next_back();
        let mut after = text[i + host.len()..].chars();
        let clean_start = !matches!(before, Some(c) if is_host_char(c) || c == '.');
        let clean_end = match after.next() {
            Some('.') => !matches!(after.next(), Some(c) if is_host_char(c)),
            Some(c) => !is_host_char(c),
            None => true,
        };
        clean_start && clean_end
    })
}

fn substitute_markers(body: &str, citations: &[String], mode: CitationMode) -> String {
    let mut text = body.to_string();
    for (i, citation) in citations.iter().enumerate() {
        let Some(host) = citation_host(citation) else {
            continue;
        };
        let marker = format!("[{}]", i + 1);
        let found = match mode {
            CitationMode::Domain => text.find(host),
            CitationMode::Strict => find_token(&text, host),
        };
        if let Some(at) = found {
            text.replace_range(at..at + host.len(), &marker);
        }
    }
    text
}

/// Render an answer body with numbered citation markers and a references
/// section.
///
/// Bodies that already carry a `[1]` marker are treated as pre-formatted and
/// only get the references appended. Earlier citations win when hosts repeat.
pub fn format_answer(body: &str, citations: &[String], mode: CitationMode) -> String {
    if citations.is_empty() {
        return body.to_string();
    }

    let mut out = if body.contains("[1]") {
        body.to_string()
    } else {
        substitute_markers(body, citations, mode)
    };

    out.push_str("\n\n**References:**");
    for (i, citation) in citations.iter().enumerate() {
        let _ = write!(out, "\n[{}] <{}>", i + 1, citation);
    }
    out
}
