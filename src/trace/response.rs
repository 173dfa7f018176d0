use std::fmt;

/// Append-only trace log shared across every hop of a redirect chain.
///
/// The caller creates one `Response`, the tracer threads it through the
/// whole chain, and the rendered report is simply the log joined by
/// newlines.
#[derive(Debug, Default)]
pub struct Response {
    log: Vec<String>,
    redirects_followed: usize,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn redirects_followed(&self) -> usize {
        self.redirects_followed
    }

    /// Counts one followed redirect and returns the new count.
    pub(crate) fn follow_redirect(&mut self) -> usize {
        self.redirects_followed += 1;
        self.redirects_followed
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_renders_in_insertion_order() {
        let mut res = Response::new();
        res.report("HTTP/1.1 200 OK");
        res.report("");
        res.report("Total: 12ms");
        assert_eq!(res.to_string(), "HTTP/1.1 200 OK\n\nTotal: 12ms");
    }

    #[test]
    fn redirect_counter_only_grows() {
        let mut res = Response::new();
        assert_eq!(res.redirects_followed(), 0);
        assert_eq!(res.follow_redirect(), 1);
        assert_eq!(res.follow_redirect(), 2);
        assert_eq!(res.redirects_followed(), 2);
    }
}
