use std::time::{Duration, Instant};

/// Wall-clock instants captured at fixed points of one request attempt.
///
/// A mark stays `None` when its lifecycle event never fires. The two
/// backfill rules keep every phase non-negative: connecting to a literal
/// IP skips DNS, so the connect attempt backfills `dns_done`, and
/// `finish` backfills `dns_start` from `dns_done`.
#[derive(Debug, Default, Clone)]
pub struct TimingMarks {
    pub dns_start: Option<Instant>,
    pub dns_done: Option<Instant>,
    pub connect_done: Option<Instant>,
    pub got_connection: Option<Instant>,
    pub first_byte: Option<Instant>,
    pub body_read: Option<Instant>,
}

impl TimingMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_dns(&mut self) {
        self.dns_start = Some(Instant::now());
    }

    pub fn end_dns(&mut self) {
        self.dns_done = Some(Instant::now());
    }

    /// Called just before the TCP connect attempt. When DNS was skipped
    /// the connect start doubles as the DNS-done instant.
    pub fn start_connect(&mut self) {
        if self.dns_done.is_none() {
            self.dns_done = Some(Instant::now());
        }
    }

    pub fn end_connect(&mut self) {
        self.connect_done = Some(Instant::now());
    }

    pub fn mark_connected(&mut self) {
        self.got_connection = Some(Instant::now());
    }

    pub fn mark_first_byte(&mut self) {
        self.first_byte = Some(Instant::now());
    }

    pub fn mark_body_read(&mut self) {
        self.body_read = Some(Instant::now());
    }

    /// Applies the DNS-start backfill once the attempt is complete.
    pub fn finish(&mut self) {
        if self.dns_start.is_none() {
            self.dns_start = self.dns_done;
        }
    }

    pub fn dns_lookup(&self) -> Option<Duration> {
        Some(self.dns_done?.duration_since(self.dns_start?))
    }

    pub fn tcp_connection(&self) -> Option<Duration> {
        Some(self.connect_done?.duration_since(self.dns_done?))
    }

    pub fn tls_handshake(&self) -> Option<Duration> {
        Some(self.got_connection?.duration_since(self.connect_done?))
    }

    pub fn server_processing(&self) -> Option<Duration> {
        Some(self.first_byte?.duration_since(self.got_connection?))
    }

    pub fn content_transfer(&self) -> Option<Duration> {
        Some(self.body_read?.duration_since(self.first_byte?))
    }

    pub fn total(&self) -> Option<Duration> {
        Some(self.body_read?.duration_since(self.dns_start?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Option<Instant> {
        Some(base + Duration::from_millis(ms))
    }

    #[test]
    fn phases_follow_the_marks() {
        let base = Instant::now();
        let marks = TimingMarks {
            dns_start: at(base, 0),
            dns_done: at(base, 4),
            connect_done: at(base, 14),
            got_connection: at(base, 26),
            first_byte: at(base, 56),
            body_read: at(base, 58),
        };

        assert_eq!(marks.dns_lookup(), Some(Duration::from_millis(4)));
        assert_eq!(marks.tcp_connection(), Some(Duration::from_millis(10)));
        assert_eq!(marks.tls_handshake(), Some(Duration::from_millis(12)));
        assert_eq!(marks.server_processing(), Some(Duration::from_millis(30)));
        assert_eq!(marks.content_transfer(), Some(Duration::from_millis(2)));
        assert_eq!(marks.total(), Some(Duration::from_millis(58)));
    }

    #[test]
    fn total_covers_the_phase_sum() {
        let base = Instant::now();
        let marks = TimingMarks {
            dns_start: at(base, 0),
            dns_done: at(base, 3),
            connect_done: at(base, 9),
            got_connection: at(base, 9),
            first_byte: at(base, 40),
            body_read: at(base, 41),
        };
        let sum = marks.dns_lookup().unwrap()
            + marks.tcp_connection().unwrap()
            + marks.tls_handshake().unwrap()
            + marks.server_processing().unwrap()
            + marks.content_transfer().unwrap();
        assert_eq!(marks.total(), Some(sum));
    }

    #[test]
    fn skipped_dns_is_backfilled() {
        let mut marks = TimingMarks::new();
        marks.start_connect();
        marks.end_connect();
        marks.mark_connected();
        marks.mark_first_byte();
        marks.mark_body_read();
        marks.finish();

        assert_eq!(marks.dns_start, marks.dns_done);
        assert_eq!(marks.dns_lookup(), Some(Duration::ZERO));
        assert!(marks.total().is_some());
    }

    #[test]
    fn incomplete_marks_yield_no_duration() {
        let marks = TimingMarks::new();
        assert_eq!(marks.dns_lookup(), None);
        assert_eq!(marks.total(), None);
    }
}
