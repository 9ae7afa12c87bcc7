//! Transport trait and error types.

use hid_proto::Report;

/// Error type for transport sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/radio I/O error.
    Io,
    /// Transport not ready (e.g., USB not enumerated).
    NotReady,
    /// Report dropped (e.g., host not polling fast enough).
    Dropped,
    /// Endpoint busy with the previous report.
    Busy,
}

/// Polled transport for composed reports.
///
/// This trait abstracts the destination for HID reports, so the wired
/// scheduler and the wireless consumer can drive USB, a radio link or a
/// test double the same way.
///
/// # Polling
///
/// Every method returns immediately. Readiness is checked once per tick and
/// a report that cannot go out now is retried on a later tick with fresher
/// state, so nothing here ever waits.
pub trait Transport {
    /// Link is up (enumerated, paired).
    fn is_connected(&self) -> bool;

    /// Transport can take a report right now.
    fn is_ready(&mut self) -> bool;

    /// Hand one report to the transport.
    fn send(&mut self, report: &Report) -> Result<(), OutputError>;

    /// Host has suspended the link.
    fn is_suspended(&self) -> bool {
        false
    }

    /// Ask a suspended host to resume.
    fn wake(&mut self) {}
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn send(&mut self, report: &Report) -> Result<(), OutputError> {
        (**self).send(report)
    }

    fn is_suspended(&self) -> bool {
        (**self).is_suspended()
    }

    fn wake(&mut self) {
        (**self).wake();
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use hid_proto::KeyboardReport;

    #[test]
    fn test_mock_transport_records() {
        let mut transport = MockTransport::new();
        let report = Report::Keyboard(KeyboardReport::default());
        assert!(transport.is_ready());
        transport.send(&report).unwrap();
        assert_eq!(transport.sent(), [report]);
    }

    #[test]
    fn test_forwarding_through_reference() {
        let mut transport = MockTransport::new();
        transport.suspended = true;
        {
            let mut by_ref = &mut transport;
            assert!(by_ref.is_suspended());
            by_ref.wake();
        }
        assert_eq!(transport.wakes, 1);
        assert!(!transport.is_suspended());
    }

    #[test]
    fn test_failed_send_records_nothing() {
        let mut transport = MockTransport::new();
        transport.fail_next = Some(OutputError::Busy);
        let report = Report::Keyboard(KeyboardReport::default());
        assert_eq!(transport.send(&report), Err(OutputError::Busy));
        assert!(transport.sent().is_empty());
    }
}
