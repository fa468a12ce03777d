use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Allows one outstanding quiz submission at a time.
///
/// Each accepted submission gets the next sequence number, so the response a
/// user sees always belongs to the newest request they issued.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    in_flight: AtomicBool,
    sequence: AtomicU64,
}

impl SubmissionGuard {
    /// Returns `None` while another submission is outstanding.
    pub fn try_begin(&self) -> Option<SubmissionTicket<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        Some(SubmissionTicket {
            guard: self,
            sequence,
        })
    }
}

/// Releases the guard on drop, including on error and cancellation.
#[derive(Debug)]
pub struct SubmissionTicket<'a> {
    guard: &'a SubmissionGuard,
    sequence: u64,
}

impl SubmissionTicket<'_> {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Drop for SubmissionTicket<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_submission_is_refused_while_first_is_outstanding() {
        let guard = SubmissionGuard::default();
        let first = guard.try_begin().unwrap();
        assert!(guard.try_begin().is_none());
        drop(first);
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let guard = SubmissionGuard::default();
        let a = guard.try_begin().unwrap().sequence();
        let b = guard.try_begin().unwrap().sequence();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_refused_attempt_does_not_consume_a_sequence_number() {
        let guard = SubmissionGuard::default();
        let held = guard.try_begin().unwrap();
        assert!(guard.try_begin().is_none());
        drop(held);
        assert_eq!(guard.try_begin().unwrap().sequence(), 2);
    }
}
