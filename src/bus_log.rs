// Fake bus and delay that record every operation in order, for protocol-sequence tests.

use std::{cell::RefCell, collections::VecDeque};

use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Write(u8, Vec<u8>),
    WriteRead(u8, Vec<u8>, usize),
    DelayMs(u32),
    DelayUs(u32),
    DelayNs(u32),
}

/// Replies are handed out to reads in order; a read with no reply left fails with
/// `ErrorKind::Other`, as does a write once `fail_writes_after` writes have happened.
#[derive(Default)]
pub(crate) struct BusLog {
    events: RefCell<Vec<Event>>,
    replies: RefCell<VecDeque<Vec<u8>>>,
    fail_writes_after: Option<usize>,
}

impl BusLog {
    pub(crate) fn with_replies(replies: &[&[u8]]) -> Self {
        Self {
            replies: RefCell::new(replies.iter().map(|r| r.to_vec()).collect()),
            ..Default::default()
        }
    }

    pub(crate) fn failing_writes_after(mut self, writes: usize) -> Self {
        self.fail_writes_after = Some(writes);
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub(crate) fn unused_replies(&self) -> usize {
        self.replies.borrow().len()
    }

    fn run(&self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let mut written = Vec::new();
        let mut read_any = false;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => written.extend_from_slice(bytes),
                Operation::Read(buf) => {
                    let reply = self.replies.borrow_mut().pop_front().ok_or(ErrorKind::Other)?;
                    assert_eq!(reply.len(), buf.len(), "reply length");
                    buf.copy_from_slice(&reply);
                    self.events
                        .borrow_mut()
                        .push(Event::WriteRead(address, written.clone(), buf.len()));
                    read_any = true;
                }
            }
        }
        if !read_any {
            let writes_so_far = self
                .events
                .borrow()
                .iter()
                .filter(|e| matches!(e, Event::Write(..)))
                .count();
            if self.fail_writes_after.is_some_and(|n| writes_so_far >= n) {
                return Err(ErrorKind::Other);
            }
            self.events.borrow_mut().push(Event::Write(address, written));
        }
        Ok(())
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl ErrorType for &BusLog {
    type Error = ErrorKind;
}

impl embedded_hal::i2c::I2c for &BusLog {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

impl embedded_hal_async::i2c::I2c for &BusLog {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

impl embedded_hal::delay::DelayNs for &BusLog {
    fn delay_ns(&mut self, ns: u32) {
        self.record(Event::DelayNs(ns));
    }
    fn delay_us(&mut self, us: u32) {
        self.record(Event::DelayUs(us));
    }
    fn delay_ms(&mut self, ms: u32) {
        self.record(Event::DelayMs(ms));
    }
}

impl embedded_hal_async::delay::DelayNs for &BusLog {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(Event::DelayNs(ns));
    }
    async fn delay_us(&mut self, us: u32) {
        self.record(Event::DelayUs(us));
    }
    async fn delay_ms(&mut self, ms: u32) {
        self.record(Event::DelayMs(ms));
    }
}
