//! The loopback module provides a scripted instrument for testing drivers.
//!
//! The host side of SCPI is always text, so expected commands are given as strings. The
//! instrument side is either a line of text or raw bytes, e.g., a binary waveform block, see
//! [`LoopbackReply`].

use std::collections::VecDeque;

use crate::{InstrumentError, InstrumentInterface};

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }
}

/// One scripted reply from the instrument to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopbackReply {
    /// A text line. The current terminator of the interface is appended when it is read.
    Line(String),
    /// Raw bytes that are handed to the host exactly as given.
    Raw(Vec<u8>),
}

impl LoopbackReply {
    fn into_bytes(self, terminator: &str) -> Vec<u8> {
        match self {
            LoopbackReply::Line(line) => format!("{line}{terminator}").into_bytes(),
            LoopbackReply::Raw(bytes) => bytes,
        }
    }
}

impl From<&str> for LoopbackReply {
    fn from(value: &str) -> Self {
        LoopbackReply::Line(value.to_string())
    }
}

impl From<String> for LoopbackReply {
    fn from(value: String) -> Self {
        LoopbackReply::Line(value)
    }
}

impl From<Vec<u8>> for LoopbackReply {
    fn from(value: Vec<u8>) -> Self {
        LoopbackReply::Raw(value)
    }
}

/// An interface that allows you to simply write tests for your instrument driver.
///
/// You provide the commands that are expected from the host, in order, and the replies the
/// instrument sends back, in order. Whenever the driver writes something that was not expected
/// next, the interface panics. When the interface is dropped, it panics if any command or reply
/// was left unused. This way, a test fails unless the driver exchanged exactly the scripted
/// conversation.
///
/// # Example
///
/// ```
/// use benchlink::{InstrumentError, InstrumentInterface, LoopbackInterface, LoopbackReply};
///
/// struct MyScope<T: InstrumentInterface> {
///     interface: T,
/// }
///
/// impl<T: InstrumentInterface> MyScope<T> {
///     fn get_name(&mut self) -> Result<String, InstrumentError> {
///         self.interface.query("*IDN?")
///     }
/// }
///
/// let loopback = LoopbackInterface::new(
///     vec!["*IDN?".to_string()],
///     vec![LoopbackReply::from("Siglent Technologies,SDS5034X,SDS5X0001,3.8.12")],
/// );
/// let mut scope = MyScope { interface: loopback };
/// assert_eq!(
///     scope.get_name().unwrap(),
///     "Siglent Technologies,SDS5034X,SDS5X0001,3.8.12"
/// );
/// ```
pub struct LoopbackInterface {
    from_host: Vec<String>,
    from_inst: Vec<LoopbackReply>,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    terminator: String,
}

impl LoopbackInterface {
    /// Create a new loopback interface with the given conversation.
    ///
    /// # Arguments:
    /// * `from_host` - Commands from host to instrument, without terminator.
    /// * `from_inst` - Replies from instrument to host.
    pub fn new(from_host: Vec<String>, from_inst: Vec<LoopbackReply>) -> Self {
        LoopbackInterface {
            from_host,
            from_inst,
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            terminator: "\n".to_string(),
        }
    }

    /// Panic if not all commands and replies have been used.
    ///
    /// This is called automatically on drop, but can be called by hand as well.
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.next());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.next());
        if let Some(fil) = from_host_leftover {
            panic!("Leftover expected commands found from host to instrument: {fil}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover expected replies found from instrument to host: {fil:?}");
        }
        if !self.curr_bytes.is_empty() {
            panic!(
                "{} bytes of the last reply were never read by the host.",
                self.curr_bytes.len()
            );
        }
    }

    /// Assert that the interface currently uses the expected terminator.
    pub fn test_terminator(&self, expected_terminator: &str) {
        assert_eq!(
            expected_terminator, self.terminator,
            "Expected terminator '{expected_terminator:?}', got '{:?}'",
            self.terminator
        );
    }

    /// Get the next command from host to instrument including the terminator, or panic.
    fn get_next_from_host_with_terminator(&mut self) -> String {
        let cmd = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more commands were expected from host to instrument.");
        format!("{cmd}{}", self.terminator)
    }

    /// Function to read exactly one byte from the scripted replies.
    ///
    /// This panics if there are no more replies, which is justified for a test interface.
    fn read_one_byte(&mut self) -> u8 {
        match self.curr_bytes.pop_front() {
            Some(byte) => byte,
            None => {
                let next = self
                    .from_inst
                    .get(self.from_inst_index.next())
                    .expect("No more replies were expected from instrument to host.")
                    .clone();
                self.curr_bytes = next.into_bytes(&self.terminator).into();
                self.read_one_byte()
            }
        }
    }
}

impl InstrumentInterface for LoopbackInterface {
    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
        Ok(())
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self.get_next_from_host_with_terminator();
        assert_eq!(
            exp.as_bytes(),
            cmd,
            "Expected sendcmd '{exp:?}', got '{:?}'",
            String::from_utf8_lossy(cmd)
        );
        Ok(())
    }
}

impl Drop for LoopbackInterface {
    fn drop(&mut self) {
        // A second panic while unwinding would abort the test binary.
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}
