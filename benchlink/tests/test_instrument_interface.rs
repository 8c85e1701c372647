//! Tests for the default implementation of the [`InstrumentInterface`] trait.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use benchlink::{InstrumentError, InstrumentInterface};

/// Minimal interface that only provides the two required methods.
struct TestInstrument {
    port: VecDeque<u8>,
    written: Vec<u8>,
}

impl InstrumentInterface for TestInstrument {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.port.pop_front().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "port is empty")
            })?;
        }
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.written.extend_from_slice(data);
        Ok(())
    }
}

fn crt_inst(response: &[u8]) -> TestInstrument {
    TestInstrument {
        port: response.iter().copied().collect(),
        written: Vec::new(),
    }
}

#[fixture]
fn inst() -> TestInstrument {
    crt_inst(b"")
}

#[rstest]
fn test_default_get_terminator(inst: TestInstrument) {
    assert_eq!(inst.get_terminator(), "\n");
}

#[rstest]
fn test_default_get_timeout(inst: TestInstrument) {
    assert_eq!(inst.get_timeout(), Duration::from_secs(3));
}

/// The default `query` appends the terminator and trims the response.
#[rstest]
fn test_default_query() {
    let mut inst = crt_inst(b"10Bits \n");
    assert_eq!(inst.query("ACQuire:RESolution?").unwrap(), "10Bits");
    assert_eq!(inst.written, b"ACQuire:RESolution?\n");
}

#[rstest]
#[case(b"1\n", true)]
#[case(b"0\n", false)]
fn test_default_check_acknowledgment(#[case] response: &[u8], #[case] ok: bool) {
    let mut inst = crt_inst(response);
    let res = inst.check_acknowledgment("1");
    assert_eq!(res.is_ok(), ok);
    if let Err(err) = res {
        assert!(matches!(err, InstrumentError::NotAcknowledged(resp) if resp == "0"));
    }
}

#[rstest]
fn test_default_read_bytes() {
    let mut inst = crt_inst(&[0x01, 0x0a, 0x02]);
    assert_eq!(inst.read_bytes(3).unwrap(), vec![0x01, 0x0a, 0x02]);
    assert!(inst.read_bytes(1).is_err());
}
