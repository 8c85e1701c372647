//! Tests for the [`Instrument`] interface on in-memory ports.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use benchlink::{Instrument, InstrumentError, InstrumentInterface};

/// Set up an empty instrument with the default three second timeout.
#[fixture]
fn empt_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::new(), Duration::from_secs(3))
}

/// Set up an instrument with a response that has no terminator and a zero timeout.
#[fixture]
fn no_term_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(
        VecDeque::from(vec![b'r', b'e', b's', b'p']),
        Duration::from_secs(0),
    )
}

#[rstest]
fn test_instrument_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_terminator(), "\n");

    empt_inst.set_terminator("\r\n");
    assert_eq!(empt_inst.get_terminator(), "\r\n");
}

#[rstest]
fn test_instrument_timeout(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_timeout(), Duration::from_secs(3));

    empt_inst.set_timeout(Duration::from_secs(20));
    assert_eq!(empt_inst.get_timeout(), Duration::from_secs(20));
}

/// Bytes written to a `VecDeque` port can be read back exactly.
#[rstest]
fn test_instrument_write_read(mut empt_inst: Instrument<VecDeque<u8>>) {
    let data = b"#9000000004\x00\x7f\x80\xff";
    empt_inst.write_raw(data).unwrap();

    let header = empt_inst.read_bytes(11).unwrap();
    assert_eq!(header, b"#9000000004");
    let mut payload = [0u8; 4];
    empt_inst.read_exact(&mut payload).unwrap();
    assert_eq!(payload, [0x00, 0x7f, 0x80, 0xff]);
}

/// Commands get the terminator appended, lines are read back without it.
#[rstest]
fn test_instrument_sendcmd_read_line(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.sendcmd("C2").unwrap();
    assert_eq!(empt_inst.read_until_terminator().unwrap(), "C2");
}

/// Reading past the end of the port is an I/O error, not a silent short read.
#[rstest]
fn test_instrument_read_bytes_eof(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.write_raw(b"ab").unwrap();
    assert!(matches!(
        empt_inst.read_bytes(3),
        Err(InstrumentError::Io(_))
    ));
}

#[rstest]
fn test_instrument_read_until_terminator_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);

    match no_term_inst.read_until_terminator() {
        Err(InstrumentError::Timeout(timeout)) => {
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

#[rstest]
fn test_instrument_query_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);
    let query_exp = "WAVeform:SOURce?";

    match no_term_inst.query(query_exp) {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query_exp, query);
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}
