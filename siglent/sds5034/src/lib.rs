//! A rust driver for the Siglent SDS5034X oscilloscope.
//!
//! Besides the usual settings of the scope, i.e., acquisition state, timebase, and channel
//! settings, this driver reads waveforms from the scope. A waveform read consists of:
//!
//! 1. Reading the binary waveform descriptor (preamble), which contains the calibration of the
//!    acquisition, see [`WaveformDescriptor`].
//! 2. Reading the samples in pages, as the scope limits the number of points per transfer.
//! 3. Decoding the samples into ADC codes, see [`decode_samples`].
//! 4. Converting the codes to times and voltages, see [`assemble`].
//!
//! The driver keeps the last descriptor and waveform of every channel it read.
//!
//! # Example
//!
//! ```no_run
//! use benchlink::TcpIpInterface;
//! use siglent_sds5034::{DEFAULT_PORT, Sds5034};
//!
//! let interface = TcpIpInterface::try_new(("192.168.10.2", DEFAULT_PORT)).unwrap();
//! let mut scope = Sds5034::try_new(interface).unwrap();
//!
//! println!("{}", scope.get_name().unwrap());
//!
//! // Read all channels that are displayed, starting at the first point.
//! let table = scope.read_active_channels(0).unwrap();
//! for waveform in table.iter() {
//!     println!("C{}: {} samples", waveform.channel, waveform.len());
//! }
//! ```

#![warn(missing_docs)]

mod block;
mod error;
mod preamble;
mod samples;
mod settings;
mod waveform;

pub use block::{DEFAULT_TRAILER_LEN, MAX_MARKER_SCAN, drain_trailer, read_block, split_block};
pub use error::{DecodeError, TransferError, WaveformError};
pub use preamble::{
    Decode, Field, TIMEBASE_TABLE, Text16, WaveformDescriptor, decode_descriptor, layout, span,
    timebase_from_index,
};
pub use samples::{Page, SampleCodes, decode_samples, decode_samples_ordered, plan_pages};
pub use settings::{BandwidthLimit, ByteOrder, Coupling, SampleFormat};
pub use waveform::{HORIZONTAL_DIVISIONS, Sample, TableRow, Waveform, WaveformTable, assemble};

use std::sync::{Arc, Mutex};

use benchlink::{InstrumentError, InstrumentInterface};
use log::{debug, warn};
use measurements::{Frequency, Voltage};

use settings::IndexTable;
use waveform::WaveformStore;

/// Port of the raw SCPI socket of the scope.
pub const DEFAULT_PORT: u16 = 5025;

/// Number of analog channels of the scope.
const NOF_CHANNELS: u8 = 4;

/// Largest descriptor block that is accepted, in bytes.
const MAX_DESCRIPTOR_LEN: usize = 1 << 16;

/// Limits of the probe attenuation factor, exclusive.
const PROBE_LIMITS: (f64, f64) = (1e-6, 1e6);

/// Settings of the driver itself, shared with all channels.
#[derive(Debug, Clone, Copy)]
struct DriverConfig {
    block_until_finished: bool,
    block_trailer_len: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            block_until_finished: false,
            block_trailer_len: DEFAULT_TRAILER_LEN,
        }
    }
}

/// A rust driver for the SDS5034X.
///
/// See the top-level documentation for an example on how to use this driver.
pub struct Sds5034<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    store: Arc<Mutex<WaveformStore>>,
    config: Arc<Mutex<DriverConfig>>,
}

impl<T: InstrumentInterface> Sds5034<T> {
    /// Create a new SDS5034 instance with the given instrument interface.
    ///
    /// The terminator of the interface is set to `"\n"`.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        Ok(Sds5034 {
            interface: Arc::new(Mutex::new(intf)),
            store: Arc::new(Mutex::new(WaveformStore::default())),
            config: Arc::new(Mutex::new(DriverConfig::default())),
        })
    }

    /// Get a channel of the scope.
    ///
    /// Channels are numbered as on the front panel, i.e., from 1 to 4.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        let idx = check_channel(idx)?;
        Ok(Channel::new(idx, self.clone()))
    }

    /// Wait for every command to finish before returning.
    ///
    /// If set, every setting command is followed by `*OPC?` and the scope must answer `1`. This
    /// is off by default.
    pub fn set_block_until_finished(&mut self, block: bool) {
        self.config
            .lock()
            .expect("Mutex should not be poisoned")
            .block_until_finished = block;
    }

    /// Get whether commands wait until the scope finished them.
    pub fn get_block_until_finished(&self) -> bool {
        self.config
            .lock()
            .expect("Mutex should not be poisoned")
            .block_until_finished
    }

    /// Set the number of bytes that follow every binary block and are discarded.
    ///
    /// The scope terminates blocks with `"\n\n"`, so the default is 2.
    pub fn set_block_trailer_len(&mut self, len: usize) {
        self.config
            .lock()
            .expect("Mutex should not be poisoned")
            .block_trailer_len = len;
    }

    /// Query the identification of the scope.
    ///
    /// Returns manufacturer, model, serial number, and firmware version, separated by commas.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Start acquiring, like the Run button on the front panel.
    pub fn run(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("ACQuire:STATE RUN")
    }

    /// Stop acquiring, like the Stop button on the front panel.
    pub fn stop(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("ACQuire:STATE STOP")
    }

    /// Get whether the scope is acquiring.
    pub fn get_run_state(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.query("ACQ:STATE?")?;
        match resp.as_str() {
            "1" => Ok(true),
            "0" => Ok(false),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Block until all pending operations of the scope are finished.
    pub fn wait(&mut self) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd("*OPC?")?;
        intf.check_acknowledgment("1")
    }

    /// Get the resolution of the ADC in bits.
    pub fn get_adc_resolution(&mut self) -> Result<u8, InstrumentError> {
        let resp = self.query("ACQuire:RESolution?")?;
        let bits = resp
            .strip_suffix("Bits")
            .or_else(|| resp.strip_suffix("bits"))
            .unwrap_or(&resp);
        bits.trim()
            .parse::<u8>()
            .map_err(|_| InstrumentError::ResponseParseError(resp.clone()))
    }

    /// Set the resolution of the ADC.
    ///
    /// The scope only accepts a new resolution while running. It is therefore started for the
    /// change and stopped again afterwards if it was stopped before.
    ///
    /// # Arguments
    /// * `bits` - 8 or 10.
    pub fn set_adc_resolution(&mut self, bits: u8) -> Result<(), InstrumentError> {
        if bits != 8 && bits != 10 {
            return Err(InstrumentError::InvalidArgument(format!(
                "ADC resolution must be 8 or 10 bits, not {bits}"
            )));
        }
        let running = self.get_run_state()?;
        self.run()?;
        self.sendcmd(&format!("ACQuire:RESolution {bits}Bits"))?;
        if !running {
            self.stop()?;
        }
        Ok(())
    }

    /// Get the sample rate.
    pub fn get_sample_rate(&mut self) -> Result<Frequency, InstrumentError> {
        Ok(Frequency::from_hertz(self.query_f64("ACQuire:SRATe?")?))
    }

    /// Get the horizontal scale in seconds per division.
    pub fn get_time_scale(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64("TIMebase:SCALe?")
    }

    /// Set the horizontal scale in seconds per division.
    ///
    /// The scope rounds to the closest scale it supports.
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("TIMebase:SCALe {scale:E}"))
    }

    /// Get the delay between trigger and the center of the screen in seconds.
    pub fn get_time_delay(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64("TIMebase:DELay?")
    }

    /// Set the delay between trigger and the center of the screen in seconds.
    pub fn set_time_delay(&mut self, delay: f64) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("TIMebase:DELay {delay:E}"))
    }

    /// Get the channel that waveforms are transferred from.
    pub fn get_wave_source(&mut self) -> Result<u8, InstrumentError> {
        let resp = self.query("WAVeform:SOURce?")?;
        resp.strip_prefix('C')
            .and_then(|ch| ch.parse::<u8>().ok())
            .ok_or_else(|| InstrumentError::ResponseParseError(resp.clone()))
    }

    /// Set the channel that waveforms are transferred from.
    pub fn set_wave_source(&mut self, channel: u8) -> Result<(), InstrumentError> {
        check_channel(channel.into())?;
        self.sendcmd(&format!("WAVeform:SOURce C{channel}"))
    }

    /// Get the first point of the next transfer.
    pub fn get_wave_start(&mut self) -> Result<usize, InstrumentError> {
        self.query_count("WAVeform:STARt?")
    }

    /// Set the first point of the next transfer.
    pub fn set_wave_start(&mut self, point: usize) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("WAVeform:STARt {point}"))
    }

    /// Get the number of points of the next transfer. Zero means all points.
    pub fn get_wave_points(&mut self) -> Result<usize, InstrumentError> {
        self.query_count("WAVeform:POINt?")
    }

    /// Set the number of points of the next transfer.
    pub fn set_wave_points(&mut self, points: usize) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("WAVeform:POINt {points}"))
    }

    /// Get the maximum number of points the scope sends in one transfer.
    pub fn get_wave_max_points(&mut self) -> Result<usize, InstrumentError> {
        self.query_count("WAVeform:MAXPoint?")
    }

    /// Get the interval between transferred points.
    pub fn get_wave_interval(&mut self) -> Result<usize, InstrumentError> {
        self.query_count("WAVeform:INTerval?")
    }

    /// Set the interval between transferred points.
    pub fn set_wave_interval(&mut self, interval: usize) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("WAVeform:INTerval {interval}"))
    }

    /// Get the width of transferred samples.
    pub fn get_wave_width(&mut self) -> Result<SampleFormat, InstrumentError> {
        SampleFormat::from_cmd_str(&self.query("WAVeform:WIDTh?")?)
    }

    /// Set the width of transferred samples.
    pub fn set_wave_width(&mut self, width: SampleFormat) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("WAVeform:WIDTh {}", width.as_str()))
    }

    /// Read a fresh waveform descriptor of the given channel.
    ///
    /// This sets the waveform source to the channel. The descriptor is kept, see
    /// [`Sds5034::get_preamble`].
    pub fn get_wave_preamble(&mut self, channel: u8) -> Result<WaveformDescriptor, WaveformError> {
        self.set_wave_source(channel)?;
        let descriptor = self.read_preamble()?;
        check_source(channel, &descriptor)?;
        Ok(descriptor)
    }

    /// Get the last descriptor that was read for the channel, if any.
    pub fn get_preamble(&self, channel: u8) -> Option<WaveformDescriptor> {
        let store = self.store.lock().expect("Mutex should not be poisoned");
        store.descriptors.get(&channel).cloned()
    }

    /// Read the raw samples of a channel in pages.
    ///
    /// The waveform source must already be set to `channel`. The transfer is split into pages of
    /// at most `max_page_size` points, which are read one after the other and concatenated. If
    /// `requested_count` is zero, all points from `start_point` to the end of the acquisition are
    /// read, as reported by a fresh descriptor.
    ///
    /// Every page must hold exactly the points that were requested for it. If any page fails,
    /// all pages read before are discarded and a [`TransferError::Page`] is returned. In either
    /// case, the start point and point count of the scope are set back to `start_point` and to
    /// the point count before the transfer.
    ///
    /// # Arguments
    /// * `channel` - Channel that is read, 1 to 4.
    /// * `start_point` - First point of the transfer.
    /// * `requested_count` - Number of points, or zero for all points.
    /// * `max_page_size` - Maximum number of points per page, see
    ///   [`Sds5034::get_wave_max_points`].
    /// * `bit_depth` - Resolution of the ADC, selects byte or word transfers.
    pub fn fetch_samples(
        &mut self,
        channel: u8,
        start_point: usize,
        requested_count: usize,
        max_page_size: usize,
        bit_depth: u8,
    ) -> Result<Vec<u8>, WaveformError> {
        check_channel(channel.into())?;
        check_page_size(channel, max_page_size)?;
        let count = match requested_count {
            0 => total_count(channel, &self.get_wave_preamble(channel)?, start_point)?,
            n => n,
        };
        let prior_points = self.get_wave_points()?;
        self.fetch_pages(
            channel,
            start_point,
            count,
            max_page_size,
            bit_depth,
            prior_points,
        )
    }

    /// Read the waveform of a channel in volts.
    ///
    /// The number of points is the point count set on the scope, or, if that is zero, all points
    /// from `start_point` on. After the read, the point count of the scope is as before and the
    /// start point is `start_point`.
    ///
    /// The waveform is kept in the table of the driver, replacing an earlier waveform of the
    /// same channel, see [`Sds5034::waveforms`].
    ///
    /// # Arguments
    /// * `channel` - Channel to read, 1 to 4.
    /// * `start_point` - Index of the first point to read.
    pub fn read_wave_ch(
        &mut self,
        channel: u8,
        start_point: usize,
    ) -> Result<Waveform, WaveformError> {
        check_channel(channel.into())?;
        self.set_wave_start(start_point)?;
        self.set_wave_source(channel)?;

        let points = self.get_wave_points()?;
        let max_page_size = self.get_wave_max_points()?;
        check_page_size(channel, max_page_size)?;
        let bit_depth = self.get_adc_resolution()?;

        let descriptor = self.read_preamble()?;
        check_source(channel, &descriptor)?;
        let count = match points {
            0 => total_count(channel, &descriptor, start_point)?,
            n => n,
        };

        let raw = self.fetch_pages(
            channel,
            start_point,
            count,
            max_page_size,
            bit_depth,
            points,
        )?;
        let codes = decode_samples_ordered(&raw, bit_depth, descriptor.byte_order)?;
        let waveform = assemble(&codes, &descriptor);

        let mut store = self.store.lock().expect("Mutex should not be poisoned");
        store.waveforms.insert(waveform.clone());
        Ok(waveform)
    }

    /// Read the waveforms of all channels that are switched on.
    ///
    /// The acquisition is stopped first, such that all channels show the same trigger. The
    /// returned table only contains the channels read by this call, while the table of the
    /// driver keeps earlier waveforms of the other channels.
    ///
    /// # Arguments
    /// * `start_point` - Index of the first point to read.
    pub fn read_active_channels(
        &mut self,
        start_point: usize,
    ) -> Result<WaveformTable, WaveformError> {
        self.stop()?;
        let mut table = WaveformTable::new();
        for channel in 1..=NOF_CHANNELS {
            if self.get_channel(channel.into())?.get_state()? {
                table.insert(self.read_wave_ch(channel, start_point)?);
            }
        }
        Ok(table)
    }

    /// Get a copy of all waveforms the driver read so far, one per channel.
    pub fn waveforms(&self) -> WaveformTable {
        let store = self.store.lock().expect("Mutex should not be poisoned");
        store.waveforms.clone()
    }

    /// Forget all descriptors and waveforms read so far.
    pub fn clear_waveforms(&mut self) {
        let mut store = self.store.lock().expect("Mutex should not be poisoned");
        store.clear();
    }

    /// Read the pages of a transfer, then set the start point and point count back.
    ///
    /// The settings are restored whether the transfer succeeded or not. If both fail, the error
    /// of the transfer is returned.
    fn fetch_pages(
        &mut self,
        channel: u8,
        start_point: usize,
        count: usize,
        max_page_size: usize,
        bit_depth: u8,
        prior_points: usize,
    ) -> Result<Vec<u8>, WaveformError> {
        let width = SampleFormat::for_bit_depth(bit_depth);
        self.set_wave_width(width)?;
        let bytes_per_point = match width {
            SampleFormat::Byte => 1,
            SampleFormat::Word => 2,
        };

        let pages = plan_pages(start_point, count, max_page_size);
        let transfer = self.read_pages(channel, &pages, bytes_per_point);
        let restore = self
            .set_wave_start(start_point)
            .and_then(|()| self.set_wave_points(prior_points));

        match (transfer, restore) {
            (Ok(raw), Ok(())) => Ok(raw),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(restore_err)) => {
                warn!(
                    "Could not restore the transfer settings after C{channel} failed: {restore_err}"
                );
                Err(err)
            }
        }
    }

    fn read_pages(
        &mut self,
        channel: u8,
        pages: &[Page],
        bytes_per_point: usize,
    ) -> Result<Vec<u8>, WaveformError> {
        let mut raw = Vec::with_capacity(pages.iter().map(|p| p.len * bytes_per_point).sum());
        for page in pages {
            self.set_wave_start(page.offset)?;
            self.set_wave_points(page.len)?;
            let expected = page.len * bytes_per_point;
            let payload = self
                .query_block("WAV:DATA?", expected)
                .and_then(|payload| match payload.len() {
                    received if received == expected => Ok(payload),
                    received => Err(TransferError::LengthMismatch { expected, received }),
                })
                .map_err(|err| TransferError::Page {
                    channel,
                    page: page.index,
                    offset: page.offset,
                    source: Box::new(err),
                })?;
            debug!(
                "Read page {} of C{channel}: {} points at {}",
                page.index, page.len, page.offset
            );
            raw.extend_from_slice(&payload);
        }
        Ok(raw)
    }

    /// Read and decode the descriptor of the current waveform source and keep it.
    fn read_preamble(&mut self) -> Result<WaveformDescriptor, WaveformError> {
        let block = self.query_block("WAV:PREamble?", MAX_DESCRIPTOR_LEN)?;
        let descriptor = decode_descriptor(&block, || {
            self.get_wave_source().map_err(WaveformError::from)
        })?;
        let mut store = self.store.lock().expect("Mutex should not be poisoned");
        store
            .descriptors
            .insert(descriptor.channel_id, descriptor.clone());
        Ok(descriptor)
    }

    /// Send a command to the instrument.
    ///
    /// Waits for `*OPC?` to acknowledge if the driver blocks until commands are finished.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let block = self.get_block_until_finished();
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)?;
        if block {
            intf.sendcmd("*OPC?")?;
            intf.check_acknowledgment("1")?;
        }
        Ok(())
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(cmd)
    }

    fn query_f64(&mut self, cmd: &str) -> Result<f64, InstrumentError> {
        let resp = self.query(cmd)?;
        resp.parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Query a number of points. The scope may answer in exponential notation.
    fn query_count(&mut self, cmd: &str) -> Result<usize, InstrumentError> {
        let resp = self.query(cmd)?;
        match resp.parse::<f64>() {
            Ok(val) if val.is_finite() && val >= 0.0 && val.fract() == 0.0 => Ok(val as usize),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Query a binary block of at most `max_len` bytes and return its payload.
    fn query_block(&mut self, cmd: &str, max_len: usize) -> Result<Vec<u8>, TransferError> {
        let trailer_len = self
            .config
            .lock()
            .expect("Mutex should not be poisoned")
            .block_trailer_len;
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)?;
        read_block(&mut *intf, trailer_len, max_len)
    }
}

impl<T: InstrumentInterface> Clone for Sds5034<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

/// Channel structure representing a single analog channel of the SDS5034X.
///
/// **This structure can only be created through the [`Sds5034`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: u8,
    scope: Sds5034<T>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// Get a new channel for the given scope.
    ///
    /// This function can only be called from inside of the [`Sds5034`] struct.
    fn new(idx: u8, scope: Sds5034<T>) -> Self {
        Channel { idx, scope }
    }

    /// Get whether the channel is switched on, i.e., displayed.
    pub fn get_state(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.query("SWITch?")?;
        match resp.to_ascii_uppercase().as_str() {
            "ON" => Ok(true),
            "OFF" => Ok(false),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Switch the channel on or off.
    pub fn set_state(&mut self, on: bool) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("SWITch {}", if on { "ON" } else { "OFF" }))
    }

    /// Get the input coupling.
    pub fn get_coupling(&mut self) -> Result<Coupling, InstrumentError> {
        Coupling::from_cmd_str(&self.query("COUPling?")?)
    }

    /// Set the input coupling.
    pub fn set_coupling(&mut self, coupling: Coupling) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("COUPling {}", coupling.as_str()))
    }

    /// Get the vertical scale per division.
    pub fn get_scale(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.query_f64("SCALe?")?))
    }

    /// Set the vertical scale per division.
    ///
    /// The scale includes the probe attenuation.
    pub fn set_scale(&mut self, scale: Voltage) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("SCALe {}", scale.as_volts()))
    }

    /// Get the vertical offset.
    pub fn get_offset(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.query_f64("OFFSet?")?))
    }

    /// Set the vertical offset.
    pub fn set_offset(&mut self, offset: Voltage) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("OFFSet {}", offset.as_volts()))
    }

    /// Get the probe attenuation factor.
    pub fn get_probe(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64("PROBe?")
    }

    /// Set the probe attenuation factor.
    ///
    /// This only changes how the scope scales the display, not the input sensitivity.
    ///
    /// # Arguments
    /// * `attenuation` - Factor between 1e-6 and 1e6, exclusive, or `None` for the default 1X.
    pub fn set_probe(&mut self, attenuation: Option<f64>) -> Result<(), InstrumentError> {
        match attenuation {
            None => self.sendcmd("PROBe DEFault"),
            Some(value) => {
                let (min, max) = PROBE_LIMITS;
                if !(value > min && value < max) {
                    return Err(InstrumentError::FloatValueOutOfRange { value, min, max });
                }
                self.sendcmd(&format!("PROBe VALue {value}"))
            }
        }
    }

    /// Read the waveform of this channel, see [`Sds5034::read_wave_ch`].
    pub fn read_waveform(&mut self, start_point: usize) -> Result<Waveform, WaveformError> {
        self.scope.read_wave_ch(self.idx, start_point)
    }

    /// Get the last descriptor that was read for this channel, if any.
    pub fn get_preamble(&self) -> Option<WaveformDescriptor> {
        self.scope.get_preamble(self.idx)
    }

    /// Send a command for this channel.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        self.scope.sendcmd(&format!("CHANnel{}:{cmd}", self.idx))
    }

    /// Query the instrument with a command for this channel.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.scope.query(&format!("CHANnel{}:{cmd}", self.idx))
    }

    fn query_f64(&mut self, cmd: &str) -> Result<f64, InstrumentError> {
        self.scope.query_f64(&format!("CHANnel{}:{cmd}", self.idx))
    }
}

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            scope: self.scope.clone(),
        }
    }
}

/// Check that a channel exists and return it as channel number.
fn check_channel(idx: usize) -> Result<u8, InstrumentError> {
    match u8::try_from(idx) {
        Ok(ch) if (1..=NOF_CHANNELS).contains(&ch) => Ok(ch),
        _ => Err(InstrumentError::ChannelIndexOutOfRange {
            idx,
            nof_channels: NOF_CHANNELS.into(),
        }),
    }
}

fn check_page_size(channel: u8, max_page_size: usize) -> Result<(), WaveformError> {
    if max_page_size == 0 {
        return Err(WaveformError::ProtocolState {
            channel,
            reason: "scope reports a maximum page size of zero".to_string(),
        });
    }
    Ok(())
}

/// Make sure the descriptor belongs to the requested channel.
fn check_source(channel: u8, descriptor: &WaveformDescriptor) -> Result<(), WaveformError> {
    if descriptor.channel_id != channel {
        return Err(WaveformError::ProtocolState {
            channel,
            reason: format!("waveform source is C{}", descriptor.channel_id),
        });
    }
    Ok(())
}

/// Number of points of the acquisition from `start_point` on, which must not be zero.
fn total_count(
    channel: u8,
    descriptor: &WaveformDescriptor,
    start_point: usize,
) -> Result<usize, WaveformError> {
    match (descriptor.sample_count, descriptor.sample_count.checked_sub(start_point)) {
        (0, _) => Err(WaveformError::ProtocolState {
            channel,
            reason: "descriptor reports zero samples".to_string(),
        }),
        (_, Some(n)) if n > 0 => Ok(n),
        (total, _) => Err(WaveformError::ProtocolState {
            channel,
            reason: format!("start point {start_point} is beyond the {total} samples"),
        }),
    }
}
