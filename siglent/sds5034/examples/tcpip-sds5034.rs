use benchlink::TcpIpInterface;

use siglent_sds5034::{DEFAULT_PORT, Sds5034};

fn main() {
    // Set `RUST_LOG=debug` to see every page of the transfers.
    env_logger::init();

    // Connect to the raw SCPI socket of the scope.
    let interface = TcpIpInterface::try_new(("192.168.10.2", DEFAULT_PORT)).unwrap();

    // Now we can open the scope with the TcpIpInterface.
    let mut inst = Sds5034::try_new(interface).unwrap();

    // Query and print the name of the instrument
    println!("Instrument name: {}", inst.get_name().unwrap());
    println!("ADC resolution: {} bits", inst.get_adc_resolution().unwrap());
    println!("Sample rate: {}", inst.get_sample_rate().unwrap());

    // Read the first channel and print its calibration
    let mut ch1 = inst.get_channel(1).unwrap();
    let waveform = ch1.read_waveform(0).unwrap();
    let desc = ch1.get_preamble().unwrap();
    println!(
        "C1: {} samples, {} V/div, {} s/div",
        waveform.len(),
        desc.vertical_gain,
        desc.time_per_division_seconds
    );
    for sample in waveform.samples.iter().take(5) {
        println!("{:>14.9} s {:>10.5} V", sample.time_s, sample.volts);
    }

    // Stop the scope and read all channels that are on
    let table = inst.read_active_channels(0).unwrap();
    println!("Channels read: {:?}", table.channels());

    // Print the first rows of all waveforms read so far, one column per channel
    let all = inst.waveforms();
    println!("time (s)\t{:?}", all.channels());
    for row in all.rows().iter().take(10) {
        println!("{:e}\t{:?}", row.time_s, row.volts);
    }
}
