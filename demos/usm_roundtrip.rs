use usm_rs::{UsmDevice, UsmResult, UsmShared, get_current_queue};

fn main() -> UsmResult<()> {
    let queue = get_current_queue()?;

    // Shared memory: direct byte views.
    let mut shared = UsmShared::with_queue(64, &queue)?;
    shared.as_bytes_mut().fill(0xAB);
    println!(
        "shared[0..4] = {:02x?} ({} bytes, kind {})",
        &shared.as_bytes()[..4],
        shared.nbytes(),
        shared.usm_type()
    );

    // Device memory: reached through explicit copies.
    let mut device = UsmDevice::with_queue(64, &queue)?;
    let pattern: Vec<u8> = (0..64).collect();
    device.copy_from_host(&pattern)?;

    let mut readback = vec![0u8; 64];
    device.copy_to_host(&mut readback)?;

    assert_eq!(pattern, readback);
    println!("device round trip OK ({} bytes)", device.nbytes());

    Ok(())
}
