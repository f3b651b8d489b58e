use usm_rs::{UsmResult, discover_devices, has_cpu_queues, has_gpu_queues, has_platforms};

fn main() -> UsmResult<()> {
    println!("--- USM Runtime Capabilities ---");
    println!("Platforms:  {}", has_platforms());
    println!("CPU queues: {}", has_cpu_queues());
    println!("GPU queues: {}", has_gpu_queues());

    println!("\n--- Discovered Devices ---");
    for dev in discover_devices()? {
        println!("\n[Device ID: {}]", dev.id);
        println!("  Selector:       {}:{}:{}", dev.backend, dev.class, dev.index);
        println!("  Name:           {}", dev.name);
        println!("  Compute Units:  {}", dev.compute_units);
    }

    usm_rs::release();
    Ok(())
}
