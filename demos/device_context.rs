use usm_rs::{UsmResult, UsmShared, device_context, get_current_queue, num_activated_queues};

fn main() -> UsmResult<()> {
    let queue = get_current_queue()?;
    println!(
        "Default queue: id {} on {}",
        queue.id(),
        queue.device().name
    );

    let mem = UsmShared::with_queue(1024, &queue)?;
    println!("Allocated {} bytes of {} memory", mem.nbytes(), mem.usm_type());

    {
        let scope = device_context("opencl:cpu:0")?;
        println!(
            "Inside scope: queue id {} ({} active scopes)",
            scope.queue().id(),
            num_activated_queues()
        );
        println!(
            "Kind from scoped queue: {}",
            mem.usm_type_for(scope.queue())
        );
    }

    println!("After scope: {} active scopes", num_activated_queues());
    println!("Intrinsic kind unchanged: {}", mem.usm_type());

    Ok(())
}
