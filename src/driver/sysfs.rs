use std::fs;
use std::path::Path;
use std::thread;

const CPU_POSSIBLE_PATH: &str = "/sys/devices/system/cpu/possible";
const DRM_CLASS_PATH: &str = "/sys/class/drm";

/// Number of possible CPUs, read from sysfs.
///
/// Falls back to `available_parallelism` and finally to 1, so this never
/// fails even on a stripped-down /sys.
#[must_use]
pub fn cpu_core_count() -> u32 {
    if let Ok(raw) = fs::read_to_string(CPU_POSSIBLE_PATH)
        && let Some(count) = parse_cpu_list(raw.trim())
        && count > 0
    {
        return count;
    }

    thread::available_parallelism().map_or(1, |n| n.get() as u32)
}

/// Parses a kernel CPU list ("0-7", "0", "0-3,8-11") into a CPU count.
fn parse_cpu_list(raw: &str) -> Option<u32> {
    let mut count = 0u32;

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo.trim().parse().ok()?;
            let hi: u32 = hi.trim().parse().ok()?;
            if hi < lo {
                return None;
            }
            count += hi - lo + 1;
        } else {
            part.parse::<u32>().ok()?;
            count += 1;
        }
    }

    Some(count)
}

/// DRM render node names ("renderD128", ...), sorted for stable indexing.
///
/// A missing or unreadable /sys tree yields an empty list, not an error.
#[must_use]
pub fn render_nodes() -> Vec<String> {
    scan_render_nodes(Path::new(DRM_CLASS_PATH))
}

fn scan_render_nodes(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut nodes: Vec<String> = entries
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with("renderD"))
        .collect();

    nodes.sort();
    nodes
}

/// Best-effort driver name for a render node, from `device/uevent`.
#[must_use]
pub fn render_node_driver(node: &str) -> Option<String> {
    let path = Path::new(DRM_CLASS_PATH).join(node).join("device/uevent");
    let raw = fs::read_to_string(path).ok()?;

    raw.lines()
        .find_map(|line| line.strip_prefix("DRIVER="))
        .map(|driver| driver.trim().to_string())
}
