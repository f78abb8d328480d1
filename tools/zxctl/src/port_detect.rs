use glob::glob;

const PATTERNS: &[&str] = &[
    "/dev/cu.usbserial*",
    "/dev/cu.usbmodem*",
    "/dev/cu.SLAB_USBtoUART*",
    "/dev/tty.usbserial*",
    "/dev/tty.usbmodem*",
    "/dev/tty.SLAB_USBtoUART*",
    "/dev/ttyUSB*",
    "/dev/ttyACM*",
];

// Earlier groups win when exactly one candidate falls in them.
const PREFERENCE: &[&[&str]] = &[
    &["/dev/cu."],
    &["/dev/ttyUSB", "/dev/ttyACM"],
    &["/dev/tty."],
];

pub fn list_candidates() -> Vec<String> {
    let mut out = Vec::new();
    for pattern in PATTERNS {
        let Ok(entries) = glob(pattern) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.display().to_string();
            if !out.contains(&path) {
                out.push(path);
            }
        }
    }
    out
}

pub fn detect_port() -> Option<String> {
    let hint = std::env::var("ZXCTL_PORT_HINT")
        .ok()
        .filter(|s| !s.trim().is_empty());
    pick_port(list_candidates(), hint.as_deref())
}

/// Picks the single unambiguous device, or `None` when the choice needs a
/// human.
pub fn pick_port(mut candidates: Vec<String>, hint: Option<&str>) -> Option<String> {
    if let Some(hint) = hint {
        candidates.retain(|c| c.contains(hint));
    }

    for prefixes in PREFERENCE {
        let mut group = candidates
            .iter()
            .filter(|c| prefixes.iter().any(|prefix| c.starts_with(prefix)));
        if let (Some(only), None) = (group.next(), group.next()) {
            return Some(only.clone());
        }
    }

    if candidates.len() == 1 {
        return candidates.pop();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_linux_adapter_is_chosen() {
        assert_eq!(
            pick_port(ports(&["/dev/ttyUSB0"]), None).as_deref(),
            Some("/dev/ttyUSB0")
        );
    }

    #[test]
    fn cu_device_beats_its_tty_twin() {
        let candidates = ports(&["/dev/tty.usbserial-1420", "/dev/cu.usbserial-1420"]);
        assert_eq!(
            pick_port(candidates, None).as_deref(),
            Some("/dev/cu.usbserial-1420")
        );
    }

    #[test]
    fn ambiguous_ports_need_a_hint() {
        let candidates = ports(&["/dev/ttyUSB0", "/dev/ttyACM0"]);
        assert_eq!(pick_port(candidates.clone(), None), None);
        assert_eq!(
            pick_port(candidates, Some("ACM")).as_deref(),
            Some("/dev/ttyACM0")
        );
    }
}
