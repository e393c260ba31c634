//! Process and host facts used in health data and log lines

use sysinfo::System;

/// Host name of the machine, or `unknown`
pub fn machine_name() -> String {
    hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Operating system name and version, e.g. `Linux 22.04 Ubuntu`
pub fn os_version() -> String {
    System::long_os_version()
        .or_else(System::kernel_version)
        .unwrap_or_else(|| std::env::consts::OS.to_string())
}

/// Number of logical processors available to the process
pub fn processor_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Resident memory of this process in bytes, where the platform exposes it
pub fn working_set_bytes() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    if !system.refresh_process(pid) {
        return None;
    }
    system.process(pid).map(|process| process.memory())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_name_matches_host() {
        let name = machine_name();
        assert!(!name.is_empty());
        if let Ok(host) = hostname::get() {
            assert_eq!(name, host.to_string_lossy().trim());
        }
    }

    #[test]
    fn test_os_version_is_not_a_platform_tag() {
        let version = os_version();
        assert!(!version.is_empty());
        if let Some(long) = System::long_os_version() {
            assert_eq!(version, long);
        }
    }

    #[test]
    fn test_processor_count() {
        assert!(processor_count() >= 1);
    }

    #[test]
    fn test_working_set_reported_on_supported_platforms() {
        if sysinfo::IS_SUPPORTED_SYSTEM {
            assert!(working_set_bytes().unwrap() > 0);
        }
    }
}
