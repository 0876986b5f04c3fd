use sysinfo::System;

/// Refuses to start a second `etld` process against the same executable.
/// Enumerates the OS process table and checks for another PID running the
/// same executable name as this process.
pub fn ensure_single_instance() -> bool {
    let current_pid = sysinfo::get_current_pid().ok();
    let system = System::new_all();
    let Ok(current_exe) = std::env::current_exe() else {
        return true;
    };
    let current_name = current_exe.file_name().and_then(|n| n.to_str()).unwrap_or("etld");

    system
        .processes()
        .iter()
        .filter(|(pid, _)| Some(**pid) != current_pid)
        .all(|(_, process)| process.name().to_str() != Some(current_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_running_instance_passes() {
        assert!(ensure_single_instance());
    }
}
