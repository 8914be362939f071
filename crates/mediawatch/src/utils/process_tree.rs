//! Process-tree termination: walk every descendant of a supervised PID and
//! signal each with TERM, so `requestHalt()` cannot leave an orphaned
//! grandchild holding the capture output file open.

use std::collections::{HashSet, VecDeque};

use sysinfo::{Pid, Signal, System};

/// Send SIGTERM to `root_pid` and every process transitively parented by
/// it. Returns the PIDs that were signalled (best-effort: a PID that has
/// already exited is silently skipped, matching the "absorbed" cancellation
/// semantics around halt).
pub fn terminate_process_tree(root_pid: u32) -> Vec<u32> {
    let mut system = System::new_all();
    system.refresh_all();

    let root = Pid::from_u32(root_pid);
    let mut children_of: std::collections::HashMap<Pid, Vec<Pid>> = std::collections::HashMap::new();
    for (pid, process) in system.processes() {
        if let Some(parent) = process.parent() {
            children_of.entry(parent).or_default().push(*pid);
        }
    }

    let mut to_signal = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(root);
    seen.insert(root);

    while let Some(pid) = queue.pop_front() {
        to_signal.push(pid);
        if let Some(children) = children_of.get(&pid) {
            for &child in children {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
    }

    let mut signalled = Vec::new();
    for pid in to_signal {
        if let Some(process) = system.process(pid) {
            if process.kill_with(Signal::Term).is_some() {
                signalled.push(pid.as_u32());
            }
        }
    }
    signalled
}
