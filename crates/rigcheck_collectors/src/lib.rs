//! Probes that fill the diagnostic snapshot.
//!
//! Each module implements one [`Collector`] for one snapshot section. The
//! Windows-only probes shell out to `powershell`, `reg`, or `wevtutil` and
//! degrade to an unavailable section elsewhere; everything that sysinfo or
//! plain sockets can answer works on any platform. Parsing is kept in pure
//! helpers so the command output handling stays testable off the box that
//! produced it.

pub mod disk_bench;
pub mod drivers;
pub mod event_log;
pub mod hardware;
pub mod launchers;
pub mod network;
pub mod prerequisites;
mod probe;
pub mod processes;
pub mod system;

use rigcheck_core::Collector;
use std::sync::Arc;

pub use disk_bench::BenchmarkCollector;
pub use drivers::DriverCollector;
pub use event_log::EventLogCollector;
pub use hardware::HardwareCollector;
pub use launchers::LauncherCollector;
pub use network::NetworkCollector;
pub use prerequisites::PrereqCollector;
pub use processes::ProcessCollector;
pub use system::SystemCollector;

/// The full probe set, one collector per snapshot section.
pub fn default_collectors() -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(HardwareCollector),
        Arc::new(SystemCollector),
        Arc::new(EventLogCollector),
        Arc::new(DriverCollector),
        Arc::new(LauncherCollector),
        Arc::new(NetworkCollector),
        Arc::new(BenchmarkCollector),
        Arc::new(PrereqCollector),
        Arc::new(ProcessCollector),
    ]
}
