#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
struct ProcessSample {
    cpu_usage: f32,
    memory_mb: u64,
    peak_memory_mb: u64,
}

/// Logs this process's CPU and memory after each pipeline phase when enabled.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    probe: Option<Mutex<ProcessProbe>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let probe = enabled
            .then(|| sysinfo::get_current_pid().ok())
            .flatten()
            .map(|pid| {
                Mutex::new(ProcessProbe {
                    system: System::new(),
                    pid,
                    peak_memory_mb: 0,
                })
            });

        Self {
            probe,
            started: Instant::now(),
        }
    }

    fn sample(&self) -> Option<ProcessSample> {
        let mut probe = self.probe.as_ref()?.lock().ok()?;
        let pid = probe.pid;
        probe
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = probe.system.process(pid)?;
        let cpu_usage = process.cpu_usage();
        let memory_mb = process.memory() / 1024 / 1024;
        probe.peak_memory_mb = probe.peak_memory_mb.max(memory_mb);

        Some(ProcessSample {
            cpu_usage,
            memory_mb,
            peak_memory_mb: probe.peak_memory_mb,
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                s.cpu_usage,
                s.memory_mb,
                s.peak_memory_mb,
                self.started.elapsed()
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.sample() {
            tracing::info!(
                "📊 Run finished in {:?}, peak memory {}MB",
                self.started.elapsed(),
                s.peak_memory_mb
            );
        }
    }
}

// Library builds without the cli feature get a no-op monitor.
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}
