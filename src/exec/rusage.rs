// src/exec/rusage.rs

//! CPU accounting for reaped children via `getrusage(RUSAGE_CHILDREN)`.

/// User and system CPU time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
}

impl CpuTimes {
    /// Time accumulated between `earlier` and `self`.
    pub fn since(self, earlier: CpuTimes) -> CpuTimes {
        CpuTimes {
            user: (self.user - earlier.user).max(0.0),
            system: (self.system - earlier.system).max(0.0),
        }
    }
}

/// Cumulative CPU times of all children this process has waited for.
#[cfg(unix)]
pub fn children_cpu_times() -> Option<CpuTimes> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::uninit();
    let rc = unsafe { libc::getrusage(libc::RUSAGE_CHILDREN, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let usage = unsafe { usage.assume_init() };

    Some(CpuTimes {
        user: timeval_secs(usage.ru_utime),
        system: timeval_secs(usage.ru_stime),
    })
}

#[cfg(not(unix))]
pub fn children_cpu_times() -> Option<CpuTimes> {
    None
}

#[cfg(unix)]
fn timeval_secs(tv: libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0
}
