//! Real-time scheduling helpers (Linux SCHED_FIFO and mlockall).

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>) {
    use libc::{
        MCL_CURRENT, SCHED_FIFO, mlockall, sched_get_priority_max, sched_get_priority_min,
        sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    fn try_lock_memory() -> std::io::Result<()> {
        let rc = unsafe { mlockall(MCL_CURRENT) };
        if rc != 0 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    // Clamp the requested priority to what the kernel reports for SCHED_FIFO.
    fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let prio_val = prio.unwrap_or(max).clamp(min, max);
        let param = sched_param {
            sched_priority: prio_val,
        };
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EPERM) {
                eyre::bail!(
                    "{err}; needs CAP_SYS_NICE or root (euid {})",
                    unsafe { libc::geteuid() }
                );
            }
            return Err(eyre::eyre!(err));
        }
        Ok(prio_val)
    }

    RT_ONCE.get_or_init(|| {
        match try_lock_memory() {
            Ok(()) => tracing::info!("rt: memory locked (current)"),
            Err(err) => tracing::warn!(error = %err, "rt: mlockall failed"),
        }
        match try_apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(priority = p, "rt: SCHED_FIFO applied"),
            Err(err) => {
                let prio_dbg = prio.map_or_else(|| "(max)".into(), |p| p.to_string());
                tracing::warn!(error = %err, prio = %prio_dbg, "rt: sched_setscheduler(SCHED_FIFO) refused");
            }
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>) {
    if rt {
        tracing::warn!("rt: real-time mode is only supported on Linux; ignoring --rt");
    }
}
