// src/config/identity.rs

//! Thin user/group name lookup over the system databases.

use std::ffi::CString;
use std::io;

use crate::config::job::RunAs;
use crate::errors::{JobError, Result};

const LOOKUP_BUF_LEN: usize = 16 * 1024;

/// True when the supervisor can switch the child's identity.
#[cfg(unix)]
pub fn is_privileged() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_privileged() -> bool {
    false
}

/// Resolve `user` / `group` specs (names or numeric ids).
///
/// A user brings its primary group; an explicit group overrides it.
pub fn resolve_run_as(user: Option<&str>, group: Option<&str>) -> Result<RunAs> {
    let mut run_as = RunAs::default();

    if let Some(spec) = user.filter(|s| !s.is_empty()) {
        let (uid, gid) = lookup_user(spec)?
            .ok_or_else(|| JobError::ConfigError(format!("unknown user '{spec}'")))?;
        run_as.uid = Some(uid);
        run_as.gid = Some(gid);
    }

    if let Some(spec) = group.filter(|s| !s.is_empty()) {
        let gid = lookup_group(spec)?
            .ok_or_else(|| JobError::ConfigError(format!("unknown group '{spec}'")))?;
        run_as.gid = Some(gid);
    }

    Ok(run_as)
}

/// `(uid, primary gid)` for a user name or numeric uid.
#[cfg(unix)]
pub fn lookup_user(spec: &str) -> Result<Option<(u32, u32)>> {
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut found: *mut libc::passwd = std::ptr::null_mut();

    let rc = match spec.parse::<u32>() {
        Ok(uid) => unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut found)
        },
        Err(_) => {
            let name = to_cstring(spec)?;
            unsafe {
                libc::getpwnam_r(name.as_ptr(), &mut pwd, buf.as_mut_ptr(), buf.len(), &mut found)
            }
        }
    };

    if rc != 0 {
        return Err(JobError::IoError(io::Error::from_raw_os_error(rc)));
    }
    if found.is_null() {
        return Ok(None);
    }
    Ok(Some((pwd.pw_uid, pwd.pw_gid)))
}

/// gid for a group name or numeric gid.
#[cfg(unix)]
pub fn lookup_group(spec: &str) -> Result<Option<u32>> {
    let mut grp: libc::group = unsafe { std::mem::zeroed() };
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut found: *mut libc::group = std::ptr::null_mut();

    let rc = match spec.parse::<u32>() {
        Ok(gid) => unsafe {
            libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut found)
        },
        Err(_) => {
            let name = to_cstring(spec)?;
            unsafe {
                libc::getgrnam_r(name.as_ptr(), &mut grp, buf.as_mut_ptr(), buf.len(), &mut found)
            }
        }
    };

    if rc != 0 {
        return Err(JobError::IoError(io::Error::from_raw_os_error(rc)));
    }
    if found.is_null() {
        return Ok(None);
    }
    Ok(Some(grp.gr_gid))
}

#[cfg(not(unix))]
pub fn lookup_user(spec: &str) -> Result<Option<(u32, u32)>> {
    Err(JobError::ConfigError(format!(
        "cannot resolve user '{spec}' on this platform"
    )))
}

#[cfg(not(unix))]
pub fn lookup_group(spec: &str) -> Result<Option<u32>> {
    Err(JobError::ConfigError(format!(
        "cannot resolve group '{spec}' on this platform"
    )))
}

#[cfg(unix)]
fn to_cstring(spec: &str) -> Result<CString> {
    CString::new(spec).map_err(|_| JobError::ConfigError(format!("invalid name '{spec}'")))
}
