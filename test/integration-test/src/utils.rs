//! Utilities to run tests

use std::{
    env,
    ffi::{CStr, c_long},
    fs::{File, OpenOptions},
    io::{self, Read as _, Seek as _, SeekFrom},
    os::{fd::AsRawFd as _, unix::fs::OpenOptionsExt as _},
    path::{Path, PathBuf},
};

use libc::{EAGAIN, EPIPE, O_NONBLOCK, SYS_delete_module, SYS_finit_module};

use xtask::LKM_TEST_MODULE;

/// Name the kernel registers the module under.
pub(crate) const MODULE_NAME: &CStr = c"lkm_test";

/// Returns the module to load, or `None` with a message on stderr when the
/// test cannot run here.
pub(crate) fn module_or_skip() -> Option<PathBuf> {
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("skipping test, loading kernel modules requires root");
        return None;
    }
    match env::var_os(LKM_TEST_MODULE) {
        Some(path) => Some(path.into()),
        None => {
            eprintln!(
                "skipping test, {LKM_TEST_MODULE} is not set; use `cargo xtask integration-test`"
            );
            None
        }
    }
}

/// Keeps the module loaded until dropped.
pub(crate) struct ModuleGuard(());

impl ModuleGuard {
    pub(crate) fn load(path: &Path) -> Self {
        let image = File::open(path)
            .unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));
        let ret = unsafe {
            libc::syscall(
                SYS_finit_module,
                image.as_raw_fd(),
                c"".as_ptr(),
                0 as c_long,
            )
        };
        if ret != 0 {
            panic!(
                "finit_module({}) failed: {}",
                path.display(),
                io::Error::last_os_error()
            );
        }
        Self(())
    }
}

impl Drop for ModuleGuard {
    fn drop(&mut self) {
        let ret = unsafe {
            libc::syscall(
                SYS_delete_module,
                MODULE_NAME.as_ptr(),
                c_long::from(O_NONBLOCK),
            )
        };
        // Avoid panic in panic.
        if ret != 0 {
            eprintln!(
                "delete_module({MODULE_NAME:?}) failed: {}",
                io::Error::last_os_error()
            );
        }
    }
}

/// One `/dev/kmsg` record.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct KmsgRecord {
    /// Kernel log level, `6` for `KERN_INFO`.
    pub level: u8,
    pub message: String,
}

impl KmsgRecord {
    /// Parses `<prio>,<seq>,<usec>,<flags>[,...];<message>`, ignoring the
    /// `KEY=value` continuation lines.
    pub(crate) fn parse(record: &str) -> Option<Self> {
        let (prefix, text) = record.split_once(';')?;
        let prio: u32 = prefix.split(',').next()?.parse().ok()?;
        let message = text.lines().next().unwrap_or_default().to_owned();
        Some(Self {
            level: (prio & 7) as u8,
            message,
        })
    }
}

/// Reader of records appended to the kernel log after it was opened.
pub(crate) struct Kmsg {
    file: File,
}

impl Kmsg {
    pub(crate) fn open() -> Self {
        let mut file = OpenOptions::new()
            .read(true)
            .custom_flags(O_NONBLOCK)
            .open("/dev/kmsg")
            .unwrap_or_else(|e| panic!("failed to open /dev/kmsg: {e}"));
        file.seek(SeekFrom::End(0))
            .unwrap_or_else(|e| panic!("failed to seek /dev/kmsg: {e}"));
        Self { file }
    }

    /// Returns every record logged since the last call.
    pub(crate) fn read_new(&mut self) -> Vec<KmsgRecord> {
        let mut records = Vec::new();
        // Each read returns exactly one record.
        let mut buf = [0; 8192];
        loop {
            match self.file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let record = String::from_utf8_lossy(&buf[..n]);
                    if let Some(record) = KmsgRecord::parse(&record) {
                        records.push(record);
                    }
                }
                // Records were overwritten before we read them; carry on with
                // the oldest one still available.
                Err(e) if e.raw_os_error() == Some(EPIPE) => continue,
                Err(e) if e.raw_os_error() == Some(EAGAIN) => break,
                Err(e) => panic!("failed to read /dev/kmsg: {e}"),
            }
        }
        records
    }

    /// Like [`Kmsg::read_new`], keeping only lines written by the module.
    pub(crate) fn read_module_lines(&mut self) -> Vec<KmsgRecord> {
        self.read_new()
            .into_iter()
            .filter(|KmsgRecord { message, .. }| message.starts_with("lkm-test: "))
            .collect()
    }
}

pub(crate) fn info(message: &str) -> KmsgRecord {
    KmsgRecord {
        level: 6,
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kmsg_record() {
        assert_eq!(
            KmsgRecord::parse("6,1234,5678901,-;lkm-test: init\n"),
            Some(info("lkm-test: init"))
        );
    }

    #[test]
    fn parse_kmsg_record_with_facility_and_dict() {
        // LOG_USER (1) << 3 | LOG_WARNING (4)
        assert_eq!(
            KmsgRecord::parse("12,99,100,c,caller=T1;hello\n SUBSYSTEM=usb\n"),
            Some(KmsgRecord {
                level: 4,
                message: "hello".to_owned(),
            })
        );
    }

    #[test]
    fn parse_kmsg_record_rejects_garbage() {
        assert_eq!(KmsgRecord::parse("no separator"), None);
        assert_eq!(KmsgRecord::parse("x,1,2,-;message"), None);
    }
}
