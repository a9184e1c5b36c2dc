/// Mount-table volume source for Unix-like platforms.
///
/// Reads `/proc/self/mounts` and keeps local block-device filesystems.
/// Pseudo filesystems (`proc`, `sysfs`, `tmpfs`, ...) never name a `/dev/`
/// device and network filesystems are excluded by type.
use super::volumes::{Volume, VolumeSource};
use std::collections::HashSet;
use tracing::{info, warn};

const NETWORK_FS_TYPES: &[&str] = &[
    "nfs", "nfs4", "cifs", "smbfs", "smb3", "sshfs", "fuse.sshfs", "9p", "afs", "ceph",
    "glusterfs",
];

/// Read-only image filesystems whose contents duplicate packages on disk.
const IMAGE_FS_TYPES: &[&str] = &["squashfs", "iso9660", "udf"];

pub struct MountTable {
    path: String,
}

impl Default for MountTable {
    fn default() -> Self {
        Self {
            path: "/proc/self/mounts".to_string(),
        }
    }
}

impl MountTable {
    /// Read a mount table from a custom location.
    pub fn from_file(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl VolumeSource for MountTable {
    fn volumes(&self) -> Vec<Volume> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                let volumes = parse_mounts(&text);
                for v in &volumes {
                    info!("Including volume: {}", v.root);
                }
                volumes
            }
            Err(err) => {
                warn!("cannot read {}: {err}; falling back to /", self.path);
                vec![Volume::new("/")]
            }
        }
    }
}

/// Parse `mounts(5)` text into volumes, in table order, one per device.
pub fn parse_mounts(text: &str) -> Vec<Volume> {
    let mut seen_devices = HashSet::new();
    let mut volumes = Vec::new();

    for line in text.lines() {
        let mut fields = line.split_whitespace();
        let (Some(device), Some(mount_point), Some(fs_type)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        if !device.starts_with("/dev/")
            || NETWORK_FS_TYPES.contains(&fs_type)
            || IMAGE_FS_TYPES.contains(&fs_type)
        {
            continue;
        }
        // Bind mounts repeat a device; scan it once.
        if !seen_devices.insert(device.to_string()) {
            continue;
        }
        volumes.push(Volume::new(&unescape_octal(mount_point)));
    }

    volumes
}

/// Decode the `\040`-style escapes the kernel uses for spaces and tabs.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 1..i + 4]).ok();
            if let Some(v) = digits.and_then(|d| u8::from_str_radix(d, 8).ok()) {
                out.push(v);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
/dev/nvme0n1p1 /boot/efi vfat rw,relatime 0 0
/dev/loop3 /snap/core/123 squashfs ro,nodev 0 0
server:/export /mnt/nfs nfs4 rw 0 0
/dev/sdb1 /media/usb\\040stick exfat rw 0 0
/dev/nvme0n1p2 /srv/bind ext4 rw,relatime 0 0
";

    #[test]
    fn keeps_local_block_devices_in_order() {
        let roots: Vec<_> = parse_mounts(SAMPLE).into_iter().map(|v| v.root).collect();
        assert_eq!(roots, ["/", "/boot/efi", "/media/usb stick"]);
    }

    #[test]
    fn unescapes_octal_sequences() {
        assert_eq!(unescape_octal("/a\\040b\\011c"), "/a b\tc");
        assert_eq!(unescape_octal("/plain"), "/plain");
        assert_eq!(unescape_octal("/tail\\04"), "/tail\\04");
    }

    #[test]
    fn unreadable_table_falls_back_to_root() {
        let src = MountTable::from_file("/definitely/not/a/mount/table");
        assert_eq!(src.volumes(), vec![Volume::new("/")]);
    }
}
