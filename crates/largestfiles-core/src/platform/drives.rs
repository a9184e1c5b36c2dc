/// Logical-drive volume source using the Windows API.
///
/// Walks the `GetLogicalDrives` bitmask and keeps fixed and removable
/// drives. Network, optical and RAM drives are left out.
use super::volumes::{Volume, VolumeSource};
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDrives};

// Drive type constants from the Windows API.
const DRIVE_REMOVABLE_VAL: u32 = 2;
const DRIVE_FIXED_VAL: u32 = 3;
const DRIVE_REMOTE_VAL: u32 = 4;
const DRIVE_CDROM_VAL: u32 = 5;
const DRIVE_RAMDISK_VAL: u32 = 6;

/// Drive type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveType {
    Fixed,
    Removable,
    Network,
    CdRom,
    RamDisk,
    Unknown,
}

impl DriveType {
    fn from_raw(raw: u32) -> Self {
        match raw {
            DRIVE_FIXED_VAL => Self::Fixed,
            DRIVE_REMOVABLE_VAL => Self::Removable,
            DRIVE_REMOTE_VAL => Self::Network,
            DRIVE_CDROM_VAL => Self::CdRom,
            DRIVE_RAMDISK_VAL => Self::RamDisk,
            _ => Self::Unknown,
        }
    }

    /// Only local, writable media are worth scanning.
    pub fn is_scannable(self) -> bool {
        matches!(self, Self::Fixed | Self::Removable)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDrives;

impl VolumeSource for LocalDrives {
    fn volumes(&self) -> Vec<Volume> {
        let mask = unsafe { GetLogicalDrives() };
        if mask == 0 {
            tracing::warn!("GetLogicalDrives returned 0");
            return Vec::new();
        }

        let mut volumes = Vec::new();
        for (bit, letter) in (b'A'..=b'Z').enumerate() {
            if mask & (1 << bit) == 0 {
                continue;
            }
            let root = format!("{}:\\", letter as char);
            let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
            let drive_type =
                DriveType::from_raw(unsafe { GetDriveTypeW(PCWSTR(root_wide.as_ptr())) });

            if drive_type.is_scannable() {
                tracing::info!("Including drive: {root}");
                volumes.push(Volume::new(&root));
            } else {
                tracing::debug!("Skipping drive {root} ({drive_type:?})");
            }
        }
        volumes
    }
}
