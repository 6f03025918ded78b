// sys_files.rs -- numbered file handles
//
// The engine addresses open files by small integers. Slot 0 is reserved so
// that a zero handle never refers to a real file.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::sys::SysError;

pub const MAX_HANDLES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileHandle(usize);

impl FileHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Default)]
pub struct FileHandles {
    slots: [Option<File>; MAX_HANDLES],
}

impl FileHandles {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_handle(&self) -> Result<usize, SysError> {
        (1..MAX_HANDLES)
            .find(|&i| self.slots[i].is_none())
            .ok_or(SysError::OutOfHandles)
    }

    fn slot(&mut self, handle: FileHandle) -> Option<&mut File> {
        self.slots.get_mut(handle.0).and_then(|s| s.as_mut())
    }

    /// Open a file for reading. `None` when the file cannot be opened.
    pub fn open_read(&mut self, path: impl AsRef<Path>) -> Result<Option<(FileHandle, u64)>, SysError> {
        let i = self.find_handle()?;

        let file = match File::open(path.as_ref()) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        let len = file.metadata()?.len();

        self.slots[i] = Some(file);
        Ok(Some((FileHandle(i), len)))
    }

    pub fn open_write(&mut self, path: impl AsRef<Path>) -> Result<FileHandle, SysError> {
        let i = self.find_handle()?;
        let path = path.as_ref();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| SysError::OpenWrite {
                path: path.display().to_string(),
                source,
            })?;

        self.slots[i] = Some(file);
        Ok(FileHandle(i))
    }

    pub fn close(&mut self, handle: FileHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            *slot = None;
        }
    }

    pub fn seek(&mut self, handle: FileHandle, position: u64) -> Result<(), SysError> {
        if let Some(file) = self.slot(handle) {
            file.seek(SeekFrom::Start(position))?;
        }
        Ok(())
    }

    /// Read until `dest` is full or the file ends. Returns bytes read.
    pub fn read(&mut self, handle: FileHandle, dest: &mut [u8]) -> Result<usize, SysError> {
        let Some(file) = self.slot(handle) else {
            return Ok(0);
        };

        let mut done = 0;
        while done < dest.len() {
            match file.read(&mut dest[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(done)
    }

    /// Write all of `data`. Returns bytes written.
    pub fn write(&mut self, handle: FileHandle, data: &[u8]) -> Result<usize, SysError> {
        let Some(file) = self.slot(handle) else {
            return Ok(0);
        };

        let mut done = 0;
        while done < data.len() {
            match file.write(&data[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(done)
    }

    /// Number of handles currently open.
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
