use std::fs::File;
use std::path::Path;
use crate::error::TraceError;
use crate::trace::Trace;

/// Reads and validates a trace file
///
/// On unix the file is memory mapped with sequential access advice, elsewhere it is read into
/// memory. Empty files give an empty trace, they can't be mapped on every platform
pub fn read_trace(path: &Path) -> Result<Trace, TraceError> {
    let unreadable = |message: String| TraceError::Unreadable {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let len = file.metadata().map_err(|e| unreadable(e.to_string()))?.len();
    if len == 0 {
        return Ok(Trace::default());
    }
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::Read;
        let mut bytes = Vec::with_capacity(len as usize);
        let mut file = file;
        file.read_to_end(&mut bytes).map_err(|e| unreadable(e.to_string()))?;
        Trace::parse(&bytes)
    }
    // Memory map the file on unix systems
    #[cfg(unix)]
    {
        use memmap2::{Advice, Mmap};
        // Safety: the map is read only and dropped before returning. A file truncated by another
        // process while mapped is outside what the simulator supports
        let m = unsafe { Mmap::map(&file) }.map_err(|e| unreadable(format!("Couldn't memory map the file: {e}")))?;
        m.advise(Advice::Sequential)
            .map_err(|e| unreadable(format!("Failed to provide access advice to the OS, {e}")))?;
        Trace::parse(&m)
    }
}
