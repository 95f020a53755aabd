//! Elevation check, used to explain privilege vetoes.
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

/// Query handle on this process's access token. Closed on drop.
struct ProcessToken(HANDLE);

impl ProcessToken {
    fn open() -> Option<Self> {
        let mut handle = HANDLE::default();
        unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut handle) }.ok()?;
        Some(Self(handle))
    }

    fn elevation(&self) -> Option<TOKEN_ELEVATION> {
        let mut elevation = TOKEN_ELEVATION::default();
        let mut written = 0u32;
        unsafe {
            GetTokenInformation(
                self.0,
                TokenElevation,
                Some(&mut elevation as *mut TOKEN_ELEVATION as *mut _),
                std::mem::size_of::<TOKEN_ELEVATION>() as u32,
                &mut written,
            )
        }
        .ok()?;
        Some(elevation)
    }
}

impl Drop for ProcessToken {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// Whether the process runs elevated. `false` if the token can't be read.
pub fn is_elevated() -> bool {
    ProcessToken::open()
        .and_then(|token| token.elevation())
        .is_some_and(|e| e.TokenIsElevated != 0)
}
