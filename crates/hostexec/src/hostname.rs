//! Local host name resolution

use std::io;

/// Name of this machine as reported by `gethostname(2)`
///
/// Used to replace the `"localhost"` sentinel in host lists that are handed to
/// other machines, where "localhost" would mean the wrong host.
#[cfg(unix)]
pub fn local_hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];

    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..len]).trim().to_string();
    if name.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "gethostname returned an empty name",
        ));
    }
    Ok(name)
}

#[cfg(not(unix))]
pub fn local_hostname() -> io::Result<String> {
    std::env::var("COMPUTERNAME")
        .map_err(|_| io::Error::new(io::ErrorKind::NotFound, "COMPUTERNAME is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_hostname_is_not_empty() {
        let name = local_hostname().unwrap();
        assert!(!name.is_empty());
        assert!(!name.contains('\0'));
    }
}
