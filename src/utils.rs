pub mod parsers;

use clap::builder::{
    styling::{AnsiColor, Effects},
    Styles,
};
use std::ffi::CStr;

pub const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// The host name as this process sees it.
///
/// `HOSTNAME` wins when set (login shells export it); otherwise ask the kernel.
pub fn current_hostname() -> anyhow::Result<String> {
    if let Ok(host) = std::env::var("HOSTNAME") {
        if !host.trim().is_empty() {
            return Ok(host.trim().to_string());
        }
    }

    let mut buf = [0u8; 256];
    // SAFETY: buf is valid for writes of buf.len() bytes.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return Err(anyhow::Error::from(std::io::Error::last_os_error())
            .context("Failed to read host name"));
    }
    let host = CStr::from_bytes_until_nul(&buf)
        .map_err(|_| anyhow::anyhow!("Host name is not NUL-terminated"))?
        .to_string_lossy()
        .into_owned();
    Ok(host)
}

/// Short login-node name: everything before the first domain separator.
///
/// # Examples
///
/// ```
/// use workbench::utils::login_node;
///
/// assert_eq!(login_node("login02.cluster.example.org"), "login02");
/// assert_eq!(login_node("login02"), "login02");
/// ```
pub fn login_node(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

/// `shell_escape` quotes `:`, `@` and `%`; these stay bare so `--gpus-per-node=v100:2` renders as typed.
fn is_shell_safe(arg: &str) -> bool {
    !arg.is_empty()
        && arg.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | ',' | '.' | '+' | ':' | '@' | '%')
        })
}

/// Join arguments into one shell-splittable string, quoting only where needed.
pub fn shell_join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if is_shell_safe(arg) {
                arg.to_string()
            } else {
                shell_escape::unix::escape(arg.into()).into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
