use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes every log line to stderr and, when it could be opened, the panel's log file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

/// Initialise `env_logger` at `info` (overridable with `RUST_LOG`), appending
/// to `log_file` as well as stderr.
pub fn init(log_file: &Path) {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file);
    let open_error = file.as_ref().err().map(|e| e.to_string());

    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(Tee { file: file.ok() })))
        .try_init();

    if result.is_ok() {
        if let Some(e) = open_error {
            log::warn!("Cannot open log file {}: {}", log_file.display(), e);
        }
    }
}
