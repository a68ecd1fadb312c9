//! Append-only broadcast log (§6.4). One line per event, never rotated.
//! Distinct from the diagnostic `tracing` output set up in `main.rs`.

use std::fs::OpenOptions;
use std::io::Write as _;

use camino::Utf8Path;
use color_eyre::Result;
use color_eyre::eyre::Context;
use jiff::Zoned;

/// The four events the engines record, matching the original's fixed message
/// strings exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMessage {
    Uri(String),
    RegularBlock(String),
    DefaultBlock(String),
    TimeSignalBlock(String),
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogMessage::Uri(uri) => write!(f, "URI: {uri}"),
            LogMessage::RegularBlock(name) => write!(f, "Regular block: \"{name}\""),
            LogMessage::DefaultBlock(name) => write!(f, "Default block: \"{name}\""),
            LogMessage::TimeSignalBlock(name) => write!(f, "Time signal block: \"{name}\""),
        }
    }
}

/// Appends `msg` to `path` as `YYYY-MM-DD HH:MM:SS <message>\n`, local time.
pub fn write(path: &Utf8Path, msg: &LogMessage) -> Result<()> {
    let timestamp = Zoned::now().strftime("%Y-%m-%d %H:%M:%S");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Could not open log file: {path}"))?;
    writeln!(file, "{timestamp} {msg}").wrap_err_with(|| format!("Could not write to log file: {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_uri_message() {
        assert_eq!(
            LogMessage::Uri("file:///a.mp3".to_string()).to_string(),
            "URI: file:///a.mp3"
        );
    }

    #[test]
    fn formats_block_messages() {
        assert_eq!(
            LogMessage::RegularBlock("morning".to_string()).to_string(),
            "Regular block: \"morning\""
        );
        assert_eq!(
            LogMessage::DefaultBlock("filler".to_string()).to_string(),
            "Default block: \"filler\""
        );
        assert_eq!(
            LogMessage::TimeSignalBlock("pips".to_string()).to_string(),
            "Time signal block: \"pips\""
        );
    }

    #[test]
    fn write_appends_lines() {
        let dir = std::env::temp_dir().join(format!("drivetime-test-log-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = Utf8Path::from_path(&dir.join("broadcast.log")).unwrap().to_owned();

        write(&path, &LogMessage::Uri("a".to_string())).unwrap();
        write(&path, &LogMessage::RegularBlock("b".to_string())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("URI: a"));
        assert!(lines[1].ends_with("Regular block: \"b\""));

        std::fs::remove_dir_all(&dir).ok();
    }
}
