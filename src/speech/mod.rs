use std::{fmt, io};
use std::process::Command;

use log::info;

use crate::config::SpeechConfig;

#[derive(Debug)]
pub(crate) enum SpeechError {
    /// No speech-to-text command is configured
    NotSupported,
    Spawn(io::Error),
    Failed(String),
    EmptyTranscript,
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpeechError::NotSupported => write!(f, "Speech capture not supported, set [speech] command in the config file"),
            SpeechError::Spawn(e) => write!(f, "Speech recognition error: {e}"),
            SpeechError::Failed(s) => write!(f, "Speech recognition error: {s}"),
            SpeechError::EmptyTranscript => write!(f, "Speech recognition error: nothing was recognised"),
        }
    }
}

impl std::error::Error for SpeechError {}

/// Produces one finalized transcript per call
pub(crate) trait TranscriptSource {
    fn capture(&mut self) -> Result<String, SpeechError>;
}

/// Used when no recogniser is available
pub(crate) struct Unsupported;

impl TranscriptSource for Unsupported {
    fn capture(&mut self) -> Result<String, SpeechError> {
        Err(SpeechError::NotSupported)
    }
}

/// Runs an external speech-to-text program and takes what it prints on stdout as the transcript
pub(crate) struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    pub(crate) fn new(program: String, args: Vec<String>) -> CommandTranscriber {
        CommandTranscriber { program, args }
    }
}

impl TranscriptSource for CommandTranscriber {
    fn capture(&mut self) -> Result<String, SpeechError> {
        info!("Listening via {}", self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(SpeechError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeechError::Failed(format!("{} exited with {}: {}", self.program, output.status, stderr.trim())));
        }

        // Recognisers may print several lines, only the last one is the final result
        let stdout = String::from_utf8_lossy(&output.stdout);
        match stdout.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
            Some(transcript) => Ok(transcript.to_string()),
            None => Err(SpeechError::EmptyTranscript),
        }
    }
}

/// Build the transcript source described by the config
pub(crate) fn from_config(config: &SpeechConfig) -> Box<dyn TranscriptSource> {
    match config.command.split_first() {
        Some((program, args)) => Box::new(CommandTranscriber::new(program.clone(), args.to_vec())),
        None => Box::new(Unsupported),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_is_unsupported() {
        let mut source = from_config(&SpeechConfig::default());
        assert!(matches!(source.capture(), Err(SpeechError::NotSupported)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_transcript() {
        let config = SpeechConfig {
            command: vec!["printf".to_string(), "partial\\nJan - A1 - Rent - 500\\n".to_string()],
        };
        let mut source = from_config(&config);
        assert_eq!(source.capture().unwrap(), "Jan - A1 - Rent - 500");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure() {
        let mut source = CommandTranscriber::new("false".to_string(), vec![]);
        assert!(matches!(source.capture(), Err(SpeechError::Failed(_))));

        let mut source = CommandTranscriber::new("true".to_string(), vec![]);
        assert!(matches!(source.capture(), Err(SpeechError::EmptyTranscript)));
    }

    #[test]
    fn test_missing_program() {
        let mut source = CommandTranscriber::new("flatledger-no-such-recogniser".to_string(), vec![]);
        assert!(matches!(source.capture(), Err(SpeechError::Spawn(_))));
    }
}
