use std::process::ExitCode;

use discarch::Error;

/// Process exit status of every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum ErrorNumber {
    NoError = 0,
    HelpRequested = 1,
    MissingArgument = 2,
    UnexpectedArgumentCount = 3,
    CannotOpenFile = 4,
    UnrecognizedFormat = 5,
    DestinationExists = 6,
    UnexpectedException = 7,
    Interrupted = 8,
}

impl ErrorNumber {
    /// Exit status for a failed command, from the first toolkit error in
    /// the cause chain.
    pub(crate) fn of(error: &anyhow::Error) -> Self {
        let Some(cause) = error.chain().find_map(|e| e.downcast_ref::<Error>()) else {
            return match error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
                Some(_) => ErrorNumber::CannotOpenFile,
                None => ErrorNumber::UnexpectedException,
            };
        };
        match cause {
            Error::FormatUnrecognized(_) => ErrorNumber::UnrecognizedFormat,
            Error::CannotOpenSource { .. } | Error::Image(_) | Error::Io(_) => {
                ErrorNumber::CannotOpenFile
            }
            Error::OutputExists(_) => ErrorNumber::DestinationExists,
            Error::Aborted => ErrorNumber::Interrupted,
            Error::Volume(_) | Error::AlgorithmFault(_) | Error::Xml(_) => {
                ErrorNumber::UnexpectedException
            }
        }
    }

    /// Exit status for a command line clap refused.
    pub(crate) fn of_usage(error: &clap::Error) -> Self {
        use clap::error::ErrorKind;
        match error.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ErrorNumber::HelpRequested,
            ErrorKind::MissingRequiredArgument | ErrorKind::MissingSubcommand => {
                ErrorNumber::MissingArgument
            }
            _ => ErrorNumber::UnexpectedArgumentCount,
        }
    }
}

impl From<ErrorNumber> for ExitCode {
    fn from(number: ErrorNumber) -> Self {
        ExitCode::from(number as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_numbers_follow_cause_chain() {
        let exists: anyhow::Error = Error::OutputExists("x.sidecar.xml".into()).into();
        assert_eq!(ErrorNumber::of(&exists), ErrorNumber::DestinationExists);

        let wrapped = Err::<(), _>(Error::FormatUnrecognized("odd.bin".into()))
            .context("opening odd.bin")
            .unwrap_err();
        assert_eq!(ErrorNumber::of(&wrapped), ErrorNumber::UnrecognizedFormat);

        let aborted: anyhow::Error = Error::Aborted.into();
        assert_eq!(ErrorNumber::of(&aborted), ErrorNumber::Interrupted);

        let other = anyhow::anyhow!("something odd");
        assert_eq!(ErrorNumber::of(&other), ErrorNumber::UnexpectedException);
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorNumber::NoError as u8, 0);
        assert_eq!(ErrorNumber::CannotOpenFile as u8, 4);
        assert_eq!(ErrorNumber::Interrupted as u8, 8);
    }
}
