#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn directive(&self) -> String {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
        .to_string()
    }
}

pub fn verbosity_parser(s: &str) -> Result<Verbosity, String> {
    let level = s.parse::<u8>().map_err(|err| err.to_string())?;

    match level {
        1 => Ok(Verbosity::Error),
        2 => Ok(Verbosity::Warn),
        3 => Ok(Verbosity::Info),
        4 => Ok(Verbosity::Debug),
        5 => Ok(Verbosity::Trace),
        _ => Err(format!("verbosity must be between 1 and 5, got {level}")),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1", Verbosity::Error, "error")]
    #[case("3", Verbosity::Info, "info")]
    #[case("5", Verbosity::Trace, "trace")]
    fn test_verbosity_levels(
        #[case] input: &str,
        #[case] expected: Verbosity,
        #[case] directive: &str,
    ) {
        let verbosity = verbosity_parser(input).expect("verbosity");
        assert_eq!(verbosity, expected);
        assert_eq!(verbosity.directive(), directive);
    }

    #[rstest]
    #[case("0")]
    #[case("6")]
    #[case("loud")]
    fn test_invalid_verbosity(#[case] input: &str) {
        assert!(verbosity_parser(input).is_err());
    }
}
