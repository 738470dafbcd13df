// Property-based tests for verbosity and tracing options.
//
// The tracing level follows clap-verbosity-flag with Warn as the default,
// and -qq turns tracing off.

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::config::args::parse_from_args;
    use proptest::prelude::*;

    /// clap_verbosity_flag with WarnLevel default maps as follows:
    ///   -qq     → None
    ///   -q      → Error
    ///   (none)  → Warn
    ///   -v      → Info
    ///   -vv     → Debug
    ///   -vvv    → Trace
    fn arb_verbosity_flags() -> impl Strategy<Value = (Vec<&'static str>, Option<log::Level>)> {
        prop_oneof![
            Just((vec!["-qq"], None)),
            Just((vec!["-q"], Some(log::Level::Error))),
            Just((vec![], Some(log::Level::Warn))),
            Just((vec!["-v"], Some(log::Level::Info))),
            Just((vec!["-vv"], Some(log::Level::Debug))),
            Just((vec!["-vvv"], Some(log::Level::Trace))),
        ]
    }

    fn base_args() -> Vec<&'static str> {
        vec!["s3prune", "--bucket", "bucket", "--date", "2024-01-01"]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_verbosity_level_configuration(
            (flags, expected_level) in arb_verbosity_flags(),
        ) {
            let mut args = base_args();
            args.extend(flags);

            let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

            match expected_level {
                None => prop_assert!(config.tracing_config.is_none()),
                Some(level) => {
                    prop_assert!(config.tracing_config.is_some());
                    prop_assert_eq!(config.tracing_config.unwrap().tracing_level, level);
                }
            }
        }

        #[test]
        fn prop_tracing_flags_are_carried(
            (flags, _) in arb_verbosity_flags(),
            json_tracing in proptest::bool::ANY,
            aws_sdk_tracing in proptest::bool::ANY,
            disable_color in proptest::bool::ANY,
        ) {
            let mut args = base_args();
            args.extend(flags);
            if json_tracing {
                args.push("--json-tracing");
            }
            if aws_sdk_tracing {
                args.push("--aws-sdk-tracing");
            }
            if disable_color {
                args.push("--disable-color-tracing");
            }

            let config = Config::try_from(parse_from_args(args).unwrap()).unwrap();

            // With -qq there is no tracing at all and the flags have no effect.
            if let Some(tracing_config) = config.tracing_config {
                prop_assert_eq!(tracing_config.json_tracing, json_tracing);
                prop_assert_eq!(tracing_config.aws_sdk_tracing, aws_sdk_tracing);
                prop_assert_eq!(tracing_config.disable_color_tracing, disable_color);
            }
        }
    }
}
