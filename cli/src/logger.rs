use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use std::sync::OnceLock;

/// Env variable with the log filter, e.g. "LAMBDAFORM_LOG=backend=info,lambdaform=debug"
const FILTER_ENV: &str = "LAMBDAFORM_LOG";

/// Logs for troubleshooting deployments, printed above the stage spinner
///
/// Off by default, so the stage lines and --json documents stay the only
/// output. Logs always go to stderr and never mix with the JSON on stdout.
pub struct Logger {
    multi_progress: MultiProgress,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

impl<'a> Logger {
    pub fn init() -> &'a Self {
        LOGGER.get_or_init(|| {
            let logger =
                env_logger::Builder::from_env(env_logger::Env::new().filter_or(FILTER_ENV, "off"))
                    .target(env_logger::Target::Stderr)
                    .build();

            let level = logger.filter();
            let multi_progress = MultiProgress::new();

            if let Err(e) = LogWrapper::new(multi_progress.clone(), logger).try_init() {
                eprintln!("Failed to init logger: {e}");
            }

            log::set_max_level(level);
            Self { multi_progress }
        })
    }

    /// Spinners drawn here are suspended while a log line is printed
    pub fn multi_progress() -> &'a MultiProgress {
        &Self::init().multi_progress
    }
}
