//! Layered configuration resolution.
//!
//! # Precedence
//! ```text
//! built-in defaults (or -config file)
//!     → command-line flags   (only flags actually given)
//!     → environment variables (only when set and non-empty)
//!     → ServiceConfig snapshot
//! ```
//!
//! A malformed override never fails resolution: the field keeps the value
//! it had before that layer, and the skipped variable is recorded on the
//! [`Resolution`] so it can be reported once logging is installed.

use std::collections::HashMap;
use std::ffi::OsString;
use std::hash::BuildHasher;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;

use crate::config::duration::{parse_duration, parse_duration_arg};
use crate::config::loader::{load_defaults_file, ConfigError};
use crate::config::schema::ServiceConfig;
use crate::observability::Logger;

/// Command-line overrides. Every field is optional; an absent flag leaves the
/// lower layer untouched.
#[derive(Debug, Clone, Default, Parser)]
#[command(about = "Order platform service", long_about = None)]
pub struct FlagOverrides {
    /// TOML file replacing the built-in defaults
    #[arg(long = "config", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// API server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long)]
    pub env: Option<String>,

    /// Maximum time to serve one request, 0 to disable
    #[arg(long, value_parser = parse_duration_arg)]
    pub request_timeout: Option<Duration>,

    /// Database connection string
    #[arg(long)]
    pub db_dsn: Option<String>,

    /// Maximum number of open connections to the database
    #[arg(long)]
    pub db_max_open_conns: Option<u32>,

    /// Maximum number of idle connections to the database
    #[arg(long)]
    pub db_max_idle_conns: Option<u32>,

    /// Maximum amount of time a connection may be idle before being closed
    #[arg(long, value_parser = parse_duration_arg)]
    pub db_max_idle_time: Option<Duration>,

    /// Rate limiter requests per second
    #[arg(long)]
    pub limiter_rps: Option<f64>,

    /// Rate limiter burst
    #[arg(long)]
    pub limiter_burst: Option<u32>,

    /// Enable rate limiter
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub limiter_enabled: Option<bool>,

    /// Kafka bootstrap servers
    #[arg(long)]
    pub kafka_bootstrap_servers: Option<String>,

    /// Kafka client ID
    #[arg(long)]
    pub kafka_client_id: Option<String>,

    /// Kafka consumer group ID
    #[arg(long)]
    pub kafka_group_id: Option<String>,

    /// The topic name for the payment request
    #[arg(long)]
    pub payment_request_topic_name: Option<String>,

    /// The topic name for the payment response
    #[arg(long)]
    pub payment_response_topic_name: Option<String>,

    /// The topic name for the restaurant approval request
    #[arg(long)]
    pub restaurant_approval_request_topic_name: Option<String>,

    /// The topic name for the restaurant approval response
    #[arg(long)]
    pub restaurant_approval_response_topic_name: Option<String>,

    /// Log level override (trace|debug|info|warn|error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Prometheus exporter address, e.g. 0.0.0.0:9090
    #[arg(long = "metrics-addr")]
    pub metrics_address: Option<String>,
}

/// Rewrite single-dash long flags (`-port=5000`) to the double-dash form.
///
/// Single-character flags (`-h`) and everything after `--` pass through.
pub fn normalize_flag_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut terminated = false;
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            let arg = arg.into();
            if index == 0 || terminated {
                return arg;
            }
            match arg.to_str() {
                Some("--") => {
                    terminated = true;
                    arg
                }
                Some(s) if s.len() > 2 && s.starts_with('-') && !s.starts_with("--") => {
                    OsString::from(format!("-{s}"))
                }
                _ => arg,
            }
        })
        .collect()
}

/// A source of environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<const N: usize> EnvSource for [(&str, &str); N] {
    fn var(&self, key: &str) -> Option<String> {
        self.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    }
}

/// An environment value that failed to parse and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredOverride {
    pub variable: &'static str,
    pub value: String,
}

/// A resolved snapshot and the overrides skipped while building it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: ServiceConfig,
    pub ignored: Vec<IgnoredOverride>,
}

impl Resolution {
    /// Warn once per skipped override. Call after the logger is installed.
    pub fn report_ignored(&self, logger: &Logger) {
        for ignored in &self.ignored {
            tracing::warn!(
                parent: logger.span(),
                variable = ignored.variable,
                value = %ignored.value,
                "Ignoring malformed override"
            );
        }
    }
}

/// Resolves a [`ServiceConfig`] snapshot for a named service.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    service_name: String,
}

impl ConfigResolver {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Built-in defaults for this service.
    pub fn defaults(&self) -> ServiceConfig {
        ServiceConfig::defaults_for(&self.service_name)
    }

    /// Merge `defaults`, then `flags`, then `env` into one snapshot.
    pub fn resolve<E>(&self, defaults: ServiceConfig, flags: &FlagOverrides, env: &E) -> Resolution
    where
        E: EnvSource + ?Sized,
    {
        let mut config = defaults;
        apply_flags(&mut config, flags);
        let ignored = apply_env(&mut config, env);
        Resolution { config, ignored }
    }

    /// Parse `args` as flags and resolve against `env`.
    ///
    /// Unknown or ill-typed flags are a usage error, as is an unreadable
    /// `-config` file.
    pub fn try_load_from<I, T, E>(&self, args: I, env: &E) -> Result<Resolution, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
        E: EnvSource + ?Sized,
    {
        let flags = FlagOverrides::try_parse_from(normalize_flag_args(args))?;
        self.load_with(&flags, env)
    }

    /// Resolve from the process arguments and environment.
    ///
    /// Exits with a usage message on malformed flags.
    pub fn load(&self) -> Result<Resolution, ConfigError> {
        let flags = FlagOverrides::parse_from(normalize_flag_args(std::env::args_os()));
        self.load_with(&flags, &ProcessEnv)
    }

    fn load_with<E>(&self, flags: &FlagOverrides, env: &E) -> Result<Resolution, ConfigError>
    where
        E: EnvSource + ?Sized,
    {
        let defaults = match &flags.config_file {
            Some(path) => load_defaults_file(path, self.defaults())?,
            None => self.defaults(),
        };
        Ok(self.resolve(defaults, flags, env))
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn apply_flags(config: &mut ServiceConfig, flags: &FlagOverrides) {
    override_with(&mut config.network.port, flags.port);
    override_with(&mut config.network.env, flags.env.clone());
    override_with(&mut config.network.request_timeout, flags.request_timeout);

    override_with(&mut config.storage.dsn, flags.db_dsn.clone());
    override_with(&mut config.storage.max_open_conns, flags.db_max_open_conns);
    override_with(&mut config.storage.max_idle_conns, flags.db_max_idle_conns);
    override_with(&mut config.storage.max_idle_time, flags.db_max_idle_time);

    override_with(&mut config.rate_limit.rps, flags.limiter_rps);
    override_with(&mut config.rate_limit.burst, flags.limiter_burst);
    override_with(&mut config.rate_limit.enabled, flags.limiter_enabled);

    let messaging = &mut config.messaging;
    override_with(&mut messaging.bootstrap_servers, flags.kafka_bootstrap_servers.clone());
    override_with(&mut messaging.client_id, flags.kafka_client_id.clone());
    override_with(&mut messaging.group_id, flags.kafka_group_id.clone());

    let topics = &mut messaging.topics;
    override_with(&mut topics.payment_request, flags.payment_request_topic_name.clone());
    override_with(&mut topics.payment_response, flags.payment_response_topic_name.clone());
    override_with(
        &mut topics.restaurant_approval_request,
        flags.restaurant_approval_request_topic_name.clone(),
    );
    override_with(
        &mut topics.restaurant_approval_response,
        flags.restaurant_approval_response_topic_name.clone(),
    );

    if flags.log_level.is_some() {
        config.observability.log_level = flags.log_level.clone();
    }
    if flags.metrics_address.is_some() {
        config.observability.metrics_address = flags.metrics_address.clone();
    }
}

/// Reads environment overrides, remembering the ones that fail to parse.
struct EnvReader<'a, E: ?Sized> {
    env: &'a E,
    ignored: Vec<IgnoredOverride>,
}

impl<E: EnvSource + ?Sized> EnvReader<'_, E> {
    fn string(&self, key: &str) -> Option<String> {
        self.env.var(key).filter(|value| !value.is_empty())
    }

    fn parsed<T: FromStr>(&mut self, key: &'static str) -> Option<T> {
        let raw = self.string(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => self.skip(key, raw),
        }
    }

    fn duration(&mut self, key: &'static str) -> Option<Duration> {
        let raw = self.string(key)?;
        match parse_duration(&raw) {
            Some(value) => Some(value),
            None => self.skip(key, raw),
        }
    }

    fn skip<T>(&mut self, variable: &'static str, value: String) -> Option<T> {
        self.ignored.push(IgnoredOverride { variable, value });
        None
    }
}

fn apply_env<E: EnvSource + ?Sized>(config: &mut ServiceConfig, env: &E) -> Vec<IgnoredOverride> {
    let mut env = EnvReader {
        env,
        ignored: Vec::new(),
    };

    override_with(&mut config.network.port, env.parsed("PORT"));
    override_with(&mut config.network.env, env.string("ENV"));
    override_with(&mut config.network.request_timeout, env.duration("REQUEST_TIMEOUT"));

    override_with(&mut config.storage.dsn, env.string("DB_DSN"));
    override_with(&mut config.storage.max_open_conns, env.parsed("DB_MAX_OPEN_CONNS"));
    override_with(&mut config.storage.max_idle_conns, env.parsed("DB_MAX_IDLE_CONNS"));
    override_with(&mut config.storage.max_idle_time, env.duration("DB_MAX_IDLE_TIME"));

    override_with(&mut config.rate_limit.rps, env.parsed("LIMITER_RPS"));
    override_with(&mut config.rate_limit.burst, env.parsed("LIMITER_BURST"));
    override_with(
        &mut config.rate_limit.enabled,
        env.string("LIMITER_ENABLED").map(|value| value.eq_ignore_ascii_case("true")),
    );

    let messaging = &mut config.messaging;
    override_with(&mut messaging.bootstrap_servers, env.string("KAFKA_BOOTSTRAP_SERVERS"));
    override_with(&mut messaging.client_id, env.string("KAFKA_CLIENT_ID"));
    override_with(&mut messaging.group_id, env.string("KAFKA_GROUP_ID"));

    let topics = &mut messaging.topics;
    override_with(&mut topics.payment_request, env.string("PAYMENT_REQUEST_TOPIC"));
    override_with(&mut topics.payment_response, env.string("PAYMENT_RESPONSE_TOPIC"));
    override_with(
        &mut topics.restaurant_approval_request,
        env.string("RESTAURANT_APPROVAL_REQUEST_TOPIC"),
    );
    override_with(
        &mut topics.restaurant_approval_response,
        env.string("RESTAURANT_APPROVAL_RESPONSE_TOPIC"),
    );

    override_with(
        &mut config.cors.trusted_origins,
        env.string("CORS_TRUSTED_ORIGINS").map(|raw| split_origins(&raw)),
    );

    if let Some(level) = env.string("LOG_LEVEL") {
        config.observability.log_level = Some(level);
    }
    if let Some(address) = env.string("METRICS_ADDR") {
        config.observability.metrics_address = Some(address);
    }

    env.ignored
}

/// Split on commas, trimming whitespace and dropping empty entries.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
